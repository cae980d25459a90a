//! Best-effort persistence of the three key-value blobs, one JSON file per key.
//!
//! Reads and writes never fail the caller: unreadable or malformed blobs fall
//! back to defaults and failed writes are logged.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use fortune_wheel_core::{SavedState, HISTORY_KEY, PLAYERS_KEY, SHIELDS_ENABLED_KEY};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const BLOB_EXTENSION: &str = "json";

/// Errors that can occur while reading or writing a blob.
#[derive(Debug, Error)]
pub(crate) enum StoreError {
    /// The blob exists but could not be read.
    #[error("could not read '{key}': {source}")]
    Read {
        key: &'static str,
        source: io::Error,
    },
    /// The blob was read but is not valid JSON for its type.
    #[error("could not parse '{key}': {source}")]
    Parse {
        key: &'static str,
        source: serde_json::Error,
    },
    /// The value could not be serialised.
    #[error("could not encode '{key}': {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    /// The blob could not be written to disk.
    #[error("could not write '{key}': {source}")]
    Write {
        key: &'static str,
        source: io::Error,
    },
}

/// Directory-backed key-value store.
#[derive(Debug)]
pub(crate) struct Store {
    dir: PathBuf,
}

impl Store {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads every blob, substituting defaults for anything missing or broken.
    pub(crate) fn load(&self) -> SavedState {
        let defaults = SavedState::default();
        SavedState {
            history: self.load_or(HISTORY_KEY, defaults.history),
            players: self.load_or(PLAYERS_KEY, defaults.players),
            shields_enabled: self.load_or(SHIELDS_ENABLED_KEY, defaults.shields_enabled),
        }
    }

    /// Writes every blob, logging failures instead of reporting them.
    pub(crate) fn save(&self, state: &SavedState) {
        self.save_or_warn(HISTORY_KEY, &state.history);
        self.save_or_warn(PLAYERS_KEY, &state.players);
        self.save_or_warn(SHIELDS_ENABLED_KEY, &state.shields_enabled);
    }

    fn load_or<T: DeserializeOwned>(&self, key: &'static str, fallback: T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "no saved blob, using defaults");
                fallback
            }
            Err(error) => {
                warn!(%error, "saved state ignored, using defaults");
                fallback
            }
        }
    }

    fn save_or_warn<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        if let Err(error) = self.write(key, value) {
            warn!(%error, "state not saved");
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, StoreError> {
        let bytes = match fs::read(self.path(key)) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { key, source }),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse { key, source })
    }

    fn write<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> Result<(), StoreError> {
        let json =
            serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode { key, source })?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write { key, source })?;
        fs::write(self.path(key), json).map_err(|source| StoreError::Write { key, source })
    }

    fn path(&self, key: &str) -> PathBuf {
        blob_path(&self.dir, key)
    }
}

fn blob_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(key).with_extension(BLOB_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fortune_wheel_core::{default_roster, HistoryEntry, Participant, PALETTE};
    use tempdir::TempDir;

    fn scratch() -> TempDir {
        TempDir::new("fortune-wheel-store").expect("temporary directory")
    }

    #[test]
    fn empty_directory_loads_defaults() {
        let dir = scratch();
        let state = Store::new(dir.path()).load();
        assert_eq!(state, SavedState::default());
        assert_eq!(state.players, default_roster());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = scratch();
        let store = Store::new(dir.path());
        let mut shielded = Participant::new("Vilde", PALETTE[3]);
        shielded.has_shield = false;
        let state = SavedState {
            history: vec![HistoryEntry {
                name: "Vilde".to_owned(),
                amount: 0,
                time: Utc.with_ymd_and_hms(2024, 8, 2, 21, 15, 0).unwrap(),
                shield_used_by: vec!["Vilde".to_owned()],
            }],
            players: vec![shielded],
            shields_enabled: false,
        };

        store.save(&state);
        assert_eq!(store.load(), state);
    }

    #[test]
    fn blobs_use_the_legacy_keys() {
        let dir = scratch();
        Store::new(dir.path()).save(&SavedState::default());

        for key in [HISTORY_KEY, PLAYERS_KEY, SHIELDS_ENABLED_KEY] {
            assert!(
                blob_path(dir.path(), key).exists(),
                "missing blob for {key}"
            );
        }
        let flag = fs::read_to_string(blob_path(dir.path(), SHIELDS_ENABLED_KEY))
            .expect("flag blob readable");
        assert_eq!(flag.trim(), "true");
    }

    #[test]
    fn corrupt_blob_falls_back_without_touching_the_others() {
        let dir = scratch();
        let store = Store::new(dir.path());
        store.save(&SavedState {
            history: Vec::new(),
            players: vec![Participant::new("Solo", PALETTE[0])],
            shields_enabled: false,
        });
        fs::write(blob_path(dir.path(), PLAYERS_KEY), b"{not json").expect("overwrite blob");

        let state = store.load();
        assert_eq!(state.players, default_roster());
        assert!(!state.shields_enabled);
    }

    #[test]
    fn blank_blob_counts_as_missing() {
        let dir = scratch();
        fs::write(blob_path(dir.path(), HISTORY_KEY), b"  \n").expect("write blank blob");
        assert!(Store::new(dir.path()).load().history.is_empty());
    }

    #[test]
    fn browser_shaped_roster_blob_is_accepted() {
        let dir = scratch();
        let blob = r##"[{"name":"Oscar","color":"#eb8b0eff","hasShield":false,"activeShield":false},
                       {"name":"Elsa","color":"#8E44AD","hasShield":true,"activeShield":true}]"##;
        fs::write(blob_path(dir.path(), PLAYERS_KEY), blob).expect("write roster blob");

        let players = Store::new(dir.path()).load().players;
        assert_eq!(players.len(), 2);
        assert!(!players[0].has_shield);
        assert!(players[1].shield_armed());
        assert_eq!(players[1].color, PALETTE[4]);
    }
}
