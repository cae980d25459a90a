#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fortune Wheel engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Systems read immutable data such as [`Totals`] and
//! respond exclusively with new command batches.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key of the newest-first spin history blob.
pub const HISTORY_KEY: &str = "roulette_history_v1";
/// Storage key of the participant roster blob.
pub const PLAYERS_KEY: &str = "roulette_players_v1";
/// Storage key of the shields-enabled flag blob.
pub const SHIELDS_ENABLED_KEY: &str = "roulette_shieldsEnabled_v1";

/// Colors handed out to participants in registration order.
pub const PALETTE: [Color; 8] = [
    Color::from_rgba(0xeb, 0x8b, 0x0e, 0xff),
    Color::from_rgb(0xff, 0xd1, 0x66),
    Color::from_rgb(0x06, 0xd6, 0xa0),
    Color::from_rgb(0x11, 0x8a, 0xb2),
    Color::from_rgb(0x8e, 0x44, 0xad),
    Color::from_rgb(0xf7, 0x8c, 0x6b),
    Color::from_rgb(0x82, 0xc9, 0x1e),
    Color::from_rgb(0xe8, 0x43, 0x93),
];

const DEFAULT_NAMES: [&str; 5] = ["Oscar", "David", "Kristoffer", "Vilde", "Elsa"];

/// Returns the palette color for the participant registered at `index`.
#[must_use]
pub const fn palette_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// Roster used when no saved roster is available.
#[must_use]
pub fn default_roster() -> Vec<Participant> {
    DEFAULT_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| Participant::new(*name, palette_color(index)))
        .collect()
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a new participant at the end of the roster.
    AddParticipant {
        /// Requested display name; surrounding whitespace is ignored.
        name: String,
        /// Color used when presenting the participant.
        color: Color,
    },
    /// Removes the participant with the exact provided name.
    RemoveParticipant {
        /// Name of the participant to remove.
        name: String,
    },
    /// Arms or disarms the shield of the named participant.
    ToggleShield {
        /// Name of the participant whose shield is toggled.
        name: String,
    },
    /// Enables or disables the shield mechanic for future spins.
    SetShieldsEnabled {
        /// Whether shields should take part in spin resolution.
        enabled: bool,
    },
    /// Starts a spin whose winner has already been drawn.
    StartSpin {
        /// Amount awarded to the winner unless a shield intervenes.
        stake: u64,
        /// Roster position selected by the draw.
        winner: ParticipantIndex,
    },
    /// Resolves the in-flight spin once its presentation finished.
    ResolveSpin {
        /// Wall-clock time recorded in the history ledger.
        at: DateTime<Utc>,
    },
    /// Removes the newest history entry and reverts the shields it burned.
    DeleteLastEntry,
    /// Restores every participant's shield without touching history.
    ResetShields,
    /// Clears the history and restores every shield.
    ResetAll,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a participant joined the roster.
    ParticipantAdded {
        /// Name stored for the new participant.
        name: String,
    },
    /// Reports that a roster change was refused.
    ParticipantRejected {
        /// Name supplied with the rejected command.
        name: String,
        /// Specific reason the change failed.
        reason: RosterError,
    },
    /// Confirms that a participant left the roster.
    ParticipantRemoved {
        /// Name of the removed participant.
        name: String,
    },
    /// Confirms that a participant's shield changed state.
    ShieldToggled {
        /// Participant owning the shield.
        name: String,
        /// Whether the shield is now armed for the next spin.
        active: bool,
    },
    /// Reports that a shield toggle was refused.
    ShieldToggleRejected {
        /// Participant named in the request.
        name: String,
        /// Specific reason the toggle failed.
        reason: ShieldError,
    },
    /// Announces that the shield mechanic was switched on or off.
    ShieldsEnabledChanged {
        /// Setting that became active.
        enabled: bool,
    },
    /// Confirms that a spin is in flight.
    SpinStarted {
        /// Roster position that will win once the spin resolves.
        winner: ParticipantIndex,
        /// Stake riding on the spin.
        stake: u64,
        /// Roster positions whose shields were armed when the spin began.
        shielded: Vec<ParticipantIndex>,
    },
    /// Reports that a spin could not be started.
    SpinRejected {
        /// Specific reason the spin failed to start.
        reason: SpinError,
    },
    /// Reports which shields were consumed by a resolved spin.
    ShieldsBurned {
        /// Participants that lost their shield this round.
        names: Vec<String>,
    },
    /// Confirms that a spin finished and was recorded.
    SpinResolved {
        /// Ledger entry prepended to the history.
        entry: HistoryEntry,
    },
    /// Confirms that the newest history entry was deleted.
    HistoryEntryDeleted {
        /// Entry that was removed.
        entry: HistoryEntry,
    },
    /// Reports which shields were handed back after a deletion.
    ShieldsRestored {
        /// Participants whose shield became available again.
        names: Vec<String>,
    },
    /// Announces that every shield was restored.
    ShieldsReset,
    /// Announces that the history ledger was cleared.
    HistoryCleared,
}

/// Position of a participant within the ordered roster.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantIndex(usize);

impl ParticipantIndex {
    /// Creates a new index wrapper around the provided roster position.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the underlying roster position.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Display color assigned to a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Color {
    /// Creates an opaque color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::from_rgba(red, green, blue, 0xff)
    }

    /// Creates a color from byte RGBA components.
    #[must_use]
    pub const fn from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Alpha component of the color.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)?;
        if self.alpha != 0xff {
            write!(f, "{:02x}", self.alpha)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_owned()))?;
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(ColorParseError::InvalidLength(value.to_owned()));
        }

        let channel = |offset: usize| {
            u8::from_str_radix(&digits[offset..offset + 2], 16)
                .map_err(|_| ColorParseError::InvalidDigits(value.to_owned()))
        };
        let alpha = if digits.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::from_rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Errors produced while parsing a `#RRGGBB` or `#RRGGBBAA` color.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ColorParseError {
    /// The value did not start with `#`.
    #[error("color '{0}' must start with '#'")]
    MissingHash(String),
    /// The value did not carry six or eight hex digits.
    #[error("color '{0}' must have six or eight hex digits")]
    InvalidLength(String),
    /// The value contained a character outside `0-9a-fA-F`.
    #[error("color '{0}' contains non-hex digits")]
    InvalidDigits(String),
}

/// Curve controlling how strongly high running totals are penalised.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FairnessMode {
    /// Weight falls with the inverse square root of the projected total.
    Mild,
    /// Weight falls with the inverse of the projected total.
    Normal,
    /// Weight falls with the inverse square of the projected total.
    #[default]
    Aggressive,
}

impl FairnessMode {
    /// Every mode, ordered from gentlest to harshest.
    pub const ALL: [FairnessMode; 3] = [Self::Mild, Self::Normal, Self::Aggressive];

    /// Exponent `k` in the weight formula `w = x^-k`.
    #[must_use]
    pub const fn exponent(self) -> f64 {
        match self {
            Self::Mild => 0.5,
            Self::Normal => 1.0,
            Self::Aggressive => 2.0,
        }
    }

    /// Lowercase identifier used on the command line and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Normal => "normal",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for FairnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FairnessMode {
    type Err = FairnessModeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| FairnessModeParseError(value.to_owned()))
    }
}

/// Error returned when a fairness mode name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown fairness mode '{0}', expected mild, normal or aggressive")]
pub struct FairnessModeParseError(String);

/// Registered participant as stored in the roster blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique display name; uniqueness is case-insensitive.
    pub name: String,
    /// Color used when presenting the participant.
    pub color: Color,
    /// Whether the one-time shield is still available.
    pub has_shield: bool,
    /// Whether the shield is armed for the next spin.
    #[serde(default)]
    pub active_shield: bool,
}

impl Participant {
    /// Creates a participant holding an unarmed shield.
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            has_shield: true,
            active_shield: false,
        }
    }

    /// Reports whether the shield will protect the participant this round.
    #[must_use]
    pub const fn shield_armed(&self) -> bool {
        self.has_shield && self.active_shield
    }

    /// Case-insensitive name comparison used for duplicate detection.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Outcome of one resolved spin, stored newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Participant selected by the wheel.
    pub name: String,
    /// Amount credited to the participant; zero when a shield absorbed it.
    pub amount: u64,
    /// Moment the spin resolved.
    pub time: DateTime<Utc>,
    /// Participants whose shields were consumed by this spin.
    #[serde(default)]
    pub shield_used_by: Vec<String>,
}

/// Running totals per participant, derived from the history ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    by_name: BTreeMap<String, u64>,
}

impl Totals {
    /// Sums the awarded amounts of every entry in `history`.
    #[must_use]
    pub fn from_history(history: &[HistoryEntry]) -> Self {
        let mut totals = Self::default();
        for entry in history {
            totals.credit(&entry.name, entry.amount);
        }
        totals
    }

    /// Adds `amount` to the running total of `name`.
    pub fn credit(&mut self, name: &str, amount: u64) {
        let total = self.by_name.entry(name.to_owned()).or_insert(0);
        *total = total.saturating_add(amount);
    }

    /// Running total of `name`, zero for participants that never won.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.by_name.get(name).copied().unwrap_or(0)
    }

    /// Iterator over every recorded name and total, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.by_name
            .iter()
            .map(|(name, total)| (name.as_str(), *total))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Totals {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut totals = Self::default();
        for (name, amount) in iter {
            totals.credit(&name.into(), amount);
        }
        totals
    }
}

/// Immutable description of a spin that started but has not resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinSnapshot {
    /// Stake riding on the spin.
    pub stake: u64,
    /// Roster position that wins once the spin resolves.
    pub winner: ParticipantIndex,
    /// Roster positions whose shields were armed at spin start, ascending.
    pub shielded: Vec<ParticipantIndex>,
}

/// Everything persisted between sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedState {
    /// Spin outcomes, newest first.
    pub history: Vec<HistoryEntry>,
    /// Ordered participant roster.
    pub players: Vec<Participant>,
    /// Whether the shield mechanic is enabled.
    pub shields_enabled: bool,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            players: default_roster(),
            shields_enabled: true,
        }
    }
}

/// Reasons a roster change may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterError {
    /// The supplied name was empty after trimming.
    EmptyName,
    /// Another participant already answers to the name.
    DuplicateName,
    /// No participant carries the name.
    UnknownName,
    /// The roster cannot shrink while a spin is in flight.
    SpinInFlight,
}

/// Reasons a shield toggle may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldError {
    /// The shield mechanic is switched off.
    ShieldsDisabled,
    /// The participant already used its shield.
    ShieldSpent,
    /// No participant carries the name.
    UnknownName,
}

/// Reasons a spin may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpinError {
    /// Another spin has not resolved yet.
    AlreadySpinning,
    /// The roster has no participants.
    EmptyRoster,
    /// A spin must carry a positive stake.
    ZeroStake,
    /// The drawn winner does not address a roster position.
    WinnerOutOfRange,
}
