//! Append-only spin history, newest entry first.

use fortune_wheel_core::{HistoryEntry, Totals};

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    entries: Vec<HistoryEntry>,
}

impl Ledger {
    pub(crate) fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Places a resolved spin at the front of the history.
    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    /// Removes and returns the newest entry, if any.
    pub(crate) fn delete_latest(&mut self) -> Option<HistoryEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recomputes running totals from every recorded entry.
    pub(crate) fn totals(&self) -> Totals {
        Totals::from_history(&self.entries)
    }
}
