#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cumulative totals per spin, the data behind a totals-over-time chart.

use fortune_wheel_core::{HistoryEntry, Totals};

/// Running totals of every tracked participant after a given spin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineRow {
    /// Spin number; zero is the baseline before any spin.
    pub spin: usize,
    /// Running totals in the order of [`Timeline::names`].
    pub totals: Vec<u64>,
}

/// Chart-ready series of running totals, oldest spin first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    names: Vec<String>,
    rows: Vec<TimelineRow>,
}

impl Timeline {
    /// Participants tracked as columns.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Baseline row followed by one row per spin.
    #[must_use]
    pub fn rows(&self) -> &[TimelineRow] {
        &self.rows
    }

    /// Row describing the state after the newest spin.
    #[must_use]
    pub fn latest(&self) -> Option<&TimelineRow> {
        self.rows.last()
    }

    /// Every running total of one participant, baseline included.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<Vec<u64>> {
        let column = self.names.iter().position(|candidate| candidate == name)?;
        Some(self.rows.iter().map(|row| row.totals[column]).collect())
    }
}

/// Replays a newest-first history into running totals per spin.
///
/// Only the provided `names` become columns. Winners that have since left
/// the roster still accumulate internally but are not reported.
#[must_use]
pub fn totals_over_time<S: AsRef<str>>(names: &[S], history: &[HistoryEntry]) -> Timeline {
    let names: Vec<String> = names.iter().map(|name| name.as_ref().to_owned()).collect();
    let snapshot = |running: &Totals, spin: usize| TimelineRow {
        spin,
        totals: names.iter().map(|name| running.get(name)).collect(),
    };

    let mut running = Totals::default();
    let mut rows = Vec::with_capacity(history.len() + 1);
    rows.push(snapshot(&running, 0));

    for (spin, entry) in history.iter().rev().enumerate() {
        running.credit(&entry.name, entry.amount);
        rows.push(snapshot(&running, spin + 1));
    }

    Timeline { names, rows }
}
