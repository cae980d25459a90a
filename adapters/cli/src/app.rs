//! Executes parsed actions against the world and its systems.

use chrono::{DateTime, Local, Utc};
use clap::{Subcommand, ValueEnum};
use fortune_wheel_core::{
    palette_color, Color, Command, Event, FairnessMode, Participant, RosterError, SavedState,
    ShieldError, SpinError,
};
use fortune_wheel_system_odds::compute_odds;
use fortune_wheel_system_selector::{Config, Selector};
use fortune_wheel_system_timeline::totals_over_time;
use fortune_wheel_world::{self as world, query, World};
use tracing::{info, warn};

/// Actions accepted on the command line.
#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub(crate) enum Action {
    /// Show every participant's odds for a pending stake.
    Odds {
        /// Stake used to project the running totals.
        #[arg(default_value_t = 0)]
        stake: u64,
    },
    /// Spin the wheel and record the outcome.
    Spin {
        /// Amount awarded to the winner.
        stake: u64,
    },
    /// List the roster and shield state.
    Players,
    /// Register a participant.
    Add {
        /// Display name, unique regardless of case.
        name: String,
        /// `#RRGGBB` color; defaults to the next palette entry.
        #[arg(long)]
        color: Option<Color>,
    },
    /// Remove a participant.
    Remove {
        /// Exact name of the participant.
        name: String,
    },
    /// Arm or disarm a participant's shield for the next spin.
    Shield {
        /// Exact name of the participant.
        name: String,
    },
    /// Turn the shield mechanic on or off.
    Shields {
        /// New setting.
        #[arg(value_enum)]
        switch: Switch,
    },
    /// Print the spin history, newest first.
    History,
    /// Print every participant's running total.
    Totals,
    /// Print running totals after every spin, oldest first.
    Timeline,
    /// Delete the newest history entry and hand back the shields it burned.
    Undo,
    /// Clear the history and restore every shield.
    Reset,
    /// Restore every shield and keep the history.
    ResetShields,
}

/// Two-state command-line switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Switch {
    On,
    Off,
}

/// Text produced by an action and whether state must be persisted.
#[derive(Debug, Default)]
pub(crate) struct Report {
    pub(crate) lines: Vec<String>,
    pub(crate) changed: bool,
}

impl Report {
    fn read_only(lines: Vec<String>) -> Self {
        Self {
            lines,
            changed: false,
        }
    }
}

/// World plus the systems that drive it.
#[derive(Debug)]
pub(crate) struct App {
    world: World,
    selector: Selector,
    mode: FairnessMode,
}

impl App {
    pub(crate) fn new(saved: SavedState, selector: Config, mode: FairnessMode) -> Self {
        Self {
            world: World::restore(saved),
            selector: Selector::new(selector),
            mode,
        }
    }

    pub(crate) fn saved_state(&self) -> SavedState {
        query::saved_state(&self.world)
    }

    pub(crate) fn execute(&mut self, action: Action, now: DateTime<Utc>) -> Report {
        match action {
            Action::Odds { stake } => Report::read_only(self.odds_lines(stake)),
            Action::Spin { stake } => self.spin(stake, now),
            Action::Players => Report::read_only(self.player_lines()),
            Action::Add { name, color } => {
                let color =
                    color.unwrap_or_else(|| palette_color(query::roster(&self.world).len()));
                self.apply(vec![Command::AddParticipant { name, color }])
            }
            Action::Remove { name } => self.apply(vec![Command::RemoveParticipant { name }]),
            Action::Shield { name } => self.apply(vec![Command::ToggleShield { name }]),
            Action::Shields { switch } => self.apply(vec![Command::SetShieldsEnabled {
                enabled: switch == Switch::On,
            }]),
            Action::History => Report::read_only(self.history_lines()),
            Action::Totals => Report::read_only(self.total_lines()),
            Action::Timeline => Report::read_only(self.timeline_lines()),
            Action::Undo => self.apply(vec![Command::DeleteLastEntry]),
            Action::Reset => self.apply(vec![Command::ResetAll]),
            Action::ResetShields => self.apply(vec![Command::ResetShields]),
        }
    }

    fn spin(&mut self, stake: u64, now: DateTime<Utc>) -> Report {
        let names = query::participant_names(&self.world);
        let odds = compute_odds(&names, &query::totals(&self.world), stake, self.mode);

        let mut commands = Vec::new();
        self.selector.handle(&odds, stake, &mut commands);
        if commands.is_empty() {
            warn!(stake, participants = names.len(), "a spin needs participants and a positive stake");
            return Report::default();
        }

        commands.push(Command::ResolveSpin { at: now });
        self.apply(commands)
    }

    fn apply(&mut self, commands: Vec<Command>) -> Report {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let mut report = Report::default();
        for event in &events {
            match describe(event) {
                Ok(line) => {
                    report.changed = true;
                    if let Some(line) = line {
                        info!("{line}");
                        report.lines.push(line);
                    }
                }
                Err(rejection) => warn!("{rejection}"),
            }
        }
        report
    }

    fn odds_lines(&self, stake: u64) -> Vec<String> {
        let roster = query::roster(&self.world);
        let names = query::participant_names(&self.world);
        let totals = query::totals(&self.world);
        let odds = compute_odds(&names, &totals, stake, self.mode);
        let shields_enabled = query::shields_enabled(&self.world);

        roster
            .iter()
            .zip(odds.probabilities())
            .map(|(participant, probability)| {
                format!(
                    "{:<12} {:>5.1}%  {:>8}{}",
                    participant.name,
                    probability * 100.0,
                    totals.get(&participant.name),
                    shield_label(participant, shields_enabled),
                )
            })
            .collect()
    }

    fn player_lines(&self) -> Vec<String> {
        let shields_enabled = query::shields_enabled(&self.world);
        query::roster(&self.world)
            .iter()
            .map(|participant| {
                format!(
                    "{:<12} {}{}",
                    participant.name,
                    participant.color,
                    shield_label(participant, shields_enabled),
                )
            })
            .collect()
    }

    fn history_lines(&self) -> Vec<String> {
        query::history(&self.world)
            .iter()
            .map(|entry| {
                let mut line = format!(
                    "{}  {} - {}",
                    entry.time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    entry.name,
                    entry.amount,
                );
                if !entry.shield_used_by.is_empty() {
                    line.push_str(&format!("  [shields used: {}]", entry.shield_used_by.len()));
                }
                line
            })
            .collect()
    }

    fn total_lines(&self) -> Vec<String> {
        let totals = query::totals(&self.world);
        query::roster(&self.world)
            .iter()
            .map(|participant| {
                format!(
                    "{:<12} {}",
                    participant.name,
                    totals.get(&participant.name)
                )
            })
            .collect()
    }

    fn timeline_lines(&self) -> Vec<String> {
        let names = query::participant_names(&self.world);
        let timeline = totals_over_time(&names, query::history(&self.world));

        let header = std::iter::once("spin".to_owned())
            .chain(timeline.names().iter().cloned())
            .collect::<Vec<_>>()
            .join("\t");
        let rows = timeline.rows().iter().map(|row| {
            std::iter::once(row.spin.to_string())
                .chain(row.totals.iter().map(u64::to_string))
                .collect::<Vec<_>>()
                .join("\t")
        });
        std::iter::once(header).chain(rows).collect()
    }
}

fn shield_label(participant: &Participant, shields_enabled: bool) -> &'static str {
    if !shields_enabled {
        ""
    } else if participant.shield_armed() {
        "  [shield armed]"
    } else if participant.has_shield {
        "  [shield ready]"
    } else {
        "  [shield used]"
    }
}

/// Renders an event as `Ok` output for applied changes or `Err` for rejections.
fn describe(event: &Event) -> Result<Option<String>, String> {
    let line = match event {
        Event::ParticipantAdded { name } => format!("added {name}"),
        Event::ParticipantRemoved { name } => format!("removed {name}"),
        Event::ParticipantRejected { name, reason } => {
            return Err(format!("participant '{name}' unchanged: {}", roster_reason(*reason)));
        }
        Event::ShieldToggled { name, active: true } => format!("{name}'s shield is armed"),
        Event::ShieldToggled {
            name,
            active: false,
        } => format!("{name}'s shield is disarmed"),
        Event::ShieldToggleRejected { name, reason } => {
            return Err(format!("shield of '{name}' unchanged: {}", shield_reason(*reason)));
        }
        Event::ShieldsEnabledChanged { enabled: true } => "shields enabled".to_owned(),
        Event::ShieldsEnabledChanged { enabled: false } => "shields disabled".to_owned(),
        Event::SpinStarted { .. } => return Ok(None),
        Event::SpinRejected { reason } => {
            return Err(format!("spin refused: {}", spin_reason(*reason)));
        }
        Event::ShieldsBurned { names } => format!("shields burned: {}", names.join(", ")),
        Event::SpinResolved { entry } if entry.shield_used_by.contains(&entry.name) => {
            format!("{} wins, but the shield absorbs the stake", entry.name)
        }
        Event::SpinResolved { entry } => format!("{} wins {}", entry.name, entry.amount),
        Event::HistoryEntryDeleted { entry } => {
            format!("deleted spin: {} - {}", entry.name, entry.amount)
        }
        Event::ShieldsRestored { names } => format!("shields restored: {}", names.join(", ")),
        Event::ShieldsReset => "all shields restored".to_owned(),
        Event::HistoryCleared => "history cleared".to_owned(),
    };
    Ok(Some(line))
}

fn roster_reason(reason: RosterError) -> &'static str {
    match reason {
        RosterError::EmptyName => "name is empty",
        RosterError::DuplicateName => "name already taken",
        RosterError::UnknownName => "no such participant",
        RosterError::SpinInFlight => "a spin is in progress",
    }
}

fn shield_reason(reason: ShieldError) -> &'static str {
    match reason {
        ShieldError::ShieldsDisabled => "shields are disabled",
        ShieldError::ShieldSpent => "shield already used",
        ShieldError::UnknownName => "no such participant",
    }
}

fn spin_reason(reason: SpinError) -> &'static str {
    match reason {
        SpinError::AlreadySpinning => "a spin is already in progress",
        SpinError::EmptyRoster => "no participants",
        SpinError::ZeroStake => "stake must be positive",
        SpinError::WinnerOutOfRange => "winner is not on the wheel",
    }
}
