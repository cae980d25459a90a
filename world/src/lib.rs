#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Fortune Wheel.

mod ledger;
mod roster;
mod shields;

use chrono::{DateTime, Utc};
use fortune_wheel_core::{
    Command, Event, HistoryEntry, ParticipantIndex, RosterError, SavedState, ShieldError,
    SpinError, SpinSnapshot,
};
use tracing::{debug, info};

use crate::{ledger::Ledger, roster::Roster};

/// Represents the authoritative Fortune Wheel state.
#[derive(Debug)]
pub struct World {
    roster: Roster,
    ledger: Ledger,
    shields_enabled: bool,
    last_winner: Option<String>,
    spin: Option<SpinSnapshot>,
}

impl World {
    /// Creates a world with the default roster, no history and shields enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::restore(SavedState::default())
    }

    /// Rebuilds a world from previously persisted state.
    #[must_use]
    pub fn restore(saved: SavedState) -> Self {
        Self {
            roster: Roster::from_participants(saved.players),
            ledger: Ledger::from_entries(saved.history),
            shields_enabled: saved.shields_enabled,
            last_winner: None,
            spin: None,
        }
    }

    fn start_spin(
        &mut self,
        stake: u64,
        winner: ParticipantIndex,
    ) -> Result<&SpinSnapshot, SpinError> {
        if self.spin.is_some() {
            return Err(SpinError::AlreadySpinning);
        }
        let participants = self.roster.participants();
        if participants.is_empty() {
            return Err(SpinError::EmptyRoster);
        }
        if stake == 0 {
            return Err(SpinError::ZeroStake);
        }
        if winner.get() >= participants.len() {
            return Err(SpinError::WinnerOutOfRange);
        }

        let shielded = shields::snapshot(participants, self.shields_enabled);
        Ok(self.spin.insert(SpinSnapshot {
            stake,
            winner,
            shielded,
        }))
    }

    fn resolve_spin(&mut self, at: DateTime<Utc>, out_events: &mut Vec<Event>) {
        let Some(spin) = self.spin.take() else {
            debug!("resolve ignored without a spin in flight");
            return;
        };
        let Some(winner) = self.roster.participants().get(spin.winner.get()) else {
            return;
        };
        let name = winner.name.clone();

        let burned = shields::burn(self.roster.participants_mut(), &spin.shielded);
        if !burned.is_empty() {
            out_events.push(Event::ShieldsBurned {
                names: burned.clone(),
            });
        }

        let amount = shields::awarded_amount(spin.stake, spin.winner, &spin.shielded);
        info!(winner = %name, stake = spin.stake, amount, "spin resolved");

        let entry = HistoryEntry {
            name: name.clone(),
            amount,
            time: at,
            shield_used_by: burned,
        };
        self.ledger.record(entry.clone());
        self.last_winner = Some(name);
        out_events.push(Event::SpinResolved { entry });
    }

    fn forget_winner(&mut self, name: &str) {
        if self.last_winner.as_deref() == Some(name) {
            self.last_winner = None;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AddParticipant { name, color } => match world.roster.admit(&name, color) {
            Ok(name) => {
                debug!(%name, %color, "participant added");
                out_events.push(Event::ParticipantAdded { name });
            }
            Err(reason) => {
                debug!(%name, ?reason, "participant rejected");
                out_events.push(Event::ParticipantRejected { name, reason });
            }
        },
        Command::RemoveParticipant { name } => {
            if world.spin.is_some() {
                out_events.push(Event::ParticipantRejected {
                    name,
                    reason: RosterError::SpinInFlight,
                });
                return;
            }

            match world.roster.remove(&name) {
                Ok(removed) => {
                    world.forget_winner(&removed.name);
                    out_events.push(Event::ParticipantRemoved { name: removed.name });
                }
                Err(reason) => out_events.push(Event::ParticipantRejected { name, reason }),
            }
        }
        Command::ToggleShield { name } => {
            let enabled = world.shields_enabled;
            let outcome = match world.roster.position(&name) {
                Some(index) => shields::toggle(&mut world.roster.participants_mut()[index], enabled),
                None => Err(ShieldError::UnknownName),
            };
            match outcome {
                Ok(active) => out_events.push(Event::ShieldToggled { name, active }),
                Err(reason) => out_events.push(Event::ShieldToggleRejected { name, reason }),
            }
        }
        Command::SetShieldsEnabled { enabled } => {
            if world.shields_enabled != enabled {
                world.shields_enabled = enabled;
                out_events.push(Event::ShieldsEnabledChanged { enabled });
            }
        }
        Command::StartSpin { stake, winner } => match world.start_spin(stake, winner) {
            Ok(spin) => {
                debug!(stake, winner = winner.get(), shielded = spin.shielded.len(), "spin started");
                out_events.push(Event::SpinStarted {
                    winner,
                    stake,
                    shielded: spin.shielded.clone(),
                });
            }
            Err(reason) => {
                debug!(?reason, "spin rejected");
                out_events.push(Event::SpinRejected { reason });
            }
        },
        Command::ResolveSpin { at } => world.resolve_spin(at, out_events),
        Command::DeleteLastEntry => {
            let Some(entry) = world.ledger.delete_latest() else {
                return;
            };
            let restored =
                shields::restore(world.roster.participants_mut(), &entry.shield_used_by);
            out_events.push(Event::HistoryEntryDeleted { entry });
            if !restored.is_empty() {
                out_events.push(Event::ShieldsRestored { names: restored });
            }
        }
        Command::ResetShields => {
            shields::reset(world.roster.participants_mut());
            out_events.push(Event::ShieldsReset);
        }
        Command::ResetAll => {
            world.ledger.clear();
            shields::reset(world.roster.participants_mut());
            world.last_winner = None;
            out_events.push(Event::HistoryCleared);
            out_events.push(Event::ShieldsReset);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use fortune_wheel_core::{HistoryEntry, Participant, SavedState, SpinSnapshot, Totals};

    use super::World;

    /// Ordered roster; positions match wheel slots.
    #[must_use]
    pub fn roster(world: &World) -> &[Participant] {
        world.roster.participants()
    }

    /// Participant names in roster order.
    #[must_use]
    pub fn participant_names(world: &World) -> Vec<String> {
        world
            .roster
            .participants()
            .iter()
            .map(|participant| participant.name.clone())
            .collect()
    }

    /// Looks up a participant by exact name.
    #[must_use]
    pub fn participant<'world>(world: &'world World, name: &str) -> Option<&'world Participant> {
        world
            .roster
            .position(name)
            .map(|index| &world.roster.participants()[index])
    }

    /// Running totals recomputed from the history ledger.
    #[must_use]
    pub fn totals(world: &World) -> Totals {
        world.ledger.totals()
    }

    /// Spin history, newest first.
    #[must_use]
    pub fn history(world: &World) -> &[HistoryEntry] {
        world.ledger.entries()
    }

    /// Reports whether the shield mechanic is enabled.
    #[must_use]
    pub fn shields_enabled(world: &World) -> bool {
        world.shields_enabled
    }

    /// Winner of the most recent spin resolved in this session.
    #[must_use]
    pub fn last_winner(world: &World) -> Option<&str> {
        world.last_winner.as_deref()
    }

    /// Spin that started but has not resolved yet.
    #[must_use]
    pub fn spin_in_flight(world: &World) -> Option<&SpinSnapshot> {
        world.spin.as_ref()
    }

    /// Captures everything that should be persisted.
    #[must_use]
    pub fn saved_state(world: &World) -> SavedState {
        SavedState {
            history: world.ledger.entries().to_vec(),
            players: world.roster.participants().to_vec(),
            shields_enabled: world.shields_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fortune_wheel_core::{Participant, PALETTE};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 20, minute, 0).unwrap()
    }

    fn world_with(names: &[&str]) -> World {
        World::restore(SavedState {
            history: Vec::new(),
            players: names
                .iter()
                .enumerate()
                .map(|(index, name)| Participant::new(*name, PALETTE[index]))
                .collect(),
            shields_enabled: true,
        })
    }

    fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            apply(world, command, &mut events);
        }
        events
    }

    fn spin(world: &mut World, stake: u64, winner: usize, minute: u32) -> Vec<Event> {
        run(
            world,
            vec![
                Command::StartSpin {
                    stake,
                    winner: ParticipantIndex::new(winner),
                },
                Command::ResolveSpin { at: at(minute) },
            ],
        )
    }

    fn arm(world: &mut World, name: &str) {
        let _ = run(
            world,
            vec![Command::ToggleShield {
                name: name.to_owned(),
            }],
        );
    }

    #[test]
    fn new_world_uses_default_roster() {
        let world = World::new();
        assert_eq!(
            query::participant_names(&world),
            ["Oscar", "David", "Kristoffer", "Vilde", "Elsa"]
        );
        assert!(query::shields_enabled(&world));
        assert!(query::history(&world).is_empty());
    }

    #[test]
    fn unshielded_spin_awards_the_stake() {
        let mut world = world_with(&["A", "B"]);
        let events = spin(&mut world, 40, 1, 0);

        let history = query::history(&world);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "B");
        assert_eq!(history[0].amount, 40);
        assert!(history[0].shield_used_by.is_empty());
        assert_eq!(query::totals(&world).get("B"), 40);
        assert_eq!(query::last_winner(&world), Some("B"));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ShieldsBurned { .. })));
    }

    #[test]
    fn shielded_winner_gets_zero_and_every_armed_shield_burns() {
        let mut world = world_with(&["A", "B", "C"]);
        arm(&mut world, "A");
        arm(&mut world, "C");

        let events = spin(&mut world, 50, 0, 1);

        assert!(events.contains(&Event::ShieldsBurned {
            names: vec!["A".to_owned(), "C".to_owned()],
        }));
        let entry = &query::history(&world)[0];
        assert_eq!(entry.amount, 0);
        assert_eq!(entry.shield_used_by, ["A", "C"]);

        let roster = query::roster(&world);
        assert!(!roster[0].has_shield && !roster[0].active_shield);
        assert!(roster[1].has_shield);
        assert!(!roster[2].has_shield && !roster[2].active_shield);
    }

    #[test]
    fn shield_snapshot_is_fixed_at_spin_start() {
        let mut world = world_with(&["A", "B"]);
        let _ = run(
            &mut world,
            vec![Command::StartSpin {
                stake: 10,
                winner: ParticipantIndex::new(0),
            }],
        );
        arm(&mut world, "A");
        let _ = run(&mut world, vec![Command::ResolveSpin { at: at(2) }]);

        let entry = &query::history(&world)[0];
        assert_eq!(entry.amount, 10, "shield armed mid-spin must not apply");
        assert!(query::roster(&world)[0].active_shield);
    }

    #[test]
    fn disabled_shields_neither_protect_nor_burn() {
        let mut world = world_with(&["A", "B"]);
        arm(&mut world, "A");
        let _ = run(&mut world, vec![Command::SetShieldsEnabled { enabled: false }]);
        let _ = spin(&mut world, 30, 0, 3);

        assert_eq!(query::history(&world)[0].amount, 30);
        assert!(query::roster(&world)[0].has_shield);
    }

    #[test]
    fn deleting_last_entry_restores_listed_shields() {
        let mut world = world_with(&["A", "B", "C"]);
        arm(&mut world, "B");
        let _ = spin(&mut world, 20, 0, 4);
        assert!(!query::roster(&world)[1].has_shield);

        let events = run(&mut world, vec![Command::DeleteLastEntry]);

        assert!(query::history(&world).is_empty());
        assert!(events.contains(&Event::ShieldsRestored {
            names: vec!["B".to_owned()],
        }));
        let roster = query::roster(&world);
        assert!(roster[1].has_shield && !roster[1].active_shield);
        assert!(roster[0].has_shield && roster[2].has_shield);
    }

    #[test]
    fn deleting_from_empty_history_is_a_no_op() {
        let mut world = world_with(&["A"]);
        assert!(run(&mut world, vec![Command::DeleteLastEntry]).is_empty());
    }

    #[test]
    fn second_spin_is_rejected_while_one_is_in_flight() {
        let mut world = world_with(&["A", "B"]);
        let events = run(
            &mut world,
            vec![
                Command::StartSpin {
                    stake: 5,
                    winner: ParticipantIndex::new(0),
                },
                Command::StartSpin {
                    stake: 5,
                    winner: ParticipantIndex::new(1),
                },
            ],
        );
        assert_eq!(
            events.last(),
            Some(&Event::SpinRejected {
                reason: SpinError::AlreadySpinning,
            })
        );
        assert_eq!(
            query::spin_in_flight(&world).map(|spin| spin.winner),
            Some(ParticipantIndex::new(0))
        );
    }

    #[test]
    fn invalid_spins_are_rejected() {
        let mut empty = world_with(&[]);
        assert_eq!(
            spin(&mut empty, 5, 0, 0),
            vec![Event::SpinRejected {
                reason: SpinError::EmptyRoster,
            }]
        );

        let mut world = world_with(&["A"]);
        assert_eq!(
            spin(&mut world, 0, 0, 0),
            vec![Event::SpinRejected {
                reason: SpinError::ZeroStake,
            }]
        );
        assert_eq!(
            spin(&mut world, 5, 3, 0),
            vec![Event::SpinRejected {
                reason: SpinError::WinnerOutOfRange,
            }]
        );
        assert!(query::history(&world).is_empty());
    }

    #[test]
    fn roster_validation_rejects_blank_and_duplicate_names() {
        let mut world = world_with(&["Oscar"]);
        let events = run(
            &mut world,
            vec![
                Command::AddParticipant {
                    name: "  ".to_owned(),
                    color: PALETTE[1],
                },
                Command::AddParticipant {
                    name: "oscar".to_owned(),
                    color: PALETTE[1],
                },
                Command::AddParticipant {
                    name: " Elsa ".to_owned(),
                    color: PALETTE[1],
                },
            ],
        );

        assert_eq!(
            events,
            vec![
                Event::ParticipantRejected {
                    name: "  ".to_owned(),
                    reason: RosterError::EmptyName,
                },
                Event::ParticipantRejected {
                    name: "oscar".to_owned(),
                    reason: RosterError::DuplicateName,
                },
                Event::ParticipantAdded {
                    name: "Elsa".to_owned(),
                },
            ]
        );
        assert_eq!(query::participant_names(&world), ["Oscar", "Elsa"]);
    }

    #[test]
    fn removing_the_last_winner_forgets_it() {
        let mut world = world_with(&["A", "B"]);
        let _ = spin(&mut world, 5, 0, 5);
        let _ = run(
            &mut world,
            vec![Command::RemoveParticipant {
                name: "A".to_owned(),
            }],
        );
        assert_eq!(query::last_winner(&world), None);
        assert_eq!(query::participant_names(&world), ["B"]);
        assert_eq!(query::totals(&world).get("A"), 5, "history is kept");
    }

    #[test]
    fn removal_is_blocked_while_spinning() {
        let mut world = world_with(&["A", "B"]);
        let events = run(
            &mut world,
            vec![
                Command::StartSpin {
                    stake: 5,
                    winner: ParticipantIndex::new(1),
                },
                Command::RemoveParticipant {
                    name: "A".to_owned(),
                },
            ],
        );
        assert_eq!(
            events.last(),
            Some(&Event::ParticipantRejected {
                name: "A".to_owned(),
                reason: RosterError::SpinInFlight,
            })
        );
    }

    #[test]
    fn toggling_requires_enabled_shields_and_an_unspent_shield() {
        let mut world = world_with(&["A"]);
        let events = run(
            &mut world,
            vec![
                Command::SetShieldsEnabled { enabled: false },
                Command::ToggleShield {
                    name: "A".to_owned(),
                },
                Command::SetShieldsEnabled { enabled: true },
                Command::ToggleShield {
                    name: "A".to_owned(),
                },
                Command::ToggleShield {
                    name: "Z".to_owned(),
                },
            ],
        );

        assert_eq!(
            events,
            vec![
                Event::ShieldsEnabledChanged { enabled: false },
                Event::ShieldToggleRejected {
                    name: "A".to_owned(),
                    reason: ShieldError::ShieldsDisabled,
                },
                Event::ShieldsEnabledChanged { enabled: true },
                Event::ShieldToggled {
                    name: "A".to_owned(),
                    active: true,
                },
                Event::ShieldToggleRejected {
                    name: "Z".to_owned(),
                    reason: ShieldError::UnknownName,
                },
            ]
        );
    }

    #[test]
    fn reset_all_clears_history_and_restores_shields() {
        let mut world = world_with(&["A", "B"]);
        arm(&mut world, "A");
        let _ = spin(&mut world, 15, 1, 6);
        let _ = run(&mut world, vec![Command::ResetAll]);

        assert!(query::history(&world).is_empty());
        assert_eq!(query::last_winner(&world), None);
        assert!(query::roster(&world)
            .iter()
            .all(|p| p.has_shield && !p.active_shield));
    }

    #[test]
    fn reset_shields_keeps_history() {
        let mut world = world_with(&["A", "B"]);
        arm(&mut world, "B");
        let _ = spin(&mut world, 15, 0, 7);
        let _ = run(&mut world, vec![Command::ResetShields]);

        assert_eq!(query::history(&world).len(), 1);
        assert!(query::roster(&world)[1].has_shield);
    }

    #[test]
    fn saved_state_round_trips_through_restore() {
        let mut world = world_with(&["A", "B"]);
        let _ = spin(&mut world, 9, 1, 8);
        let saved = query::saved_state(&world);
        let restored = World::restore(saved.clone());

        assert_eq!(query::saved_state(&restored), saved);
        assert_eq!(
            query::history(&restored),
            [HistoryEntry {
                name: "B".to_owned(),
                amount: 9,
                time: at(8),
                shield_used_by: Vec::new(),
            }]
        );
    }
}
