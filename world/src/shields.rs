//! One-time shield bookkeeping applied around spin resolution.
//!
//! Shields armed when a spin starts are captured in a snapshot. Resolution
//! burns every shield in that snapshot, whether or not its owner won, and a
//! winner inside the snapshot receives nothing.

use fortune_wheel_core::{Participant, ParticipantIndex, ShieldError};

/// Captures the positions whose shields are armed right now.
///
/// Returns an empty snapshot when the mechanic is disabled.
pub(crate) fn snapshot(participants: &[Participant], enabled: bool) -> Vec<ParticipantIndex> {
    if !enabled {
        return Vec::new();
    }

    participants
        .iter()
        .enumerate()
        .filter(|(_, participant)| participant.shield_armed())
        .map(|(index, _)| ParticipantIndex::new(index))
        .collect()
}

/// Clears both shield flags for every snapshot position, returning the names.
pub(crate) fn burn(participants: &mut [Participant], snapshot: &[ParticipantIndex]) -> Vec<String> {
    let mut burned = Vec::new();
    for index in snapshot {
        if let Some(participant) = participants.get_mut(index.get()) {
            participant.has_shield = false;
            participant.active_shield = false;
            burned.push(participant.name.clone());
        }
    }
    burned
}

/// Amount credited to the winner of a spin.
pub(crate) fn awarded_amount(
    stake: u64,
    winner: ParticipantIndex,
    snapshot: &[ParticipantIndex],
) -> u64 {
    if snapshot.contains(&winner) {
        0
    } else {
        stake
    }
}

/// Hands shields back to the named participants, returning who was found.
pub(crate) fn restore(participants: &mut [Participant], names: &[String]) -> Vec<String> {
    participants
        .iter_mut()
        .filter(|participant| names.contains(&participant.name))
        .map(|participant| {
            participant.has_shield = true;
            participant.active_shield = false;
            participant.name.clone()
        })
        .collect()
}

/// Gives every participant an unarmed shield.
pub(crate) fn reset(participants: &mut [Participant]) {
    for participant in participants {
        participant.has_shield = true;
        participant.active_shield = false;
    }
}

/// Flips the armed state of a participant's shield.
pub(crate) fn toggle(participant: &mut Participant, enabled: bool) -> Result<bool, ShieldError> {
    if !enabled {
        return Err(ShieldError::ShieldsDisabled);
    }
    if !participant.has_shield {
        return Err(ShieldError::ShieldSpent);
    }

    participant.active_shield = !participant.active_shield;
    Ok(participant.active_shield)
}
