//! Ordered participant registry owned by the world.

use fortune_wheel_core::{Color, Participant, RosterError};

/// Participants in registration order; positions double as wheel slots.
#[derive(Debug)]
pub(crate) struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    /// Builds a roster from saved participants, disarming spent shields.
    pub(crate) fn from_participants(mut participants: Vec<Participant>) -> Self {
        for participant in &mut participants {
            if !participant.has_shield {
                participant.active_shield = false;
            }
        }
        Self { participants }
    }

    pub(crate) fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub(crate) fn participants_mut(&mut self) -> &mut [Participant] {
        &mut self.participants
    }

    /// Position of the participant with exactly the provided name.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.participants
            .iter()
            .position(|participant| participant.name == name)
    }

    /// Validates and appends a participant, returning the stored name.
    pub(crate) fn admit(&mut self, name: &str, color: Color) -> Result<String, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self
            .participants
            .iter()
            .any(|participant| participant.answers_to(name))
        {
            return Err(RosterError::DuplicateName);
        }

        self.participants.push(Participant::new(name, color));
        Ok(name.to_owned())
    }

    /// Removes the participant with exactly the provided name.
    pub(crate) fn remove(&mut self, name: &str) -> Result<Participant, RosterError> {
        let index = self.position(name).ok_or(RosterError::UnknownName)?;
        Ok(self.participants.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_wheel_core::PALETTE;

    fn roster_of(names: &[&str]) -> Roster {
        Roster::from_participants(
            names
                .iter()
                .map(|name| Participant::new(*name, PALETTE[0]))
                .collect(),
        )
    }

    #[test]
    fn admit_trims_and_appends() {
        let mut roster = roster_of(&["Oscar"]);
        assert_eq!(roster.admit("  Vilde ", PALETTE[1]), Ok("Vilde".to_owned()));
        assert_eq!(roster.participants().len(), 2);
        assert_eq!(roster.participants()[1].name, "Vilde");
        assert!(roster.participants()[1].has_shield);
    }

    #[test]
    fn admit_rejects_blank_names() {
        let mut roster = roster_of(&[]);
        assert_eq!(roster.admit("   ", PALETTE[0]), Err(RosterError::EmptyName));
        assert!(roster.participants().is_empty());
    }

    #[test]
    fn admit_rejects_case_insensitive_duplicates() {
        let mut roster = roster_of(&["Elsa"]);
        assert_eq!(roster.admit("eLSA", PALETTE[2]), Err(RosterError::DuplicateName));
        assert_eq!(roster.participants().len(), 1);
    }

    #[test]
    fn remove_requires_exact_name() {
        let mut roster = roster_of(&["David", "Elsa"]);
        assert_eq!(roster.remove("david"), Err(RosterError::UnknownName));
        let removed = roster.remove("David").expect("David is registered");
        assert_eq!(removed.name, "David");
        assert_eq!(roster.position("Elsa"), Some(0));
    }

    #[test]
    fn loading_disarms_shields_that_were_already_spent() {
        let mut spent = Participant::new("Oscar", PALETTE[0]);
        spent.has_shield = false;
        spent.active_shield = true;
        let roster = Roster::from_participants(vec![spent]);
        assert!(!roster.participants()[0].active_shield);
    }
}
