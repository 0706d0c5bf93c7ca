//! Participants of one game.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::planner::MAX_PARTICIPANTS;

pub const MAX_NAME_LEN: usize = 30;

/// Opaque participant key, e.g. `player_003`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        ParticipantId(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// Ordered list of participants; insertion order is the deal order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Adds a participant after trimming the name.
    ///
    /// Names are unique case-insensitively and at most [`MAX_NAME_LEN`]
    /// characters long; the roster holds at most [`MAX_PARTICIPANTS`].
    pub fn add(&mut self, name: &str) -> Result<ParticipantId, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(RosterError::NameTooLong { max: MAX_NAME_LEN });
        }
        if self.find_by_name(name).is_some() {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(RosterError::RosterFull {
                max: MAX_PARTICIPANTS,
            });
        }

        self.next_id += 1;
        let id = ParticipantId(format!("player_{:03}", self.next_id));
        self.participants.push(Participant {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Result<Participant, RosterError> {
        let position = self
            .participants
            .iter()
            .position(|participant| &participant.id == id)
            .ok_or_else(|| RosterError::UnknownParticipant(id.clone()))?;
        Ok(self.participants.remove(position))
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|participant| &participant.id == id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        let wanted = name.trim().to_lowercase();
        self.participants
            .iter()
            .find(|participant| participant.name.to_lowercase() == wanted)
    }

    pub fn ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .map(|participant| participant.id.clone())
            .collect()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
