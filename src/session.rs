//! One game table: roster, role locks, and the latest deal.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::assign::{Assignment, LockSet};
use crate::catalog::{Catalog, RoleId, Team};
use crate::engine::{Deal, Engine, UnbalancedPolicy};
use crate::error::{RoleError, RosterError, SessionError};
use crate::planner::MIN_PARTICIPANTS;
use crate::roster::{Participant, ParticipantId, Roster};

/// A participant's dealt role, resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealedRole {
    pub participant: Participant,
    pub role: RoleId,
    pub role_name: String,
    pub team: Team,
    pub description: String,
    pub locked: bool,
}

#[derive(Debug)]
pub struct GameSession {
    engine: Engine,
    roster: Roster,
    locks: LockSet,
    last_deal: Option<Deal>,
}

impl GameSession {
    pub fn new(catalog: Arc<Catalog>) -> Result<Self, SessionError> {
        Ok(GameSession {
            engine: Engine::new(catalog)?,
            roster: Roster::new(),
            locks: LockSet::new(),
            last_deal: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn locks(&self) -> &LockSet {
        &self.locks
    }

    pub fn last_deal(&self) -> Option<&Deal> {
        self.last_deal.as_ref()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.last_deal.as_ref().map(|deal| &deal.assignment)
    }

    pub fn add_participant(&mut self, name: &str) -> Result<ParticipantId, SessionError> {
        Ok(self.roster.add(name)?)
    }

    /// Removes a participant along with any lock they hold.
    pub fn remove_participant(&mut self, id: &ParticipantId) -> Result<Participant, SessionError> {
        let participant = self.roster.remove(id)?;
        self.locks.remove(id);
        Ok(participant)
    }

    /// Pins `role` on a participant for the next deals.
    pub fn lock_role(&mut self, id: &ParticipantId, role: &str) -> Result<(), SessionError> {
        if !self.roster.contains(id) {
            return Err(RosterError::UnknownParticipant(id.clone()).into());
        }
        let role = self.catalog().get_role(role)?.id.clone();
        self.locks.insert(id.clone(), role);
        Ok(())
    }

    pub fn unlock_role(&mut self, id: &ParticipantId) -> Option<RoleId> {
        self.locks.remove(id)
    }

    /// Plans, checks balance and deals roles to the whole roster. The new
    /// assignment replaces the previous one.
    pub fn assign_roles<R: Rng + ?Sized>(
        &mut self,
        policy: UnbalancedPolicy,
        rng: &mut R,
    ) -> Result<&Deal, SessionError> {
        if self.roster.len() < MIN_PARTICIPANTS {
            return Err(RosterError::TooFewParticipants {
                count: self.roster.len(),
                min: MIN_PARTICIPANTS,
            }
            .into());
        }

        let deal = self.engine.run(&self.roster.ids(), &self.locks, policy, rng)?;
        Ok(&*self.last_deal.insert(deal))
    }

    /// Dealt roles in roster order.
    pub fn reveal(&self) -> Result<Vec<RevealedRole>, RoleError> {
        let Some(assignment) = self.assignment() else {
            return Ok(Vec::new());
        };

        let mut revealed = Vec::with_capacity(assignment.len());
        for participant in self.roster.participants() {
            let Some(role_id) = assignment.get(&participant.id) else {
                continue;
            };
            let role = self.catalog().get_role(role_id.as_str())?;
            revealed.push(RevealedRole {
                participant: participant.clone(),
                role: role.id.clone(),
                role_name: role.name.clone(),
                team: role.team,
                description: role.description.clone(),
                locked: self.locks.contains_key(&participant.id),
            });
        }
        Ok(revealed)
    }

    /// Starts over with an empty table.
    pub fn reset(&mut self) {
        self.roster.clear();
        self.locks.clear();
        self.last_deal = None;
        info!("game session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ids;
    use crate::error::{EngineError, PlanError};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const NAMES: [&str; 10] = [
        "Alice", "Bob", "Chloé", "David", "Emma", "Farid", "Gabin", "Hugo", "Inès", "Jules",
    ];

    fn session_with(count: usize) -> (GameSession, Vec<ParticipantId>) {
        let mut session = GameSession::new(Arc::new(Catalog::standard())).unwrap();
        let players = NAMES[..count]
            .iter()
            .map(|name| session.add_participant(name).unwrap())
            .collect();
        (session, players)
    }

    #[test]
    fn test_new_rejects_catalog_without_werewolf() {
        let roles = Catalog::standard()
            .roles()
            .iter()
            .filter(|role| role.id != ids::WEREWOLF)
            .cloned()
            .collect();
        let catalog = Catalog::from_roles(roles).unwrap();
        assert!(matches!(
            GameSession::new(Arc::new(catalog)),
            Err(SessionError::Engine(EngineError::Plan(PlanError::MissingMandatoryRole(_))))
        ));
    }

    #[test]
    fn test_too_few_participants() {
        let (mut session, _) = session_with(7);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            session.assign_roles(UnbalancedPolicy::Proceed, &mut rng),
            Err(SessionError::Roster(RosterError::TooFewParticipants {
                count: 7,
                min: 8
            }))
        );
        assert!(session.assignment().is_none());
    }

    #[test]
    fn test_assign_roles_with_lock() {
        let (mut session, players) = session_with(10);
        session.lock_role(&players[0], "WEREWOLF").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let deal = session
            .assign_roles(UnbalancedPolicy::Proceed, &mut rng)
            .unwrap();
        assert_eq!(deal.assignment.len(), 10);
        assert_eq!(deal.assignment.get(&players[0]).unwrap(), "WEREWOLF");

        let revealed = session.reveal().unwrap();
        assert_eq!(revealed.len(), 10);
        assert_eq!(revealed[0].participant.name, "Alice");
        assert_eq!(revealed[0].role_name, "Loup-Garou");
        assert_eq!(revealed[0].team, Team::Werewolves);
        assert!(revealed[0].locked);
        assert!(revealed[1..].iter().all(|entry| !entry.locked));
    }

    #[test]
    fn test_abort_keeps_previous_assignment() {
        let (mut session, _) = session_with(8);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let first = session
            .assign_roles(UnbalancedPolicy::Proceed, &mut rng)
            .unwrap()
            .assignment
            .clone();

        assert_eq!(
            session.assign_roles(UnbalancedPolicy::Abort, &mut rng),
            Err(SessionError::Engine(EngineError::Unbalanced { participants: 8 }))
        );
        assert_eq!(session.assignment(), Some(&first));
    }

    #[test]
    fn test_lock_requires_known_participant_and_role() {
        let (mut session, players) = session_with(2);
        assert!(matches!(
            session.lock_role(&players[0], "WIZARD"),
            Err(SessionError::Role(RoleError::UnknownRole { .. }))
        ));

        let stranger = ParticipantId::from("player_999");
        assert_eq!(
            session.lock_role(&stranger, ids::SEER),
            Err(SessionError::Roster(RosterError::UnknownParticipant(stranger.clone())))
        );

        session.lock_role(&players[1], ids::SEER).unwrap();
        assert_eq!(session.unlock_role(&players[1]), Some(RoleId::from("SEER")));
        assert!(session.locks().is_empty());
    }

    #[test]
    fn test_remove_participant_drops_lock() {
        let (mut session, players) = session_with(3);
        session.lock_role(&players[2], ids::WITCH).unwrap();
        let removed = session.remove_participant(&players[2]).unwrap();
        assert_eq!(removed.name, "Chloé");
        assert!(session.locks().is_empty());
        assert_eq!(session.roster().len(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut session, players) = session_with(8);
        session.lock_role(&players[0], ids::HUNTER).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        session
            .assign_roles(UnbalancedPolicy::Proceed, &mut rng)
            .unwrap();

        session.reset();
        assert!(session.roster().is_empty());
        assert!(session.locks().is_empty());
        assert!(session.assignment().is_none());
        assert!(session.reveal().unwrap().is_empty());
    }
}
