//! Single-flight assignment runs.
//!
//! An [`Engine`] chains planning, the balance check and the deal. It is
//! either Idle or Running; a run started while another holds the gate is
//! rejected with [`EngineError::AssignmentInProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::assign::{assign_with_rng, Assignment, LockSet};
use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::planner::{compute_distribution, evaluate_balance, BalanceVerdict, Distribution};
use crate::roster::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// What to do when the planned mix fails the balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnbalancedPolicy {
    #[default]
    Abort,
    Proceed,
}

/// A distribution together with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub distribution: Distribution,
    pub verdict: BalanceVerdict,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    pub plan: Plan,
    pub assignment: Assignment,
}

#[derive(Debug)]
pub struct Engine {
    catalog: Arc<Catalog>,
    running: AtomicBool,
}

/// Holds the gate in the Running state until dropped.
#[derive(Debug)]
pub struct RunTicket<'a> {
    engine: &'a Engine,
}

impl Drop for RunTicket<'_> {
    fn drop(&mut self) {
        self.engine.running.store(false, Ordering::Release);
    }
}

impl Engine {
    /// Fails when the catalog lacks a role every plan needs.
    pub fn new(catalog: Arc<Catalog>) -> Result<Self, EngineError> {
        catalog.check_integrity()?;
        Ok(Engine {
            catalog,
            running: AtomicBool::new(false),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Moves Idle -> Running.
    pub fn begin(&self) -> Result<RunTicket<'_>, EngineError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::AssignmentInProgress)?;
        Ok(RunTicket { engine: self })
    }

    pub fn plan(&self, participant_count: usize) -> Result<Plan, EngineError> {
        let distribution = compute_distribution(&self.catalog, participant_count)?;
        let verdict = evaluate_balance(&self.catalog, &distribution);
        Ok(Plan {
            distribution,
            verdict,
        })
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        participants: &[ParticipantId],
        locks: &LockSet,
        policy: UnbalancedPolicy,
        rng: &mut R,
    ) -> Result<Deal, EngineError> {
        let _ticket = self.begin()?;

        let plan = self.plan(participants.len())?;
        if !plan.verdict.is_balanced {
            warn!(
                participants = participants.len(),
                metrics = ?plan.verdict.metrics,
                "unbalanced role distribution"
            );
            if policy == UnbalancedPolicy::Abort {
                return Err(EngineError::Unbalanced {
                    participants: participants.len(),
                });
            }
        }

        let assignment = assign_with_rng(participants, locks, &plan.distribution, rng);
        info!(
            participants = participants.len(),
            locked = locks.len(),
            dealt = assignment.len(),
            "roles assigned"
        );
        Ok(Deal { plan, assignment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ids, RoleId};
    use crate::error::PlanError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> Engine {
        Engine::new(Arc::new(Catalog::standard())).unwrap()
    }

    fn players(count: usize) -> Vec<ParticipantId> {
        (1..=count)
            .map(|n| ParticipantId::from(format!("player_{:03}", n)))
            .collect()
    }

    #[test]
    fn test_gate_rejects_second_run() {
        let engine = engine();
        assert_eq!(engine.state(), RunState::Idle);

        let ticket = engine.begin().unwrap();
        assert_eq!(engine.state(), RunState::Running);
        assert!(matches!(
            engine.begin(),
            Err(EngineError::AssignmentInProgress)
        ));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            engine.run(&players(8), &LockSet::new(), UnbalancedPolicy::Proceed, &mut rng),
            Err(EngineError::AssignmentInProgress)
        );

        drop(ticket);
        assert_eq!(engine.state(), RunState::Idle);
        assert!(engine
            .run(&players(8), &LockSet::new(), UnbalancedPolicy::Proceed, &mut rng)
            .is_ok());
    }

    #[test]
    fn test_gate_released_after_failed_run() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            engine.run(&players(7), &LockSet::new(), UnbalancedPolicy::Proceed, &mut rng),
            Err(EngineError::Plan(PlanError::InvalidParticipantCount {
                count: 7,
                min: 8,
                max: 20
            }))
        );
        assert_eq!(engine.state(), RunState::Idle);
    }

    #[test]
    fn test_new_rejects_incomplete_catalog() {
        let roles = Catalog::standard()
            .roles()
            .iter()
            .filter(|role| role.id != ids::SEER)
            .cloned()
            .collect();
        let catalog = Catalog::from_roles(roles).unwrap();
        assert!(matches!(
            Engine::new(Arc::new(catalog)),
            Err(EngineError::Plan(PlanError::MissingMandatoryRole(id))) if id == "SEER"
        ));
    }

    #[test]
    fn test_abort_policy_stops_unbalanced_run() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            engine.run(&players(8), &LockSet::new(), UnbalancedPolicy::Abort, &mut rng),
            Err(EngineError::Unbalanced { participants: 8 })
        );
    }

    #[test]
    fn test_run_deals_every_participant() {
        let engine = engine();
        let everyone = players(12);
        let locks: LockSet = [(everyone[3].clone(), RoleId::from(ids::BEAR))]
            .into_iter()
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        let deal = engine
            .run(&everyone, &locks, UnbalancedPolicy::Proceed, &mut rng)
            .unwrap();
        assert_eq!(deal.assignment.len(), 12);
        assert_eq!(deal.assignment.get(&everyone[3]).unwrap(), "BEAR");
        assert_eq!(deal.plan.distribution.total(), 12);
        let counts = deal.assignment.role_counts();
        for (role, quantity) in deal.plan.distribution.iter() {
            assert_eq!(counts[role], quantity);
        }
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|seed| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    engine.run(&players(10), &LockSet::new(), UnbalancedPolicy::Proceed, &mut rng)
                })
            })
            .collect();

        for handle in handles {
            match handle.join().unwrap() {
                Ok(deal) => assert_eq!(deal.assignment.len(), 10),
                Err(err) => assert_eq!(err, EngineError::AssignmentInProgress),
            }
        }
        assert_eq!(engine.state(), RunState::Idle);
    }
}
