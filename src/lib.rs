//! Role planning and secret role dealing for Werewolf party games.
//!
//! Data flows one way: a participant count becomes a [`Distribution`]
//! ([`compute_distribution`]), which is judged by [`evaluate_balance`] and
//! dealt to participants by [`assign`], honoring any role locks. The
//! [`Catalog`] is read-only and passed in by reference.

pub mod assign;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod planner;
pub mod roster;
pub mod session;
pub mod telemetry;

pub use assign::{assign, assign_with_rng, Assignment, LockSet};
pub use catalog::{ids, Catalog, Role, RoleId, Team};
pub use engine::{Deal, Engine, Plan, RunState, RunTicket, UnbalancedPolicy};
pub use error::{CatalogError, EngineError, PlanError, RoleError, RosterError, SessionError};
pub use planner::{
    compute_distribution, evaluate_balance, BalanceMetrics, BalanceVerdict, Distribution,
    MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};
pub use roster::{Participant, ParticipantId, Roster};
pub use session::{GameSession, RevealedRole};
