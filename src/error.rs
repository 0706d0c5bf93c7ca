use std::path::PathBuf;

use crate::catalog::RoleId;
use crate::roster::ParticipantId;

/// Lookup failures against the role catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("unknown role: '{id}'{}", format_suggestions(.suggestions))]
    UnknownRole { id: String, suggestions: Vec<RoleId> },
}

fn format_suggestions(suggestions: &[RoleId]) -> String {
    match suggestions {
        [] => String::new(),
        [only] => format!(" (did you mean {}?)", only),
        many => {
            let names: Vec<&str> = many.iter().map(RoleId::as_str).collect();
            format!(" (did you mean one of: {}?)", names.join(", "))
        }
    }
}

/// Planner failures.
///
/// `InvalidParticipantCount` is the only one a user can fix; the other two
/// mean the catalog or the planner itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("participant count must be between {min} and {max}, got {count}")]
    InvalidParticipantCount { count: usize, min: usize, max: usize },

    #[error("mandatory role missing from catalog: {0}")]
    MissingMandatoryRole(RoleId),

    #[error("distribution error: {total} roles planned for {expected} participants")]
    DistributionMismatch { total: usize, expected: usize },
}

/// Failures while loading or validating a catalog configuration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("role '{0}' is defined more than once")]
    DuplicateRole(RoleId),

    #[error("scaling table of role '{0}' is empty or starts below its minimum participant count")]
    UnorderedScaling(RoleId),
}

/// Failures of the run gate and the planning steps an engine run performs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("role assignment already in progress")]
    AssignmentInProgress,

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("role distribution for {participants} participants is not balanced")]
    Unbalanced { participants: usize },
}

/// Roster edits rejected by the roster rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("participant name must not be empty")]
    EmptyName,

    #[error("participant name must not exceed {max} characters")]
    NameTooLong { max: usize },

    #[error("participant '{0}' already exists")]
    DuplicateName(String),

    #[error("roster is full ({max} participants)")]
    RosterFull { max: usize },

    #[error("no participant with id {0}")]
    UnknownParticipant(ParticipantId),

    #[error("at least {min} participants are needed to start a game, have {count}")]
    TooFewParticipants { count: usize, min: usize },
}

/// Errors surfaced by [`crate::session::GameSession`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_message_lists_suggestions() {
        let none = RoleError::UnknownRole {
            id: "SEERR".to_string(),
            suggestions: vec![],
        };
        assert_eq!(none.to_string(), "unknown role: 'SEERR'");

        let one = RoleError::UnknownRole {
            id: "SEERR".to_string(),
            suggestions: vec![RoleId::from("SEER")],
        };
        assert_eq!(one.to_string(), "unknown role: 'SEERR' (did you mean SEER?)");

        let two = RoleError::UnknownRole {
            id: "BAR".to_string(),
            suggestions: vec![RoleId::from("BARBIE"), RoleId::from("BEAR")],
        };
        assert_eq!(
            two.to_string(),
            "unknown role: 'BAR' (did you mean one of: BARBIE, BEAR?)"
        );
    }

    #[test]
    fn test_invalid_count_message_carries_range() {
        let err = PlanError::InvalidParticipantCount {
            count: 21,
            min: 8,
            max: 20,
        };
        assert_eq!(
            err.to_string(),
            "participant count must be between 8 and 20, got 21"
        );
    }
}
