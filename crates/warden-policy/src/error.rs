use std::fmt;

use thiserror::Error;
use warden_core::{CommandName, RestrictionId};

use crate::types::GroupPath;

/// Why a restriction group was rejected at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinationFault {
    /// Two or more members and no combining policy to merge them.
    MissingPolicy {
        restrictions: Vec<RestrictionId>,
        nested_groups: usize,
    },
    /// The same restriction declared twice in one group.
    DuplicateRestriction { restriction: RestrictionId },
}

impl fmt::Display for CombinationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationFault::MissingPolicy {
                restrictions,
                nested_groups,
            } => {
                let names: Vec<&str> = restrictions.iter().map(|r| r.as_str()).collect();
                write!(
                    f,
                    "restrictions [{}] and {} nested group(s) declared without a combining policy",
                    names.join(", "),
                    nested_groups
                )
            }
            CombinationFault::DuplicateRestriction { restriction } => {
                write!(f, "restriction '{}' declared more than once", restriction)
            }
        }
    }
}

/// A command's restriction declarations cannot be turned into an
/// unambiguous policy. Fatal for that command: it must not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid restriction combination on command '{command}' in group {group}: {fault}")]
pub struct InvalidCombinationError {
    pub command: CommandName,
    pub group: GroupPath,
    pub fault: CombinationFault,
}

/// Single error enum for registration and evaluation.
///
/// Predicate failures during evaluation are not represented here: they
/// deny the invocation instead of surfacing as errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    InvalidCombination(#[from] InvalidCombinationError),

    #[error("restriction '{0}' is already registered")]
    DuplicateRestriction(RestrictionId),

    #[error("command '{command}' references unknown restriction '{restriction}'")]
    UnknownRestriction {
        command: CommandName,
        restriction: RestrictionId,
    },

    #[error("command '{0}' is already registered")]
    DuplicateCommand(CommandName),

    #[error("command '{0}' is not registered")]
    UnknownCommand(CommandName),

    #[error("audit sink error: {0}")]
    AuditSinkError(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
