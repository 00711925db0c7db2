use thiserror::Error;

use crate::{AgentId, Key, ValueKind};

/// Errors raised while running behaviors or planning.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum BehaviorError {
    /// Structural misuse, e.g. starting a node that is already active.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("symbol {key:?} is not defined")]
    MissingSymbol { key: Key },
    #[error("no plan satisfies goal {goal:?}")]
    NoPlanFound { goal: String },
    #[error("symbol {key:?} holds {found}, expected {expected}")]
    TypeMismatch {
        key: Key,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("host does not know agent {0}")]
    UnknownAgent(AgentId),
}

/// Fieldless view of [`BehaviorError`] for matching on the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidOperation,
    MissingSymbol,
    NoPlanFound,
    TypeMismatch,
    UnknownAgent,
}

impl BehaviorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::MissingSymbol { .. } => ErrorKind::MissingSymbol,
            Self::NoPlanFound { .. } => ErrorKind::NoPlanFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UnknownAgent(_) => ErrorKind::UnknownAgent,
        }
    }

    /// Data errors turn into a `Failure` status; everything else is a programming error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingSymbol | ErrorKind::TypeMismatch | ErrorKind::UnknownAgent
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

pub type Result<T, E = BehaviorError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AddChildError {
    #[error("Attempted to add too many nodes")]
    TooManyNodes,
}

pub type AddChildResult = Result<(), AddChildError>;

impl From<AddChildError> for BehaviorError {
    fn from(err: AddChildError) -> Self {
        Self::InvalidOperation(err.to_string())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Action {0:?} is not defined in the domain")]
    UnknownAction(String),
    #[error("Goal {0:?} is not defined in the domain")]
    UnknownGoal(String),
    #[error("Action {name:?} is invalid: {reason}")]
    InvalidAction { name: String, reason: String },
}
