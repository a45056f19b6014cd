//! Gateway error types.

use mpreg_core::{Address, LogicHandle};
use mpreg_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Gateway already initialized")]
    AlreadyInitialized,

    #[error("Gateway not initialized")]
    NotInitialized,

    #[error("Unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Address },

    #[error("Invalid implementation: {0}")]
    InvalidImplementation(LogicHandle),

    #[error("Invalid owner: {0}")]
    InvalidOwner(Address),

    #[error("Snapshot rejected: {0}")]
    SnapshotRejected(String),

    #[error("Unexpected output from {op}")]
    UnexpectedOutput { op: &'static str },

    /// Failure raised by the logic module, passed through unchanged.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl GatewayError {
    /// Stable kind label (metrics, logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::NotInitialized => "not_initialized",
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidImplementation(_) => "invalid_implementation",
            Self::InvalidOwner(_) => "invalid_owner",
            Self::SnapshotRejected(_) => "snapshot_rejected",
            Self::UnexpectedOutput { .. } => "unexpected_output",
            Self::Registry(e) => e.kind(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
