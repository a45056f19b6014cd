//! Registry error types.

use mpreg_core::{Address, MarketplaceId};
use std::fmt;
use thiserror::Error;

/// Role a gated operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The global owner.
    Owner,
    /// The per-record admin.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "marketplace admin"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry is paused")]
    Paused,

    #[error("Registry is not paused")]
    NotPaused,

    #[error("Unauthorized: {caller} is not the {role}")]
    Unauthorized { caller: Address, role: Role },

    #[error("Marketplace already exists: {0}")]
    DuplicateId(MarketplaceId),

    #[error("Marketplace not found: {0}")]
    NotFound(MarketplaceId),

    #[error("Invalid field: {0} must not be empty")]
    InvalidField(&'static str),

    #[error("Index out of range: {index} >= {count}")]
    IndexOutOfRange { index: u64, count: u64 },

    #[error("Not a read-only call: {0}")]
    NotReadOnly(&'static str),

    /// Loaded storage violates the map/sequence invariants.
    #[error("Storage invalid: {0}")]
    StorageInvalid(String),
}

impl RegistryError {
    /// Stable kind label (metrics, logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::NotPaused => "not_paused",
            Self::Unauthorized { .. } => "unauthorized",
            Self::DuplicateId(_) => "duplicate_id",
            Self::NotFound(_) => "not_found",
            Self::InvalidField(_) => "invalid_field",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::NotReadOnly(_) => "not_read_only",
            Self::StorageInvalid(_) => "storage_invalid",
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
