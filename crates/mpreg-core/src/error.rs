//! Error types for mpreg-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid marketplace id: {0}")]
    InvalidMarketplaceId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
