//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown deployment: {0}")]
    UnknownDeployment(String),

    #[error("No deployment configured for implementation {0}")]
    UnresolvedImplementation(String),

    #[error(transparent)]
    Gateway(#[from] mpreg_gateway::GatewayError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mpreg_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] mpreg_persistence::PersistenceError),

    #[error("Invalid input: {0}")]
    Input(#[from] mpreg_core::CoreError),
}

impl AppError {
    /// Stable kind label (metrics, logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::UnknownDeployment(_) => "unknown_deployment",
            Self::UnresolvedImplementation(_) => "unresolved_implementation",
            Self::Gateway(e) => e.kind(),
            Self::Telemetry(_) => "telemetry",
            Self::Persistence(_) => "persistence",
            Self::Input(_) => "input",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
