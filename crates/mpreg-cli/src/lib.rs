//! Operator application for the upgradeable marketplace registry.
//!
//! Wires the gateway to its persisted state:
//! - configuration (TOML) naming the snapshot file, audit directory and
//!   the logic deployments available for `init`/`upgrade`
//! - snapshot load/save around every state-changing command
//! - audit log of every committed event

pub mod app;
pub mod cli;
pub mod config;
pub mod error;

pub use app::{Application, CommandOutput};
pub use cli::{Cli, Command, FieldArgs, PolicyAction};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
