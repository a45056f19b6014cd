//! Persistence for the marketplace registry.
//!
//! - `AuditLogWriter`: committed events as daily JSON Lines files
//! - `SnapshotStore`: gateway state as a single JSON document, replaced atomically

pub mod audit;
pub mod error;
pub mod snapshot;

pub use audit::{read_audit_log, AuditLogWriter};
pub use error::{PersistenceError, PersistenceResult};
pub use snapshot::SnapshotStore;
