//! Persistable gateway state.

use crate::gateway::LogicReference;
use mpreg_registry::RegistryState;
use serde::{Deserialize, Serialize};

/// Everything a gateway needs to resume: the logic reference, storage and
/// the last published event sequence.
///
/// Observers are process-local and are not included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub reference: LogicReference,
    pub state: RegistryState,
    /// Sequence of the last event published before the snapshot was taken.
    #[serde(default)]
    pub sequence: u64,
}
