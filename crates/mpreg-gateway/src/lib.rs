//! Upgrade gateway for the marketplace registry.
//!
//! The gateway is the one stable entry point callers talk to. It holds:
//! - `LogicReference`: the current logic module's handle and the owner
//! - the `RegistryState` every logic module executes against
//!
//! Management calls (initialize, upgrade, ownership) are handled here;
//! everything else is forwarded to the current logic module unchanged.
//! Because storage lives in the gateway, replacing the module keeps all
//! accumulated records.

pub mod client;
pub mod error;
pub mod gateway;
pub mod snapshot;

pub use client::MarketplaceClient;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, LogicReference, EVENT_CHANNEL_CAPACITY};
pub use snapshot::GatewaySnapshot;
