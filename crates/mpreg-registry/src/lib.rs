//! Marketplace registry engine.
//!
//! The engine is split in two halves so the logic can be replaced without
//! touching accumulated data:
//! - `RegistryState`: the durable storage object, owned by whoever hosts it
//! - `RegistryLogic`: a stateless strategy operating on that storage
//!
//! `MarketplaceRegistry` is the reference logic module. `RegistryCall` is the
//! forwarded call surface a host dispatches into whichever module is current.

pub mod call;
pub mod error;
pub mod logic;
pub mod marketplace;
pub mod state;

pub use call::{CallOutput, RegistryCall};
pub use error::{RegistryError, RegistryResult, Role};
pub use logic::{CallContext, RegistryLogic};
pub use marketplace::MarketplaceRegistry;
pub use state::RegistryState;
