//! Core types for the upgradeable marketplace registry.
//!
//! This crate provides the vocabulary shared by every layer:
//! - `MarketplaceId`: caller-supplied 32-byte record key
//! - `LogicHandle`: address of a deployed logic module
//! - `MarketplaceRecord`, `MarketplaceFields`: stored record and its mutable inputs
//! - `Event`, `Receipt`: audit events and the "value + emitted events" call result

pub mod error;
pub mod event;
pub mod identity;
pub mod record;

pub use alloy_primitives::{Address, B256};
pub use error::{CoreError, Result};
pub use event::{Event, EventEnvelope, GatewayEvent, Receipt, RegistryEvent};
pub use identity::{parse_address, LogicHandle, MarketplaceId, MARKETPLACE_ID_LEN};
pub use record::{MarketplaceFields, MarketplaceRecord};
