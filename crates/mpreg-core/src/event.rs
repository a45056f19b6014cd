//! Audit events and call receipts.
//!
//! Every committed state change produces exactly one event. Events travel
//! back to the caller inside a [`Receipt`] and are republished to off-system
//! observers wrapped in an [`EventEnvelope`].

use crate::identity::{LogicHandle, MarketplaceId};
use alloy_primitives::Address;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events emitted by the registry logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    #[serde(rename = "LogCreateMarketplace")]
    MarketplaceCreated { id: MarketplaceId },
    #[serde(rename = "LogUpdateMarketplace")]
    MarketplaceUpdated { id: MarketplaceId },
    #[serde(rename = "LogApproveMarketplace")]
    MarketplaceApproved { id: MarketplaceId },
    #[serde(rename = "LogRejectMarketplace")]
    MarketplaceRejected { id: MarketplaceId },
    #[serde(rename = "LogChangeApprovalPolicy")]
    ApprovalPolicyChanged { active: bool },
    #[serde(rename = "Pause")]
    Paused { by: Address },
    #[serde(rename = "Unpause")]
    Unpaused { by: Address },
}

impl RegistryEvent {
    /// Log name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MarketplaceCreated { .. } => "LogCreateMarketplace",
            Self::MarketplaceUpdated { .. } => "LogUpdateMarketplace",
            Self::MarketplaceApproved { .. } => "LogApproveMarketplace",
            Self::MarketplaceRejected { .. } => "LogRejectMarketplace",
            Self::ApprovalPolicyChanged { .. } => "LogChangeApprovalPolicy",
            Self::Paused { .. } => "Pause",
            Self::Unpaused { .. } => "Unpause",
        }
    }

    /// Marketplace the event refers to, if any.
    pub fn marketplace_id(&self) -> Option<MarketplaceId> {
        match self {
            Self::MarketplaceCreated { id }
            | Self::MarketplaceUpdated { id }
            | Self::MarketplaceApproved { id }
            | Self::MarketplaceRejected { id } => Some(*id),
            _ => None,
        }
    }
}

/// Events emitted by the gateway itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayEvent {
    Initialized {
        owner: Address,
        implementation: LogicHandle,
    },
    Upgraded {
        previous: LogicHandle,
        implementation: LogicHandle,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl GatewayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "Initialized",
            Self::Upgraded { .. } => "Upgraded",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// Any event observable at the gateway address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Gateway(GatewayEvent),
    Registry(RegistryEvent),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gateway(e) => e.name(),
            Self::Registry(e) => e.name(),
        }
    }
}

impl From<GatewayEvent> for Event {
    fn from(event: GatewayEvent) -> Self {
        Self::Gateway(event)
    }
}

impl From<RegistryEvent> for Event {
    fn from(event: RegistryEvent) -> Self {
        Self::Registry(event)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => match e.marketplace_id() {
                Some(id) => write!(f, "{}({})", e.name(), id),
                None => write!(f, "{}", e.name()),
            },
            Self::Gateway(e) => write!(f, "{}", e.name()),
        }
    }
}

/// Result of a call: the returned value plus the events it emitted.
///
/// Reads carry no events; successful state changes carry exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
    pub value: T,
    pub events: Vec<Event>,
}

impl<T> Receipt<T> {
    /// Receipt without events (reads).
    pub fn new(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    /// Receipt carrying a single event.
    pub fn with_event(value: T, event: impl Into<Event>) -> Self {
        Self {
            value,
            events: vec![event.into()],
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Receipt<U> {
        Receipt {
            value: f(self.value),
            events: self.events,
        }
    }

    /// Names of the emitted events, in emission order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(Event::name).collect()
    }
}

/// Committed event as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Monotonic sequence number at the gateway (starts at 1).
    pub sequence: u64,
    /// Identity whose call emitted the event.
    pub caller: Address,
    /// Commit time (Unix milliseconds).
    pub timestamp_ms: i64,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(sequence: u64, caller: Address, event: Event) -> Self {
        Self {
            sequence,
            caller,
            timestamp_ms: Utc::now().timestamp_millis(),
            event,
        }
    }
}
