//! Gateway: stable entry point, owner-only upgrades, default forwarding.

use crate::client::MarketplaceClient;
use crate::error::{GatewayError, GatewayResult};
use crate::snapshot::GatewaySnapshot;
use mpreg_core::{Address, Event, EventEnvelope, GatewayEvent, LogicHandle, Receipt};
use mpreg_registry::{CallContext, CallOutput, RegistryCall, RegistryLogic, RegistryState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Buffered events per observer before the slowest one starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Current logic module and owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicReference {
    pub implementation: LogicHandle,
    pub owner: Address,
}

/// Reference plus the module it resolves to.
struct Installed {
    reference: LogicReference,
    logic: Arc<dyn RegistryLogic>,
}

/// Upgrade gateway.
///
/// Created uninitialized; [`Gateway::initialize`] binds the first logic
/// module and makes the caller owner. Calls execute one at a time through
/// `&mut self`, so every call observes the effects of all earlier ones.
pub struct Gateway {
    installed: Option<Installed>,
    state: RegistryState,
    sequence: u64,
    events_tx: broadcast::Sender<EventEnvelope>,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("reference", &self.installed.as_ref().map(|i| i.reference))
            .field("marketplaces", &self.state.count())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Gateway {
    /// Uninitialized gateway with empty storage.
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            installed: None,
            state: RegistryState::new(),
            sequence: 0,
            events_tx,
        }
    }

    /// Rebuild a gateway from persisted state.
    ///
    /// `logic` must be the module the snapshot was taken with; pointing a
    /// snapshot at a different module is an upgrade and goes through
    /// [`Gateway::upgrade_implementation`].
    pub fn restore(snapshot: GatewaySnapshot, logic: Arc<dyn RegistryLogic>) -> GatewayResult<Self> {
        let GatewaySnapshot {
            reference,
            state,
            sequence,
        } = snapshot;
        if logic.handle() != reference.implementation {
            return Err(GatewayError::SnapshotRejected(format!(
                "snapshot implementation {} but module is {}",
                reference.implementation,
                logic.handle()
            )));
        }
        if reference.implementation.is_null() {
            return Err(GatewayError::SnapshotRejected("null implementation".to_string()));
        }
        if reference.owner == Address::ZERO {
            return Err(GatewayError::SnapshotRejected("null owner".to_string()));
        }
        state
            .verify()
            .map_err(|e| GatewayError::SnapshotRejected(e.to_string()))?;

        info!(
            implementation = %reference.implementation,
            owner = %reference.owner,
            marketplaces = state.count(),
            sequence,
            "Gateway restored"
        );

        let mut gateway = Self::new();
        gateway.installed = Some(Installed { reference, logic });
        gateway.state = state;
        gateway.sequence = sequence;
        Ok(gateway)
    }

    /// Persistable form of the gateway.
    pub fn snapshot(&self) -> GatewayResult<GatewaySnapshot> {
        let installed = self.installed()?;
        Ok(GatewaySnapshot {
            reference: installed.reference,
            state: self.state.clone(),
            sequence: self.sequence,
        })
    }

    // ------------------------------------------------------------------
    // Management calls
    // ------------------------------------------------------------------

    /// One-time setup: `caller` becomes owner and `logic` the implementation.
    pub fn initialize(
        &mut self,
        caller: Address,
        logic: Arc<dyn RegistryLogic>,
    ) -> GatewayResult<Receipt<()>> {
        if self.installed.is_some() {
            warn!(%caller, "initialize rejected: already initialized");
            return Err(GatewayError::AlreadyInitialized);
        }
        let implementation = logic.handle();
        if implementation.is_null() {
            return Err(GatewayError::InvalidImplementation(implementation));
        }
        if caller == Address::ZERO {
            return Err(GatewayError::InvalidOwner(caller));
        }

        self.installed = Some(Installed {
            reference: LogicReference {
                implementation,
                owner: caller,
            },
            logic,
        });
        info!(owner = %caller, %implementation, "Gateway initialized");

        Ok(self.commit(
            caller,
            (),
            GatewayEvent::Initialized {
                owner: caller,
                implementation,
            },
        ))
    }

    /// Point the gateway at a new logic module. Owner only.
    ///
    /// Storage is untouched; the new module must read it the way the
    /// previous one wrote it.
    pub fn upgrade_implementation(
        &mut self,
        caller: Address,
        logic: Arc<dyn RegistryLogic>,
    ) -> GatewayResult<Receipt<()>> {
        let installed = self.installed_mut()?;
        if caller != installed.reference.owner {
            warn!(%caller, "upgradeImplementation rejected: not owner");
            return Err(GatewayError::Unauthorized { caller });
        }
        let implementation = logic.handle();
        if implementation.is_null() {
            return Err(GatewayError::InvalidImplementation(implementation));
        }

        let previous = installed.reference.implementation;
        installed.reference.implementation = implementation;
        installed.logic = logic;
        info!(%previous, %implementation, "Implementation upgraded");

        Ok(self.commit(
            caller,
            (),
            GatewayEvent::Upgraded {
                previous,
                implementation,
            },
        ))
    }

    /// Hand ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> GatewayResult<Receipt<()>> {
        let installed = self.installed_mut()?;
        if caller != installed.reference.owner {
            warn!(%caller, "transferOwnership rejected: not owner");
            return Err(GatewayError::Unauthorized { caller });
        }
        if new_owner == Address::ZERO {
            return Err(GatewayError::InvalidOwner(new_owner));
        }

        installed.reference.owner = new_owner;
        info!(previous_owner = %caller, %new_owner, "Ownership transferred");

        Ok(self.commit(
            caller,
            (),
            GatewayEvent::OwnershipTransferred {
                previous_owner: caller,
                new_owner,
            },
        ))
    }

    /// Handle of the current logic module.
    pub fn implementation(&self) -> GatewayResult<LogicHandle> {
        Ok(self.installed()?.reference.implementation)
    }

    /// Current owner.
    pub fn owner(&self) -> GatewayResult<Address> {
        Ok(self.installed()?.reference.owner)
    }

    /// Version string reported by the current logic module.
    pub fn logic_version(&self) -> GatewayResult<String> {
        Ok(self.installed()?.logic.version().to_string())
    }

    // ------------------------------------------------------------------
    // Forwarding
    // ------------------------------------------------------------------

    /// Forward a registry call to the current logic module.
    ///
    /// The module runs against the gateway's storage; its result is
    /// returned unchanged. Events are published only if the call succeeds.
    pub fn forward(
        &mut self,
        caller: Address,
        call: RegistryCall,
    ) -> GatewayResult<Receipt<CallOutput>> {
        let installed = self.installed.as_ref().ok_or(GatewayError::NotInitialized)?;
        let ctx = CallContext::new(caller, installed.reference.owner);
        let logic = Arc::clone(&installed.logic);
        let op = call.name();

        match call.execute(logic.as_ref(), &ctx, &mut self.state) {
            Ok(receipt) => {
                trace!(op, %caller, events = receipt.events.len(), "Call forwarded");
                self.publish(caller, &receipt.events);
                Ok(receipt)
            }
            Err(e) => {
                warn!(op, %caller, kind = e.kind(), error = %e, "Call rejected");
                Err(e.into())
            }
        }
    }

    /// Typed view of the registry interface at this gateway.
    pub fn marketplace(&mut self) -> MarketplaceClient<'_> {
        MarketplaceClient::new(self)
    }

    /// Receive every event committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events_tx.subscribe()
    }

    /// Read-only view of storage.
    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    /// Sequence number of the last published event (0 if none).
    pub fn last_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_initialized(&self) -> bool {
        self.installed.is_some()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn installed(&self) -> GatewayResult<&Installed> {
        self.installed.as_ref().ok_or(GatewayError::NotInitialized)
    }

    fn installed_mut(&mut self) -> GatewayResult<&mut Installed> {
        self.installed.as_mut().ok_or(GatewayError::NotInitialized)
    }

    fn commit<T>(&mut self, caller: Address, value: T, event: GatewayEvent) -> Receipt<T> {
        let receipt = Receipt::with_event(value, event);
        self.publish(caller, &receipt.events);
        receipt
    }

    fn publish(&mut self, caller: Address, events: &[Event]) {
        for event in events {
            self.sequence += 1;
            let envelope = EventEnvelope::new(self.sequence, caller, event.clone());
            // No receivers is normal when nobody is observing.
            match self.events_tx.send(envelope) {
                Ok(n) => trace!(receivers = n, event = %event, "Event published"),
                Err(_) => debug!(event = %event, "Event published without observers"),
            }
        }
    }
}
