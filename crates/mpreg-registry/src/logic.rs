//! Replaceable registry logic.

use crate::error::RegistryResult;
use crate::state::RegistryState;
use mpreg_core::{
    Address, LogicHandle, MarketplaceFields, MarketplaceId, MarketplaceRecord, RegistryEvent,
};

/// Per-call execution context supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Identity making the call.
    pub caller: Address,
    /// Current global owner.
    pub owner: Address,
}

impl CallContext {
    pub fn new(caller: Address, owner: Address) -> Self {
        Self { caller, owner }
    }

    pub fn caller_is_owner(&self) -> bool {
        self.caller == self.owner
    }
}

/// Registry business rules, executed against host-owned storage.
///
/// Implementations hold no registry data of their own; everything they read
/// or write goes through the `RegistryState` handed in by the host, so a
/// host can swap implementations without losing records. A replacement must
/// keep reading the storage the way the previous module wrote it.
///
/// Every state-changing method either returns the single event describing
/// the committed change, or an error with the storage left untouched.
pub trait RegistryLogic: Send + Sync {
    /// Address this module is deployed at.
    fn handle(&self) -> LogicHandle;

    /// Human-readable module version.
    fn version(&self) -> &str;

    fn create_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
        fields: MarketplaceFields,
    ) -> RegistryResult<RegistryEvent>;

    fn update_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
        fields: MarketplaceFields,
        new_admin: Address,
    ) -> RegistryResult<RegistryEvent>;

    fn approve_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<RegistryEvent>;

    fn reject_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<RegistryEvent>;

    fn activate_approval_policy(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<RegistryEvent>;

    fn deactivate_approval_policy(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<RegistryEvent>;

    fn pause(&self, ctx: &CallContext, state: &mut RegistryState) -> RegistryResult<RegistryEvent>;

    fn unpause(&self, ctx: &CallContext, state: &mut RegistryState)
        -> RegistryResult<RegistryEvent>;

    fn get_marketplace(
        &self,
        state: &RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<MarketplaceRecord>;

    fn get_marketplace_id(&self, state: &RegistryState, index: u64)
        -> RegistryResult<MarketplaceId>;

    fn marketplaces_count(&self, state: &RegistryState) -> u64;

    fn is_approval_policy_active(&self, state: &RegistryState) -> bool;

    fn is_paused(&self, state: &RegistryState) -> bool;
}
