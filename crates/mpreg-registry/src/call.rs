//! Forwarded call surface.
//!
//! A host does not know registry semantics; it receives a `RegistryCall`,
//! hands it to whichever logic module is current and returns the result
//! unchanged.

use crate::error::{RegistryError, RegistryResult};
use crate::logic::{CallContext, RegistryLogic};
use crate::state::RegistryState;
use mpreg_core::{Address, MarketplaceFields, MarketplaceId, MarketplaceRecord, Receipt};
use serde::{Deserialize, Serialize};

/// One registry operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RegistryCall {
    CreateMarketplace {
        id: MarketplaceId,
        fields: MarketplaceFields,
    },
    UpdateMarketplace {
        id: MarketplaceId,
        fields: MarketplaceFields,
        new_admin: Address,
    },
    ApproveMarketplace {
        id: MarketplaceId,
    },
    RejectMarketplace {
        id: MarketplaceId,
    },
    ActivateApprovalPolicy,
    DeactivateApprovalPolicy,
    Pause,
    Unpause,
    GetMarketplace {
        id: MarketplaceId,
    },
    GetMarketplaceId {
        index: u64,
    },
    MarketplacesCount,
    IsApprovalPolicyActive,
    IsPaused,
}

/// Value returned by a registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CallOutput {
    Unit,
    Marketplace(MarketplaceRecord),
    MarketplaceId(MarketplaceId),
    Count(u64),
    Flag(bool),
}

impl CallOutput {
    pub fn into_marketplace(self) -> Option<MarketplaceRecord> {
        match self {
            Self::Marketplace(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_marketplace_id(&self) -> Option<MarketplaceId> {
        match self {
            Self::MarketplaceId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl RegistryCall {
    /// Operation name as exposed at the gateway.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateMarketplace { .. } => "createMarketplace",
            Self::UpdateMarketplace { .. } => "updateMarketplace",
            Self::ApproveMarketplace { .. } => "approveMarketplace",
            Self::RejectMarketplace { .. } => "rejectMarketplace",
            Self::ActivateApprovalPolicy => "activateApprovalPolicy",
            Self::DeactivateApprovalPolicy => "deactivateApprovalPolicy",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::GetMarketplace { .. } => "getMarketplace",
            Self::GetMarketplaceId { .. } => "getMarketplaceId",
            Self::MarketplacesCount => "marketplacesCount",
            Self::IsApprovalPolicyActive => "isApprovalPolicyActive",
            Self::IsPaused => "isPaused",
        }
    }

    /// Whether the call only reads storage.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::GetMarketplace { .. }
                | Self::GetMarketplaceId { .. }
                | Self::MarketplacesCount
                | Self::IsApprovalPolicyActive
                | Self::IsPaused
        )
    }

    /// Run the call on `logic` against `state`.
    ///
    /// Writes return a receipt with exactly one event; reads return none.
    pub fn execute(
        self,
        logic: &dyn RegistryLogic,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<Receipt<CallOutput>> {
        let event = match self {
            Self::CreateMarketplace { id, fields } => {
                logic.create_marketplace(ctx, state, id, fields)?
            }
            Self::UpdateMarketplace {
                id,
                fields,
                new_admin,
            } => logic.update_marketplace(ctx, state, id, fields, new_admin)?,
            Self::ApproveMarketplace { id } => logic.approve_marketplace(ctx, state, id)?,
            Self::RejectMarketplace { id } => logic.reject_marketplace(ctx, state, id)?,
            Self::ActivateApprovalPolicy => logic.activate_approval_policy(ctx, state)?,
            Self::DeactivateApprovalPolicy => logic.deactivate_approval_policy(ctx, state)?,
            Self::Pause => logic.pause(ctx, state)?,
            Self::Unpause => logic.unpause(ctx, state)?,
            read => return read.query(logic, state).map(Receipt::new),
        };
        Ok(Receipt::with_event(CallOutput::Unit, event))
    }

    /// Run a read-only call. Writes are refused with `NotReadOnly`; use
    /// [`RegistryCall::execute`] for them.
    pub fn query(self, logic: &dyn RegistryLogic, state: &RegistryState) -> RegistryResult<CallOutput> {
        let output = match self {
            Self::GetMarketplace { id } => CallOutput::Marketplace(logic.get_marketplace(state, id)?),
            Self::GetMarketplaceId { index } => {
                CallOutput::MarketplaceId(logic.get_marketplace_id(state, index)?)
            }
            Self::MarketplacesCount => CallOutput::Count(logic.marketplaces_count(state)),
            Self::IsApprovalPolicyActive => CallOutput::Flag(logic.is_approval_policy_active(state)),
            Self::IsPaused => CallOutput::Flag(logic.is_paused(state)),
            write => return Err(RegistryError::NotReadOnly(write.name())),
        };
        Ok(output)
    }
}
