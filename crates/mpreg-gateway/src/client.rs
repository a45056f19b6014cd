//! Typed registry interface at the gateway address.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;
use mpreg_core::{Address, MarketplaceFields, MarketplaceId, MarketplaceRecord, Receipt};
use mpreg_registry::{CallOutput, RegistryCall};

/// Wraps [`Gateway::forward`] with one method per registry operation.
///
/// Reads are issued as the zero identity; none of them depend on the caller.
pub struct MarketplaceClient<'a> {
    gateway: &'a mut Gateway,
}

impl<'a> MarketplaceClient<'a> {
    pub(crate) fn new(gateway: &'a mut Gateway) -> Self {
        Self { gateway }
    }

    pub fn create_marketplace(
        &mut self,
        caller: Address,
        id: MarketplaceId,
        fields: MarketplaceFields,
    ) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::CreateMarketplace { id, fields })
    }

    pub fn update_marketplace(
        &mut self,
        caller: Address,
        id: MarketplaceId,
        fields: MarketplaceFields,
        new_admin: Address,
    ) -> GatewayResult<Receipt<()>> {
        self.write(
            caller,
            RegistryCall::UpdateMarketplace {
                id,
                fields,
                new_admin,
            },
        )
    }

    pub fn approve_marketplace(
        &mut self,
        caller: Address,
        id: MarketplaceId,
    ) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::ApproveMarketplace { id })
    }

    pub fn reject_marketplace(
        &mut self,
        caller: Address,
        id: MarketplaceId,
    ) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::RejectMarketplace { id })
    }

    pub fn activate_approval_policy(&mut self, caller: Address) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::ActivateApprovalPolicy)
    }

    pub fn deactivate_approval_policy(&mut self, caller: Address) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::DeactivateApprovalPolicy)
    }

    pub fn pause(&mut self, caller: Address) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::Pause)
    }

    pub fn unpause(&mut self, caller: Address) -> GatewayResult<Receipt<()>> {
        self.write(caller, RegistryCall::Unpause)
    }

    pub fn get_marketplace(&mut self, id: MarketplaceId) -> GatewayResult<MarketplaceRecord> {
        let call = RegistryCall::GetMarketplace { id };
        let op = call.name();
        self.read(call)?
            .into_marketplace()
            .ok_or(GatewayError::UnexpectedOutput { op })
    }

    pub fn get_marketplace_id(&mut self, index: u64) -> GatewayResult<MarketplaceId> {
        let call = RegistryCall::GetMarketplaceId { index };
        let op = call.name();
        self.read(call)?
            .as_marketplace_id()
            .ok_or(GatewayError::UnexpectedOutput { op })
    }

    pub fn marketplaces_count(&mut self) -> GatewayResult<u64> {
        let call = RegistryCall::MarketplacesCount;
        let op = call.name();
        self.read(call)?
            .as_count()
            .ok_or(GatewayError::UnexpectedOutput { op })
    }

    pub fn is_approval_policy_active(&mut self) -> GatewayResult<bool> {
        self.flag(RegistryCall::IsApprovalPolicyActive)
    }

    pub fn is_paused(&mut self) -> GatewayResult<bool> {
        self.flag(RegistryCall::IsPaused)
    }

    fn write(&mut self, caller: Address, call: RegistryCall) -> GatewayResult<Receipt<()>> {
        Ok(self.gateway.forward(caller, call)?.map(|_| ()))
    }

    fn read(&mut self, call: RegistryCall) -> GatewayResult<CallOutput> {
        Ok(self.gateway.forward(Address::ZERO, call)?.value)
    }

    fn flag(&mut self, call: RegistryCall) -> GatewayResult<bool> {
        let op = call.name();
        self.read(call)?
            .as_flag()
            .ok_or(GatewayError::UnexpectedOutput { op })
    }
}
