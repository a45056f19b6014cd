//! Reference marketplace registry logic.
//!
//! Check order for state-changing calls:
//! 1. Pause gate
//! 2. Existence / uniqueness
//! 3. Caller role
//! 4. Field validation
//!
//! `pause` and `unpause` are the exception: the owner check runs first, then
//! the pause flag (`Paused` / `NotPaused`). A non-owner calling `pause` on a
//! paused registry gets `Unauthorized`.
//!
//! The first failing check aborts the call. Storage is only written after
//! every check has passed.

use crate::error::{RegistryError, RegistryResult, Role};
use crate::logic::{CallContext, RegistryLogic};
use crate::state::RegistryState;
use mpreg_core::{
    Address, LogicHandle, MarketplaceFields, MarketplaceId, MarketplaceRecord, RegistryEvent,
};
use tracing::{debug, info};

/// Marketplace registry logic module.
///
/// Stateless apart from its own deployment address; two deployments of this
/// type behave identically against the same storage.
#[derive(Debug, Clone)]
pub struct MarketplaceRegistry {
    handle: LogicHandle,
}

impl MarketplaceRegistry {
    pub const VERSION: &'static str = "marketplace-registry/1";

    /// Deploy the module at `handle`.
    pub fn new(handle: LogicHandle) -> Self {
        Self { handle }
    }

    fn ensure_not_paused(state: &RegistryState) -> RegistryResult<()> {
        if state.is_paused() {
            return Err(RegistryError::Paused);
        }
        Ok(())
    }

    fn ensure_owner(ctx: &CallContext) -> RegistryResult<()> {
        if !ctx.caller_is_owner() {
            return Err(RegistryError::Unauthorized {
                caller: ctx.caller,
                role: Role::Owner,
            });
        }
        Ok(())
    }

    fn ensure_valid(fields: &MarketplaceFields) -> RegistryResult<()> {
        match fields.first_invalid() {
            Some(field) => Err(RegistryError::InvalidField(field)),
            None => Ok(()),
        }
    }

    fn set_approval(
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
        approved: bool,
    ) -> RegistryResult<()> {
        Self::ensure_not_paused(state)?;
        Self::ensure_owner(ctx)?;
        let record = state.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        record.approved = approved;
        Ok(())
    }

    fn set_policy(
        ctx: &CallContext,
        state: &mut RegistryState,
        active: bool,
    ) -> RegistryResult<RegistryEvent> {
        Self::ensure_not_paused(state)?;
        Self::ensure_owner(ctx)?;
        state.set_approval_policy_active(active);
        info!(active, caller = %ctx.caller, "Approval policy changed");
        Ok(RegistryEvent::ApprovalPolicyChanged { active })
    }
}

impl RegistryLogic for MarketplaceRegistry {
    fn handle(&self) -> LogicHandle {
        self.handle
    }

    fn version(&self) -> &str {
        Self::VERSION
    }

    fn create_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
        fields: MarketplaceFields,
    ) -> RegistryResult<RegistryEvent> {
        Self::ensure_not_paused(state)?;
        if state.contains(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        Self::ensure_valid(&fields)?;

        // Auto-approve only while the approval policy is off.
        let approved = !state.is_approval_policy_active();
        let record = MarketplaceRecord::new(ctx.caller, fields, state.count(), approved);
        let index = state.append(id, record)?;

        info!(%id, index, approved, admin = %ctx.caller, "Marketplace created");
        Ok(RegistryEvent::MarketplaceCreated { id })
    }

    fn update_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
        fields: MarketplaceFields,
        new_admin: Address,
    ) -> RegistryResult<RegistryEvent> {
        Self::ensure_not_paused(state)?;
        let record = state.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        if record.admin != ctx.caller {
            return Err(RegistryError::Unauthorized {
                caller: ctx.caller,
                role: Role::Admin,
            });
        }
        Self::ensure_valid(&fields)?;
        if new_admin == Address::ZERO {
            return Err(RegistryError::InvalidField("new_admin"));
        }

        record.apply_update(fields, new_admin);
        info!(%id, admin = %new_admin, "Marketplace updated");
        Ok(RegistryEvent::MarketplaceUpdated { id })
    }

    fn approve_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<RegistryEvent> {
        Self::set_approval(ctx, state, id, true)?;
        info!(%id, "Marketplace approved");
        Ok(RegistryEvent::MarketplaceApproved { id })
    }

    fn reject_marketplace(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<RegistryEvent> {
        Self::set_approval(ctx, state, id, false)?;
        info!(%id, "Marketplace rejected");
        Ok(RegistryEvent::MarketplaceRejected { id })
    }

    fn activate_approval_policy(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<RegistryEvent> {
        Self::set_policy(ctx, state, true)
    }

    fn deactivate_approval_policy(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<RegistryEvent> {
        Self::set_policy(ctx, state, false)
    }

    fn pause(&self, ctx: &CallContext, state: &mut RegistryState) -> RegistryResult<RegistryEvent> {
        Self::ensure_owner(ctx)?;
        Self::ensure_not_paused(state)?;
        state.set_paused(true);
        info!(by = %ctx.caller, "Registry paused");
        Ok(RegistryEvent::Paused { by: ctx.caller })
    }

    fn unpause(
        &self,
        ctx: &CallContext,
        state: &mut RegistryState,
    ) -> RegistryResult<RegistryEvent> {
        Self::ensure_owner(ctx)?;
        if !state.is_paused() {
            return Err(RegistryError::NotPaused);
        }
        state.set_paused(false);
        info!(by = %ctx.caller, "Registry unpaused");
        Ok(RegistryEvent::Unpaused { by: ctx.caller })
    }

    fn get_marketplace(
        &self,
        state: &RegistryState,
        id: MarketplaceId,
    ) -> RegistryResult<MarketplaceRecord> {
        debug!(%id, "getMarketplace");
        state.get(&id).cloned().ok_or(RegistryError::NotFound(id))
    }

    fn get_marketplace_id(
        &self,
        state: &RegistryState,
        index: u64,
    ) -> RegistryResult<MarketplaceId> {
        state.id_at(index).ok_or(RegistryError::IndexOutOfRange {
            index,
            count: state.count(),
        })
    }

    fn marketplaces_count(&self, state: &RegistryState) -> u64 {
        state.count()
    }

    fn is_approval_policy_active(&self, state: &RegistryState) -> bool {
        state.is_approval_policy_active()
    }

    fn is_paused(&self, state: &RegistryState) -> bool {
        state.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(0xa0);
    const NOT_OWNER: Address = Address::repeat_byte(0xa1);
    const ADMIN: Address = Address::repeat_byte(0xa2);
    const NEW_ADMIN: Address = Address::repeat_byte(0xa3);

    fn logic() -> MarketplaceRegistry {
        MarketplaceRegistry::new(LogicHandle::new(Address::repeat_byte(0x10)))
    }

    fn as_caller(caller: Address) -> CallContext {
        CallContext::new(caller, OWNER)
    }

    fn id(label: &str) -> MarketplaceId {
        MarketplaceId::from_label(label).unwrap()
    }

    fn fields() -> MarketplaceFields {
        MarketplaceFields::new(
            "https://lockchain.co/marketplace",
            "https://lockchain.co/PropertyAPI",
            "https://lockchain.co/DisuputeAPI",
            Address::repeat_byte(0x29),
        )
    }

    fn fields2() -> MarketplaceFields {
        MarketplaceFields::new(
            "https://lockchain.co/mp",
            "https://lockchain.co/propAPI",
            "https://lockchain.co/disAPI",
            Address::repeat_byte(0x2a),
        )
    }

    fn with_marketplace() -> (MarketplaceRegistry, RegistryState) {
        let logic = logic();
        let mut state = RegistryState::new();
        logic
            .create_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields())
            .unwrap();
        (logic, state)
    }

    #[test]
    fn test_create_sets_all_values() {
        let (logic, state) = with_marketplace();

        let record = logic.get_marketplace(&state, id("m1")).unwrap();
        assert_eq!(record.admin, ADMIN);
        assert_eq!(record.fields(), fields());
        assert_eq!(record.index, 0);
        assert!(!record.approved);
        assert!(record.active);
        assert_eq!(logic.marketplaces_count(&state), 1);
        assert_eq!(logic.get_marketplace_id(&state, 0).unwrap(), id("m1"));
    }

    #[test]
    fn test_create_returns_creation_event() {
        let logic = logic();
        let mut state = RegistryState::new();
        let event = logic
            .create_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields())
            .unwrap();
        assert_eq!(event, RegistryEvent::MarketplaceCreated { id: id("m1") });
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (logic, mut state) = with_marketplace();
        let before = state.clone();

        let err = logic
            .create_marketplace(&as_caller(NEW_ADMIN), &mut state, id("m1"), fields2())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId(id("m1")));
        assert_eq!(state, before);
    }

    #[test]
    fn test_create_validates_fields() {
        let logic = logic();
        let mut state = RegistryState::new();

        let mut bad = fields();
        bad.dispute_api.clear();
        let err = logic
            .create_marketplace(&as_caller(ADMIN), &mut state, id("m1"), bad)
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidField("dispute_api"));
        assert_eq!(state.count(), 0);
    }

    #[test]
    fn test_policy_controls_auto_approval() {
        let logic = logic();
        let mut state = RegistryState::new();

        logic
            .deactivate_approval_policy(&as_caller(OWNER), &mut state)
            .unwrap();
        logic
            .create_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields())
            .unwrap();
        logic
            .activate_approval_policy(&as_caller(OWNER), &mut state)
            .unwrap();
        logic
            .create_marketplace(&as_caller(ADMIN), &mut state, id("m2"), fields())
            .unwrap();

        assert!(logic.get_marketplace(&state, id("m1")).unwrap().approved);
        assert!(!logic.get_marketplace(&state, id("m2")).unwrap().approved);
    }

    #[test]
    fn test_update_overwrites_mutable_fields_only() {
        let (logic, mut state) = with_marketplace();
        logic
            .approve_marketplace(&as_caller(OWNER), &mut state, id("m1"))
            .unwrap();

        let event = logic
            .update_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields2(), NEW_ADMIN)
            .unwrap();
        assert_eq!(event, RegistryEvent::MarketplaceUpdated { id: id("m1") });

        let record = logic.get_marketplace(&state, id("m1")).unwrap();
        assert_eq!(record.admin, NEW_ADMIN);
        assert_eq!(record.fields(), fields2());
        assert_eq!(record.index, 0);
        assert!(record.approved);
        assert!(record.active);
    }

    #[test]
    fn test_update_check_order() {
        let (logic, mut state) = with_marketplace();

        // Unknown id is reported before the caller check.
        let err = logic
            .update_marketplace(&as_caller(NOT_OWNER), &mut state, id("nope"), fields2(), NEW_ADMIN)
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound(id("nope")));

        // Caller check comes before field validation.
        let mut bad = fields2();
        bad.url.clear();
        let err = logic
            .update_marketplace(&as_caller(NEW_ADMIN), &mut state, id("m1"), bad, NEW_ADMIN)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Unauthorized {
                role: Role::Admin,
                ..
            }
        ));
    }

    #[test]
    fn test_update_rejects_null_admin() {
        let (logic, mut state) = with_marketplace();
        let before = state.clone();
        let err = logic
            .update_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields2(), Address::ZERO)
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidField("new_admin"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_old_admin_loses_rights_after_handover() {
        let (logic, mut state) = with_marketplace();
        logic
            .update_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields2(), NEW_ADMIN)
            .unwrap();

        let err = logic
            .update_marketplace(&as_caller(ADMIN), &mut state, id("m1"), fields(), ADMIN)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));

        logic
            .update_marketplace(&as_caller(NEW_ADMIN), &mut state, id("m1"), fields(), ADMIN)
            .unwrap();
    }

    #[test]
    fn test_approve_and_reject_are_owner_only() {
        let (logic, mut state) = with_marketplace();

        let err = logic
            .approve_marketplace(&as_caller(NOT_OWNER), &mut state, id("m1"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Unauthorized {
                role: Role::Owner,
                ..
            }
        ));

        let err = logic
            .reject_marketplace(&as_caller(ADMIN), &mut state, id("m1"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
    }

    #[test]
    fn test_approve_unknown_id() {
        let logic = logic();
        let mut state = RegistryState::new();
        let err = logic
            .approve_marketplace(&as_caller(OWNER), &mut state, id("ghost"))
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound(id("ghost")));
    }

    #[test]
    fn test_approval_is_idempotent() {
        let (logic, mut state) = with_marketplace();
        for _ in 0..2 {
            let event = logic
                .approve_marketplace(&as_caller(OWNER), &mut state, id("m1"))
                .unwrap();
            assert_eq!(event, RegistryEvent::MarketplaceApproved { id: id("m1") });
            assert!(state.get(&id("m1")).unwrap().approved);
        }

        logic
            .reject_marketplace(&as_caller(OWNER), &mut state, id("m1"))
            .unwrap();
        assert!(!state.get(&id("m1")).unwrap().approved);
    }

    #[test]
    fn test_pause_gates_every_write() {
        let (logic, mut state) = with_marketplace();
        logic.pause(&as_caller(OWNER), &mut state).unwrap();
        let before = state.clone();

        let owner = as_caller(OWNER);
        let admin = as_caller(ADMIN);
        let results = [
            logic.create_marketplace(&admin, &mut state, id("m2"), fields()),
            logic.update_marketplace(&admin, &mut state, id("m1"), fields2(), NEW_ADMIN),
            logic.approve_marketplace(&owner, &mut state, id("m1")),
            logic.reject_marketplace(&owner, &mut state, id("m1")),
            logic.activate_approval_policy(&owner, &mut state),
            logic.deactivate_approval_policy(&owner, &mut state),
        ];
        for result in results {
            assert_eq!(result.unwrap_err(), RegistryError::Paused);
        }
        assert_eq!(state, before);

        // Pause precedes every other check, including the caller check.
        let err = logic
            .update_marketplace(&as_caller(NOT_OWNER), &mut state, id("m1"), fields2(), NEW_ADMIN)
            .unwrap_err();
        assert_eq!(err, RegistryError::Paused);
    }

    #[test]
    fn test_pause_and_unpause_rules() {
        let logic = logic();
        let mut state = RegistryState::new();

        let err = logic.pause(&as_caller(NOT_OWNER), &mut state).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert_eq!(
            logic.unpause(&as_caller(OWNER), &mut state).unwrap_err(),
            RegistryError::NotPaused
        );

        assert_eq!(
            logic.pause(&as_caller(OWNER), &mut state).unwrap(),
            RegistryEvent::Paused { by: OWNER }
        );
        assert!(logic.is_paused(&state));
        assert_eq!(
            logic.pause(&as_caller(OWNER), &mut state).unwrap_err(),
            RegistryError::Paused
        );

        let err = logic.unpause(&as_caller(NOT_OWNER), &mut state).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        logic.unpause(&as_caller(OWNER), &mut state).unwrap();
        assert!(!logic.is_paused(&state));
    }

    #[test]
    fn test_pause_checks_owner_before_pause_flag() {
        let logic = logic();
        let mut state = RegistryState::new();
        logic.pause(&as_caller(OWNER), &mut state).unwrap();

        assert_eq!(
            logic.pause(&as_caller(NOT_OWNER), &mut state).unwrap_err(),
            RegistryError::Unauthorized {
                caller: NOT_OWNER,
                role: Role::Owner
            }
        );
        logic.unpause(&as_caller(OWNER), &mut state).unwrap();
        assert_eq!(
            logic.unpause(&as_caller(NOT_OWNER), &mut state).unwrap_err(),
            RegistryError::Unauthorized {
                caller: NOT_OWNER,
                role: Role::Owner
            }
        );
        assert!(!logic.is_paused(&state));
    }

    #[test]
    fn test_pause_does_not_touch_policy() {
        let logic = logic();
        let mut state = RegistryState::new();
        logic
            .deactivate_approval_policy(&as_caller(OWNER), &mut state)
            .unwrap();
        logic.pause(&as_caller(OWNER), &mut state).unwrap();
        logic.unpause(&as_caller(OWNER), &mut state).unwrap();
        assert!(!logic.is_approval_policy_active(&state));
    }

    #[test]
    fn test_index_out_of_range() {
        let (logic, state) = with_marketplace();
        assert_eq!(
            logic.get_marketplace_id(&state, 1).unwrap_err(),
            RegistryError::IndexOutOfRange { index: 1, count: 1 }
        );
    }
}
