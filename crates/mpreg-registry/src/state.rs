//! Durable registry storage.
//!
//! This is the entire persisted layout a logic module may assume:
//! - id -> record mapping
//! - dense index -> id sequence (its length is the record count)
//! - approval policy flag
//! - pause flag
//!
//! The owner identity lives with the host and reaches logic modules through
//! [`CallContext`](crate::CallContext).

use crate::error::{RegistryError, RegistryResult};
use mpreg_core::{MarketplaceId, MarketplaceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry storage. Append-only: records are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    marketplaces: BTreeMap<MarketplaceId, MarketplaceRecord>,
    marketplace_ids: Vec<MarketplaceId>,
    approval_policy_active: bool,
    paused: bool,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryState {
    /// Empty registry: approval policy on, not paused.
    pub fn new() -> Self {
        Self {
            marketplaces: BTreeMap::new(),
            marketplace_ids: Vec::new(),
            approval_policy_active: true,
            paused: false,
        }
    }

    pub fn contains(&self, id: &MarketplaceId) -> bool {
        self.marketplaces.contains_key(id)
    }

    pub fn get(&self, id: &MarketplaceId) -> Option<&MarketplaceRecord> {
        self.marketplaces.get(id)
    }

    pub fn get_mut(&mut self, id: &MarketplaceId) -> Option<&mut MarketplaceRecord> {
        self.marketplaces.get_mut(id)
    }

    /// Append a new record, assigning it the next index.
    ///
    /// Returns the assigned index. Fails with `DuplicateId` and leaves the
    /// storage untouched if `id` is already present.
    pub fn append(&mut self, id: MarketplaceId, mut record: MarketplaceRecord) -> RegistryResult<u64> {
        if self.contains(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        let index = self.count();
        record.index = index;
        self.marketplaces.insert(id, record);
        self.marketplace_ids.push(id);
        Ok(index)
    }

    /// Id at enumeration position `index`.
    pub fn id_at(&self, index: u64) -> Option<MarketplaceId> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.marketplace_ids.get(i))
            .copied()
    }

    /// Number of records (also the next index to assign).
    pub fn count(&self) -> u64 {
        self.marketplace_ids.len() as u64
    }

    /// Ids in creation order.
    pub fn ids(&self) -> &[MarketplaceId] {
        &self.marketplace_ids
    }

    pub fn is_approval_policy_active(&self) -> bool {
        self.approval_policy_active
    }

    pub fn set_approval_policy_active(&mut self, active: bool) {
        self.approval_policy_active = active;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Check the mapping and the sequence agree.
    ///
    /// Used when storage is loaded from outside (snapshots), where nothing
    /// else guarantees the invariants held by [`RegistryState::append`].
    pub fn verify(&self) -> RegistryResult<()> {
        if self.marketplaces.len() != self.marketplace_ids.len() {
            return Err(RegistryError::StorageInvalid(format!(
                "{} records but {} enumerated ids",
                self.marketplaces.len(),
                self.marketplace_ids.len()
            )));
        }
        for (position, id) in self.marketplace_ids.iter().enumerate() {
            let record = self
                .marketplaces
                .get(id)
                .ok_or_else(|| {
                    RegistryError::StorageInvalid(format!("id {id} at index {position} has no record"))
                })?;
            if record.index != position as u64 {
                return Err(RegistryError::StorageInvalid(format!(
                    "id {id} enumerated at {position} but stores index {}",
                    record.index
                )));
            }
            if !record.active {
                return Err(RegistryError::StorageInvalid(format!("id {id} is inactive")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpreg_core::{Address, MarketplaceFields};

    fn record() -> MarketplaceRecord {
        let fields = MarketplaceFields::new("u", "p", "d", Address::repeat_byte(9));
        MarketplaceRecord::new(Address::repeat_byte(1), fields, u64::MAX, false)
    }

    fn id(label: &str) -> MarketplaceId {
        MarketplaceId::from_label(label).unwrap()
    }

    #[test]
    fn test_defaults() {
        let state = RegistryState::default();
        assert!(state.is_approval_policy_active());
        assert!(!state.is_paused());
        assert_eq!(state.count(), 0);
        assert!(state.verify().is_ok());
    }

    #[test]
    fn test_append_assigns_dense_indexes() {
        let mut state = RegistryState::new();
        assert_eq!(state.append(id("a"), record()).unwrap(), 0);
        assert_eq!(state.append(id("b"), record()).unwrap(), 1);

        assert_eq!(state.count(), 2);
        assert_eq!(state.id_at(0), Some(id("a")));
        assert_eq!(state.id_at(1), Some(id("b")));
        assert_eq!(state.id_at(2), None);
        assert_eq!(state.get(&id("b")).unwrap().index, 1);
        assert!(state.verify().is_ok());
    }

    #[test]
    fn test_append_duplicate_leaves_state_untouched() {
        let mut state = RegistryState::new();
        state.append(id("a"), record()).unwrap();
        let before = state.clone();

        let err = state.append(id("a"), record()).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId(id("a")));
        assert_eq!(state, before);
    }

    #[test]
    fn test_verify_detects_index_mismatch() {
        let mut state = RegistryState::new();
        state.append(id("a"), record()).unwrap();
        state.get_mut(&id("a")).unwrap().index = 4;
        assert!(matches!(
            state.verify(),
            Err(RegistryError::StorageInvalid(_))
        ));
    }

    #[test]
    fn test_verify_detects_missing_record() {
        let mut state = RegistryState::new();
        state.append(id("a"), record()).unwrap();
        let mut json = serde_json::to_value(&state).unwrap();
        json["marketplaces"] = serde_json::json!({});

        let broken: RegistryState = serde_json::from_value(json).unwrap();
        let err = broken.verify().unwrap_err();
        assert_eq!(err.kind(), "storage_invalid");
    }

    #[test]
    fn test_serde_preserves_layout() {
        let mut state = RegistryState::new();
        state.append(id("a"), record()).unwrap();
        state.append(id("b"), record()).unwrap();
        state.set_paused(true);

        let json = serde_json::to_string(&state).unwrap();
        let back: RegistryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.ids(), state.ids());
    }
}
