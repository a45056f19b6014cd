//! Marketplace record types.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Caller-supplied fields of a marketplace, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceFields {
    /// Public marketplace endpoint.
    pub url: String,
    /// Property API endpoint.
    pub property_api: String,
    /// Dispute API endpoint.
    pub dispute_api: String,
    /// External exchange contract. Stored and validated, never invoked.
    pub exchange_contract_address: Address,
}

impl MarketplaceFields {
    pub fn new(
        url: impl Into<String>,
        property_api: impl Into<String>,
        dispute_api: impl Into<String>,
        exchange_contract_address: Address,
    ) -> Self {
        Self {
            url: url.into(),
            property_api: property_api.into(),
            dispute_api: dispute_api.into(),
            exchange_contract_address,
        }
    }

    /// Name of the first required field that is empty or null, if any.
    pub fn first_invalid(&self) -> Option<&'static str> {
        if self.url.is_empty() {
            Some("url")
        } else if self.property_api.is_empty() {
            Some("property_api")
        } else if self.dispute_api.is_empty() {
            Some("dispute_api")
        } else if self.exchange_contract_address == Address::ZERO {
            Some("exchange_contract_address")
        } else {
            None
        }
    }
}

/// Stored marketplace record.
///
/// `index` is assigned once at creation and never changes; `active` stays
/// `true` for as long as the record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceRecord {
    /// Identity allowed to update this record.
    pub admin: Address,
    pub url: String,
    pub property_api: String,
    pub dispute_api: String,
    pub exchange_contract_address: Address,
    /// Position of this record's id in the enumeration sequence.
    pub index: u64,
    pub approved: bool,
    pub active: bool,
}

impl MarketplaceRecord {
    /// Build a freshly created, active record.
    pub fn new(admin: Address, fields: MarketplaceFields, index: u64, approved: bool) -> Self {
        Self {
            admin,
            url: fields.url,
            property_api: fields.property_api,
            dispute_api: fields.dispute_api,
            exchange_contract_address: fields.exchange_contract_address,
            index,
            approved,
            active: true,
        }
    }

    /// Overwrite the mutable fields and the admin. Index and flags are kept.
    pub fn apply_update(&mut self, fields: MarketplaceFields, new_admin: Address) {
        self.admin = new_admin;
        self.url = fields.url;
        self.property_api = fields.property_api;
        self.dispute_api = fields.dispute_api;
        self.exchange_contract_address = fields.exchange_contract_address;
    }

    /// Current mutable fields.
    pub fn fields(&self) -> MarketplaceFields {
        MarketplaceFields {
            url: self.url.clone(),
            property_api: self.property_api.clone(),
            dispute_api: self.dispute_api.clone(),
            exchange_contract_address: self.exchange_contract_address,
        }
    }
}
