//! Identifier types.
//!
//! Marketplaces are keyed by a fixed-size 32-byte id chosen by the creator.
//! Logic modules are referred to by the address they were deployed at; the
//! gateway only ever stores that address, never the module itself.

use crate::error::{CoreError, Result};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of a marketplace id.
pub const MARKETPLACE_ID_LEN: usize = 32;

/// Unique marketplace identifier.
///
/// Opaque to the registry: two ids are equal iff all 32 bytes are equal.
/// The all-zero id is a valid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketplaceId(pub B256);

impl MarketplaceId {
    pub const fn new(raw: B256) -> Self {
        Self(raw)
    }

    /// Build an id from a short ASCII label, right-padded with zero bytes.
    ///
    /// `"5a9d0e1a87"` becomes `0x35613964...0000`.
    pub fn from_label(label: &str) -> Result<Self> {
        let bytes = label.as_bytes();
        if bytes.is_empty() || bytes.len() > MARKETPLACE_ID_LEN {
            return Err(CoreError::InvalidMarketplaceId(format!(
                "label must be 1..={MARKETPLACE_ID_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut raw = [0u8; MARKETPLACE_ID_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(B256::from(raw)))
    }

    /// Parse either a `0x`-prefixed 64-digit hex string or a short label.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.starts_with("0x") && trimmed.len() == 2 + MARKETPLACE_ID_LEN * 2 {
            return B256::from_str(trimmed)
                .map(Self)
                .map_err(|e| CoreError::InvalidMarketplaceId(format!("{trimmed}: {e}")));
        }
        Self::from_label(trimmed)
    }

    pub fn as_bytes(&self) -> &[u8; MARKETPLACE_ID_LEN] {
        &self.0 .0
    }

    /// Recover the label of an id built with [`MarketplaceId::from_label`].
    ///
    /// Returns `None` when the trimmed bytes are not printable ASCII.
    pub fn label(&self) -> Option<String> {
        let bytes = self.as_bytes();
        let end = bytes.iter().rposition(|b| *b != 0).map(|p| p + 1)?;
        let head = &bytes[..end];
        if head.iter().all(|b| b.is_ascii_graphic()) {
            String::from_utf8(head.to_vec()).ok()
        } else {
            None
        }
    }
}

impl From<B256> for MarketplaceId {
    fn from(raw: B256) -> Self {
        Self(raw)
    }
}

impl FromStr for MarketplaceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MarketplaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a deployed logic module.
///
/// The zero address is the null handle and is never a valid upgrade target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicHandle(pub Address);

impl LogicHandle {
    /// The null handle.
    pub const NULL: Self = Self(Address::ZERO);

    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == Address::ZERO
    }
}

impl From<Address> for LogicHandle {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl FromStr for LogicHandle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s).map(Self)
    }
}

impl fmt::Display for LogicHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a `0x`-prefixed 20-byte hex address (checksum not enforced).
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    Address::from_str(trimmed).map_err(|e| CoreError::InvalidAddress(format!("{trimmed}: {e}")))
}
