//! Common types used in the protocol.

use crate::constants::ADDRESS_LEN;

/// An 8-byte device extended (IEEE) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedAddress(pub [u8; ADDRESS_LEN]);

impl ExtendedAddress {
    /// Create a new extended address from bytes.
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        ExtendedAddress(bytes)
    }

    /// Create from a slice. Returns None if slice is wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == ADDRESS_LEN {
            let mut bytes = [0u8; ADDRESS_LEN];
            bytes.copy_from_slice(slice);
            Some(ExtendedAddress(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Get the bytes as a hex string.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }
}

impl Default for ExtendedAddress {
    fn default() -> Self {
        ExtendedAddress([0u8; ADDRESS_LEN])
    }
}

impl AsRef<[u8]> for ExtendedAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for ExtendedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Helper to encode bytes as hex.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
