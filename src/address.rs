//! Shelley address encoding and decoding
//!
//! Addresses travel in two shapes: bech32 (`addr1…`, `addr_test1…`) for humans and
//! raw hex for the resolver wire. See CIP-19 for the header layout.

use crate::error::WasmTrpError;
use crate::types::NetworkTag;
use bech32::{Bech32, Hrp};
use blake2::{digest::consts::U28, Blake2b, Digest};

/// Length of a payment / stake key hash
pub const KEY_HASH_LEN: usize = 28;

/// Header type for a base address with key payment and key stake parts
const BASE_KEY_KEY: u8 = 0b0000;
/// Header type for legacy Byron addresses, which are not supported
const BYRON: u8 = 0b1000;

const BASE_LEN: usize = 1 + 2 * KEY_HASH_LEN;
const ENTERPRISE_LEN: usize = 1 + KEY_HASH_LEN;
/// Header, credential and three single-byte pointer varints
const POINTER_MIN_LEN: usize = 1 + KEY_HASH_LEN + 3;

/// A decoded Shelley address (header byte followed by credential bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    bytes: Vec<u8>,
}

impl Address {
    /// Build a base address from payment and stake key hashes
    pub fn base(network: NetworkTag, payment: &[u8; KEY_HASH_LEN], stake: &[u8; KEY_HASH_LEN]) -> Self {
        let mut bytes = Vec::with_capacity(1 + 2 * KEY_HASH_LEN);
        bytes.push((BASE_KEY_KEY << 4) | network.id());
        bytes.extend_from_slice(payment);
        bytes.extend_from_slice(stake);
        Address { bytes }
    }

    /// Derive the base address for a public key
    ///
    /// Payment and stake credentials both use the same key hash.
    pub fn from_public_key(network: NetworkTag, public_key: &[u8]) -> Result<Self, WasmTrpError> {
        if public_key.len() != 32 {
            return Err(WasmTrpError::InvalidAddress(format!(
                "Public key must be 32 bytes, got {}",
                public_key.len()
            )));
        }
        let key_hash = key_hash(public_key);
        Ok(Self::base(network, &key_hash, &key_hash))
    }

    /// Create from raw address bytes
    ///
    /// Only Shelley payment addresses (header types 0-7) are accepted, at the
    /// exact length their header type implies.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WasmTrpError> {
        let header = *bytes
            .first()
            .ok_or_else(|| WasmTrpError::InvalidAddress("Empty address".to_string()))?;
        let kind = header >> 4;
        let length_ok = match kind {
            0..=3 => bytes.len() == BASE_LEN,
            // pointer varints are checked when parsing
            4 | 5 => bytes.len() >= POINTER_MIN_LEN,
            6 | 7 => bytes.len() == ENTERPRISE_LEN,
            BYRON => {
                return Err(WasmTrpError::InvalidAddress(
                    "Byron addresses are not supported".to_string(),
                ))
            }
            14 | 15 => {
                return Err(WasmTrpError::InvalidAddress(
                    "Stake addresses cannot receive payments".to_string(),
                ))
            }
            _ => {
                return Err(WasmTrpError::InvalidAddress(format!(
                    "Reserved address header type {}",
                    kind
                )))
            }
        };
        if !length_ok {
            return Err(WasmTrpError::InvalidAddress(format!(
                "Address header type {} does not fit {} bytes",
                kind,
                bytes.len()
            )));
        }

        let parsed = pallas_addresses::Address::from_bytes(bytes)
            .map_err(|e| WasmTrpError::InvalidAddress(e.to_string()))?;
        if !matches!(parsed, pallas_addresses::Address::Shelley(_)) || parsed.to_vec() != bytes {
            return Err(WasmTrpError::InvalidAddress(format!(
                "Malformed address {}",
                hex::encode(bytes)
            )));
        }
        NetworkTag::from_id(header & 0x0f)?;
        Ok(Address {
            bytes: bytes.to_vec(),
        })
    }

    /// Decode a bech32 address, checking the prefix against the header network
    pub fn from_bech32(address: &str) -> Result<Self, WasmTrpError> {
        let (hrp, data) = bech32::decode(address.trim())
            .map_err(|e| WasmTrpError::InvalidAddress(format!("Invalid bech32: {}", e)))?;
        let decoded = Self::from_bytes(&data)?;
        let expected = decoded.network_tag().address_hrp();
        if hrp.as_str() != expected {
            return Err(WasmTrpError::InvalidAddress(format!(
                "Prefix {} does not match network, expected {}",
                hrp.as_str(),
                expected
            )));
        }
        Ok(decoded)
    }

    /// Decode a hex address (optional 0x prefix)
    pub fn from_hex(address: &str) -> Result<Self, WasmTrpError> {
        let address = address.trim();
        let address = address.strip_prefix("0x").unwrap_or(address);
        let bytes = hex::decode(address)
            .map_err(|e| WasmTrpError::InvalidAddress(format!("Invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse either representation
    pub fn parse(address: &str) -> Result<Self, WasmTrpError> {
        let trimmed = address.trim();
        if trimmed.starts_with("addr") {
            Self::from_bech32(trimmed)
        } else {
            Self::from_hex(trimmed)
        }
    }

    pub fn network_tag(&self) -> NetworkTag {
        // validated on construction
        match self.bytes[0] & 0x0f {
            1 => NetworkTag::Mainnet,
            _ => NetworkTag::Testnet,
        }
    }

    /// Payment key hash, if the payment part is a key (not a script)
    pub fn payment_key_hash(&self) -> Option<[u8; KEY_HASH_LEN]> {
        let kind = self.bytes[0] >> 4;
        // even types up to 6 carry a key payment credential
        if kind > 6 || kind % 2 != 0 {
            return None;
        }
        let mut hash = [0u8; KEY_HASH_LEN];
        hash.copy_from_slice(&self.bytes[1..1 + KEY_HASH_LEN]);
        Some(hash)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Wire representation expected by the resolver
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn to_bech32(&self) -> Result<String, WasmTrpError> {
        let hrp = Hrp::parse(self.network_tag().address_hrp())
            .map_err(|e| WasmTrpError::InvalidAddress(format!("Invalid prefix: {}", e)))?;
        bech32::encode::<Bech32>(hrp, &self.bytes)
            .map_err(|e| WasmTrpError::InvalidAddress(format!("Bech32 encoding failed: {}", e)))
    }
}

/// Blake2b-224 hash of a verification key
pub fn key_hash(public_key: &[u8]) -> [u8; KEY_HASH_LEN] {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(public_key);
    let result = hasher.finalize();
    let mut hash = [0u8; KEY_HASH_LEN];
    hash.copy_from_slice(&result);
    hash
}

/// Validate an address in either representation
pub fn validate_address(address: &str, expected_network: Option<NetworkTag>) -> bool {
    match Address::parse(address) {
        Ok(decoded) => expected_network.map_or(true, |n| decoded.network_tag() == n),
        Err(_) => false,
    }
}
