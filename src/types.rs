//! Shared types for TRP operations

use crate::error::WasmTrpError;
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger network discriminant carried in address headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTag {
    /// Preview / preprod / local devnets (addresses start with `addr_test`)
    Testnet = 0,
    /// Mainnet (addresses start with `addr`)
    Mainnet = 1,
}

impl NetworkTag {
    /// Get the header nibble value
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self, WasmTrpError> {
        match id {
            0 => Ok(NetworkTag::Testnet),
            1 => Ok(NetworkTag::Mainnet),
            other => Err(WasmTrpError::InvalidAddress(format!(
                "Unknown network id: {}",
                other
            ))),
        }
    }

    /// Human readable part used for bech32 addresses
    pub fn address_hrp(self) -> &'static str {
        match self {
            NetworkTag::Testnet => "addr_test",
            NetworkTag::Mainnet => "addr",
        }
    }
}

impl FromStr for NetworkTag {
    type Err = WasmTrpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "testnet" | "preview" | "preprod" | "0" => Ok(NetworkTag::Testnet),
            "mainnet" | "1" => Ok(NetworkTag::Mainnet),
            other => Err(WasmTrpError::InvalidInput(format!(
                "Unknown network: {}",
                other
            ))),
        }
    }
}

/// Text encoding used for bytecode and transaction payloads on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Hex,
    Base64,
}

impl PayloadEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            PayloadEncoding::Hex => hex::encode(bytes),
            PayloadEncoding::Base64 => BASE64_STANDARD.encode(bytes),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, WasmTrpError> {
        match self {
            PayloadEncoding::Hex => {
                let text = text.strip_prefix("0x").unwrap_or(text);
                hex::decode(text)
                    .map_err(|e| WasmTrpError::InvalidInput(format!("Invalid hex: {}", e)))
            }
            PayloadEncoding::Base64 => BASE64_STANDARD
                .decode(text)
                .map_err(|e| WasmTrpError::InvalidInput(format!("Invalid base64: {}", e))),
        }
    }
}

/// Template identity: name plus explicit IR version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId {
    pub name: String,
    pub version: String,
}

impl TemplateId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
