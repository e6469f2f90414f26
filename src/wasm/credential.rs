//! WASM bindings for credentials and addresses

use crate::address::{validate_address, Address};
use crate::credential::Credential;
use crate::types::NetworkTag;
use wasm_bindgen::prelude::*;

/// WASM-exposed Ed25519 credential
///
/// The secret key never crosses into JS after construction.
#[wasm_bindgen]
pub struct WasmCredential {
    inner: Credential,
}

impl WasmCredential {
    pub(crate) fn inner(&self) -> &Credential {
        &self.inner
    }
}

#[wasm_bindgen]
impl WasmCredential {
    /// Generate a fresh credential
    ///
    /// # Arguments
    /// * `network` - "mainnet" or "testnet" ("preview" / "preprod" accepted)
    #[wasm_bindgen]
    pub fn generate(network: &str) -> Result<WasmCredential, JsValue> {
        let network: NetworkTag = network.parse()?;
        Ok(WasmCredential {
            inner: Credential::generate(network)?,
        })
    }

    /// Create from a 32-byte Ed25519 secret key
    #[wasm_bindgen(js_name = fromSecretKey)]
    pub fn from_secret_key(secret_key: &[u8], network: &str) -> Result<WasmCredential, JsValue> {
        let network: NetworkTag = network.parse()?;
        Ok(WasmCredential {
            inner: Credential::from_secret_key(secret_key, network)?,
        })
    }

    #[wasm_bindgen(getter, js_name = publicKey)]
    pub fn public_key(&self) -> Vec<u8> {
        self.inner.public_key().to_vec()
    }

    #[wasm_bindgen(getter, js_name = publicKeyHex)]
    pub fn public_key_hex(&self) -> String {
        self.inner.public_key_hex()
    }

    /// Bech32 base address
    #[wasm_bindgen(getter)]
    pub fn address(&self) -> Result<String, JsValue> {
        Ok(self.inner.address().to_bech32()?)
    }

    /// Raw address hex, as sent to the resolver
    #[wasm_bindgen(getter, js_name = addressHex)]
    pub fn address_hex(&self) -> String {
        self.inner.address().to_hex()
    }
}

/// Validate a bech32 or hex address, optionally for a specific network
#[wasm_bindgen(js_name = validateAddress)]
pub fn validate_address_js(address: &str, network: Option<String>) -> Result<bool, JsValue> {
    let network = match network {
        Some(n) => Some(n.parse::<NetworkTag>()?),
        None => None,
    };
    Ok(validate_address(address, network))
}

/// Convert an address to its raw hex form
#[wasm_bindgen(js_name = addressToHex)]
pub fn address_to_hex(address: &str) -> Result<String, JsValue> {
    Ok(Address::parse(address)?.to_hex())
}
