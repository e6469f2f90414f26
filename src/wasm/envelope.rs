//! WASM bindings for transaction envelopes
//!
//! Thin wrapper around TransactionEnvelope and the Cardano signer

use crate::envelope::{TransactionEnvelope, Witness};
use crate::error::{SigningError, WasmTrpError};
use crate::signer::Signer;
use crate::types::PayloadEncoding;
use crate::wasm::credential::WasmCredential;
use crate::wasm::to_js;
use crate::wire::{JsonRpcRequest, SubmitParams, WireTx, METHOD_SUBMIT};
use wasm_bindgen::prelude::*;

/// WASM-exposed transaction envelope
#[wasm_bindgen]
pub struct WasmEnvelope {
    inner: TransactionEnvelope,
}

#[wasm_bindgen]
impl WasmEnvelope {
    /// Create from a resolver `tx` string
    ///
    /// # Arguments
    /// * `payload` - Transaction payload text
    /// * `encoding` - "hex" (default) or "base64"
    /// * `version` - Protocol version the payload was resolved under
    #[wasm_bindgen(js_name = fromWire)]
    pub fn from_wire(
        payload: &str,
        encoding: Option<String>,
        version: &str,
    ) -> Result<WasmEnvelope, JsValue> {
        let encoding = match encoding.as_deref() {
            None | Some("hex") => PayloadEncoding::Hex,
            Some("base64") => PayloadEncoding::Base64,
            Some(other) => {
                return Err(
                    WasmTrpError::InvalidInput(format!("Unknown encoding: {}", other)).into(),
                )
            }
        };
        let inner = TransactionEnvelope::from_wire(payload, encoding, version)?;
        Ok(WasmEnvelope { inner })
    }

    /// Transaction hash (hex) that witnesses sign
    #[wasm_bindgen(getter)]
    pub fn hash(&self) -> Result<String, JsValue> {
        let hash = Signer::cardano()
            .hash(&self.inner)
            .map_err(WasmTrpError::from)?;
        Ok(hex::encode(hash))
    }

    #[wasm_bindgen(getter, js_name = isSigned)]
    pub fn is_signed(&self) -> bool {
        self.inner.is_signed()
    }

    #[wasm_bindgen(getter, js_name = witnessCount)]
    pub fn witness_count(&self) -> usize {
        self.inner.witnesses().len()
    }

    /// Sign with a credential and attach the witness
    #[wasm_bindgen]
    pub fn sign(&mut self, credential: &WasmCredential) -> Result<(), JsValue> {
        let signer = Signer::cardano();
        let witness = signer
            .sign(&self.inner, credential.inner())
            .map_err(WasmTrpError::from)?;
        signer
            .add_witness(&mut self.inner, witness)
            .map_err(WasmTrpError::from)?;
        Ok(())
    }

    /// Attach a CBOR `[vkey, signature]` witness produced by a wallet
    ///
    /// Rejects witnesses that do not verify against this transaction.
    #[wasm_bindgen(js_name = addWitness)]
    pub fn add_witness(&mut self, witness_cbor: &[u8]) -> Result<(), JsValue> {
        let signer = Signer::cardano();
        let witness = Witness::from_cbor(witness_cbor).map_err(WasmTrpError::from)?;
        if !signer
            .verify(&self.inner, &witness)
            .map_err(WasmTrpError::from)?
        {
            return Err(WasmTrpError::from(SigningError::InvalidKey(format!(
                "witness from {} does not sign this transaction",
                witness.public_key_hex()
            )))
            .into());
        }
        signer
            .add_witness(&mut self.inner, witness)
            .map_err(WasmTrpError::from)?;
        Ok(())
    }

    /// Signed transaction payload in its wire encoding
    #[wasm_bindgen(js_name = toSignedPayload)]
    pub fn to_signed_payload(&self) -> Result<String, JsValue> {
        let signed = Signer::cardano()
            .finalize(&self.inner)
            .map_err(WasmTrpError::from)?;
        Ok(signed.payload_text())
    }

    /// Build a complete `trp.submit` request body
    ///
    /// # Arguments
    /// * `correlation_id` - Unique id; use a fresh one for every attempt
    #[wasm_bindgen(js_name = submitRequest)]
    pub fn submit_request(&self, correlation_id: &str) -> Result<JsValue, JsValue> {
        let signed = Signer::cardano()
            .finalize(&self.inner)
            .map_err(WasmTrpError::from)?;
        let params = SubmitParams {
            tx: WireTx::from(&signed),
        };
        to_js(&JsonRpcRequest::new(METHOD_SUBMIT, params, correlation_id))
    }
}
