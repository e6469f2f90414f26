//! WASM bindings for wasm-trp
//!
//! Thin wrappers with #[wasm_bindgen] that delegate to the core Rust
//! implementations. The network pipeline stays native; JS callers build the
//! JSON-RPC bodies here and send them with their own `fetch`.

pub mod credential;
pub mod envelope;
pub mod template;

pub use credential::WasmCredential;
pub use envelope::WasmEnvelope;
pub use template::WasmTemplateRegistry;

use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Serialize to a plain JS object (maps as objects, not `Map`)
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_sys::Error::new(&e.to_string()).into())
}

pub(crate) fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_sys::Error::new(&e.to_string()).into())
}
