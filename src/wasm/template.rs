//! WASM bindings for the template registry and argument binding

use crate::binder::bind;
use crate::error::WasmTrpError;
use crate::template::TemplateRegistry;
use crate::wasm::{from_js, to_js};
use crate::wire::{JsonRpcRequest, ResolveParams, TirEnvelope, METHOD_RESOLVE};
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

/// WASM-exposed template registry
#[wasm_bindgen]
pub struct WasmTemplateRegistry {
    inner: TemplateRegistry,
}

#[wasm_bindgen]
impl WasmTemplateRegistry {
    /// Load templates from a protocol manifest
    ///
    /// # Arguments
    /// * `json` - Manifest JSON (`{ "templates": [{ name, version, bytecode, encoding, parameters }] }`)
    #[wasm_bindgen(js_name = fromManifest)]
    pub fn from_manifest(json: &str) -> Result<WasmTemplateRegistry, JsValue> {
        let inner = TemplateRegistry::from_manifest_str(json).map_err(WasmTrpError::from)?;
        Ok(WasmTemplateRegistry { inner })
    }

    /// Registered versions of a template, for diagnostics
    #[wasm_bindgen]
    pub fn versions(&self, name: &str) -> Vec<String> {
        self.inner.versions(name)
    }

    /// Validate arguments and return them in resolver wire form
    #[wasm_bindgen(js_name = bindArguments)]
    pub fn bind_arguments(
        &self,
        name: &str,
        version: &str,
        args: JsValue,
    ) -> Result<JsValue, JsValue> {
        let raw: Value = from_js(args)?;
        let template = self.inner.lookup(name, version).map_err(WasmTrpError::from)?;
        let bound = bind(&template, &raw).map_err(WasmTrpError::from)?;
        to_js(&bound.to_wire())
    }

    /// Build a complete `trp.resolve` request body
    ///
    /// # Arguments
    /// * `id` - Unique request id
    /// * `env_args` - Optional env args; bound arguments take precedence
    #[wasm_bindgen(js_name = resolveRequest)]
    pub fn resolve_request(
        &self,
        name: &str,
        version: &str,
        args: JsValue,
        id: &str,
        env_args: Option<js_sys::Object>,
    ) -> Result<JsValue, JsValue> {
        let raw: Value = from_js(args)?;
        let template = self.inner.lookup(name, version).map_err(WasmTrpError::from)?;
        let bound = bind(&template, &raw).map_err(WasmTrpError::from)?;

        let mut merged: Map<String, Value> = match env_args {
            Some(obj) => from_js(obj.into())?,
            None => Map::new(),
        };
        merged.extend(bound.to_wire());
        let params = ResolveParams {
            tir: TirEnvelope::from(&*template),
            args: merged,
        };
        to_js(&JsonRpcRequest::new(METHOD_RESOLVE, params, id))
    }
}
