//! TRP JSON-RPC 2.0 message shapes
//!
//! Shared by the native resolver client and the wasm bindings, which build the
//! same request bodies for a JS-side `fetch`.

use crate::envelope::SignedTransaction;
use crate::error::{ProtocolError, TransportError};
use crate::template::TransactionTemplate;
use crate::types::PayloadEncoding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_RESOLVE: &str = "trp.resolve";
pub const METHOD_SUBMIT: &str = "trp.submit";
pub const METHOD_HEALTH: &str = "health";

/// JSON-RPC "invalid params" code
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: String,
    pub method: String,
    pub params: P,
    pub id: String,
}

impl<P> JsonRpcRequest<P> {
    pub fn new(method: &str, params: P, id: impl Into<String>) -> Self {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcErrorObject> for ProtocolError {
    fn from(err: JsonRpcErrorObject) -> Self {
        ProtocolError {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// `tir` member of resolve params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TirEnvelope {
    pub version: String,
    pub bytecode: String,
    pub encoding: PayloadEncoding,
}

impl From<&TransactionTemplate> for TirEnvelope {
    fn from(template: &TransactionTemplate) -> Self {
        TirEnvelope {
            version: template.version().to_string(),
            bytecode: template.bytecode_text(),
            encoding: template.encoding(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveParams {
    pub tir: TirEnvelope,
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTx {
    pub payload: String,
    pub encoding: PayloadEncoding,
    pub version: String,
}

impl From<&SignedTransaction> for WireTx {
    fn from(tx: &SignedTransaction) -> Self {
        WireTx {
            payload: tx.payload_text(),
            encoding: tx.encoding,
            version: tx.version.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitParams {
    pub tx: WireTx,
}

/// `trp.resolve` result: the unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub tx: String,
    #[serde(default)]
    pub encoding: PayloadEncoding,
}

/// `trp.submit` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub hash: String,
}

/// Split a response body into its result, a protocol error, or a transport
/// failure when the body is not a JSON-RPC 2.0 response.
pub fn parse_response(body: Value) -> Result<Result<Value, ProtocolError>, TransportError> {
    let response: JsonRpcResponse = serde_json::from_value(body)
        .map_err(|e| TransportError::Malformed(format!("not a JSON-RPC response: {}", e)))?;
    if response.jsonrpc != JSONRPC_VERSION {
        return Err(TransportError::Malformed(format!(
            "unexpected jsonrpc version {}",
            response.jsonrpc
        )));
    }
    match (response.result, response.error) {
        (_, Some(error)) => Ok(Err(error.into())),
        (Some(result), None) => Ok(Ok(result)),
        (None, None) => Err(TransportError::Malformed(
            "response has neither result nor error".to_string(),
        )),
    }
}

/// Decode a typed result, treating a shape mismatch as a transport failure
pub fn decode_result<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::Malformed(format!("unexpected result shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = JsonRpcRequest::new(
            METHOD_SUBMIT,
            SubmitParams {
                tx: WireTx {
                    payload: "84a0".to_string(),
                    encoding: PayloadEncoding::Hex,
                    version: "v1alpha7".to_string(),
                },
            },
            "abc-123",
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "trp.submit",
                "params": {"tx": {"payload": "84a0", "encoding": "hex", "version": "v1alpha7"}},
                "id": "abc-123",
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let ok = parse_response(json!({"jsonrpc": "2.0", "result": {"hash": "aa"}, "id": "1"}))
            .unwrap()
            .unwrap();
        assert_eq!(decode_result::<SubmitReceipt>(ok).unwrap().hash, "aa");

        let rejected = parse_response(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32602, "message": "unknown arg", "data": {"key": "memo"}},
            "id": "1",
        }))
        .unwrap()
        .unwrap_err();
        assert_eq!(rejected.code, -32602);
        assert_eq!(rejected.data, Some(json!({"key": "memo"})));

        assert!(parse_response(json!("<html>")).is_err());
        assert!(parse_response(json!({"jsonrpc": "1.0", "result": 1})).is_err());
        assert!(parse_response(json!({"jsonrpc": "2.0", "id": "1"})).is_err());
    }

    #[test]
    fn test_resolve_result_default_encoding() {
        let result: ResolveResult = serde_json::from_value(json!({"tx": "84a0"})).unwrap();
        assert_eq!(result.encoding, PayloadEncoding::Hex);
    }
}
