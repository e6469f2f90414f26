//! Error types for wasm-trp
//!
//! One enum per failure category. `WasmTrpError` unifies them for callers that
//! do not care which stage produced the failure.

use pallas_codec::minicbor;
use serde_json::Value;
use std::convert::Infallible;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Argument binding failures (local, never retried)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("missing parameter `{0}`")]
    Missing(String),
    #[error("parameter `{name}` expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },
    #[error("unexpected parameter `{0}`")]
    Unexpected(String),
}

/// Template registry failures (local, never retried)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {name}@{version} not found")]
    NotFound { name: String, version: String },
    #[error("template {name}@{version} is already registered")]
    Conflict { name: String, version: String },
    #[error("invalid template manifest: {0}")]
    InvalidManifest(String),
}

/// Failures talking to the resolver endpoint. These are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// True when the request may have reached the remote side.
    ///
    /// A connection failure means nothing was delivered; a timeout or a broken
    /// response leaves the remote outcome unknown.
    pub fn is_ambiguous(&self) -> bool {
        !matches!(self, TransportError::Unreachable(_))
    }
}

/// JSON-RPC error object returned by the resolver. Terminal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("resolver rejected request ({code}): {message}")]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// Hashing, signing and witness failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("witness for public key {0} already attached")]
    DuplicateWitness(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("malformed transaction payload: {0}")]
    MalformedPayload(String),
}

impl From<minicbor::decode::Error> for SigningError {
    fn from(err: minicbor::decode::Error) -> Self {
        SigningError::MalformedPayload(err.to_string())
    }
}

impl From<minicbor::encode::Error<Infallible>> for SigningError {
    fn from(err: minicbor::encode::Error<Infallible>) -> Self {
        SigningError::MalformedPayload(err.to_string())
    }
}

/// Credential and session failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential unavailable: {0}")]
    Unavailable(String),
    /// Informational: the session already holds a credential
    #[error("session `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("session `{0}` is not registered")]
    UnknownSession(String),
}

/// Failures of a single resolver call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ResolverError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolverError::Transport(_))
    }
}

/// Main error type for wasm-trp operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WasmTrpError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl WasmTrpError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WasmTrpError::Transport(_))
    }
}

impl From<ResolverError> for WasmTrpError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::Transport(e) => WasmTrpError::Transport(e),
            ResolverError::Protocol(e) => WasmTrpError::Protocol(e),
        }
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<WasmTrpError> for JsValue {
    fn from(err: WasmTrpError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParameterError::TypeMismatch {
            name: "quantity".to_string(),
            expected: "int".to_string(),
            got: "string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parameter `quantity` expected int, got string"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let transport: WasmTrpError = TransportError::Timeout.into();
        assert!(transport.is_retryable());

        let protocol: WasmTrpError = ProtocolError {
            code: -32602,
            message: "invalid params".to_string(),
            data: None,
        }
        .into();
        assert!(!protocol.is_retryable());

        let signing: WasmTrpError = SigningError::InvalidKey("short".into()).into();
        assert!(!signing.is_retryable());
    }

    #[test]
    fn test_ambiguous_transport_failures() {
        assert!(TransportError::Timeout.is_ambiguous());
        assert!(TransportError::Malformed("eof".into()).is_ambiguous());
        assert!(!TransportError::Unreachable("refused".into()).is_ambiguous());
    }
}
