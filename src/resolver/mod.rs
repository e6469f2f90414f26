//! TRP resolver client
//!
//! Speaks JSON-RPC 2.0 to a resolver endpoint:
//! - `trp.resolve` compiles a template plus arguments into an unsigned transaction
//! - `trp.submit` accepts a signed transaction and returns its hash
//! - `health` reports whether the resolver is ready
//!
//! The client never sees key material. `resolve` retries transport failures
//! with a fresh request id per attempt; `submit` is a single attempt so the
//! caller decides whether an ambiguous failure may be repeated.

pub mod retry;
pub mod transport;

pub use retry::{retry, Failure, Outcome, RetryPolicy};
pub use transport::{HttpTransport, Transport};

use crate::binder::BoundArguments;
use crate::envelope::{SignedTransaction, TransactionEnvelope};
use crate::error::{ProtocolError, ResolverError, TransportError, WasmTrpError};
use crate::template::TransactionTemplate;
use crate::wire::{
    self, JsonRpcRequest, ResolveParams, ResolveResult, SubmitParams, SubmitReceipt, TirEnvelope,
    WireTx, INVALID_PARAMS, METHOD_HEALTH, METHOD_RESOLVE, METHOD_SUBMIT,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8164";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Produces unique JSON-RPC ids
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Random UUID v4 id
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Resolver client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    pub endpoint: String,
    /// Sent with every request
    pub headers: BTreeMap<String, String>,
    /// Merged into every resolve; bound arguments take precedence
    pub env_args: Map<String, Value>,
    /// Per-request timeout
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            headers: BTreeMap::new(),
            env_args: Map::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientOptions {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// JSON-RPC client for one resolver endpoint
pub struct ResolverClient<T: Transport = HttpTransport> {
    transport: T,
    options: ClientOptions,
    ids: IdGenerator,
}

impl ResolverClient<HttpTransport> {
    /// Build an HTTP client from options
    pub fn connect(options: ClientOptions) -> Result<Self, WasmTrpError> {
        let transport = HttpTransport::new(&options)?;
        Ok(Self::with_transport(transport, options))
    }
}

impl<T: Transport> ResolverClient<T> {
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        ResolverClient {
            transport,
            options,
            ids: Arc::new(new_correlation_id),
        }
    }

    /// Override the id source for resolve and health requests
    pub fn with_request_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<P: Serialize>(
        &self,
        method: &str,
        params: &P,
        id: &str,
    ) -> Result<Value, ResolverError> {
        let request = JsonRpcRequest::new(method, params, id);
        let body = serde_json::to_value(&request)
            .map_err(|e| TransportError::Malformed(format!("failed to encode request: {}", e)))?;
        tracing::debug!(method, id, "sending request");
        let response = self.transport.send(body).await?;
        Ok(wire::parse_response(response)??)
    }

    /// Params for `trp.resolve`, with env args merged under bound arguments
    pub fn resolve_params(
        &self,
        template: &TransactionTemplate,
        args: &BoundArguments,
    ) -> Result<ResolveParams, ProtocolError> {
        if args.template() != template.id() {
            return Err(ProtocolError {
                code: INVALID_PARAMS,
                message: format!(
                    "arguments were bound for {}, not {}",
                    args.template(),
                    template.id()
                ),
                data: None,
            });
        }
        let mut merged = self.options.env_args.clone();
        merged.extend(args.to_wire());
        Ok(ResolveParams {
            tir: TirEnvelope::from(template),
            args: merged,
        })
    }

    /// Compile `template` with `args` into an unsigned transaction
    pub async fn resolve(
        &self,
        template: &TransactionTemplate,
        args: &BoundArguments,
    ) -> Result<TransactionEnvelope, ResolverError> {
        let params = self.resolve_params(template, args)?;
        let result = retry(
            &self.options.retry,
            METHOD_RESOLVE,
            |attempt| {
                let params = &params;
                async move {
                    let id = (self.ids)();
                    tracing::debug!(template = %template.id(), attempt, "resolving");
                    let value = self.call(METHOD_RESOLVE, params, &id).await?;
                    let result: ResolveResult = wire::decode_result(value)?;
                    let envelope = TransactionEnvelope::from_wire(
                        &result.tx,
                        result.encoding,
                        template.version(),
                    )
                    .map_err(|e| TransportError::Malformed(e.to_string()))?;
                    Ok::<_, ResolverError>(envelope)
                }
            },
            ResolverError::is_retryable,
        )
        .await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    template = %template.id(),
                    attempts = outcome.attempts,
                    "resolved transaction"
                );
                Ok(outcome.value)
            }
            Err(failure) => Err(failure.error),
        }
    }

    /// Submit a signed transaction once, with `correlation_id` as the request id
    pub async fn submit(
        &self,
        tx: &SignedTransaction,
        correlation_id: &str,
    ) -> Result<SubmitReceipt, ResolverError> {
        let params = SubmitParams {
            tx: WireTx::from(tx),
        };
        let value = self.call(METHOD_SUBMIT, &params, correlation_id).await?;
        Ok(wire::decode_result(value)?)
    }

    /// `true` when the resolver reports itself healthy
    pub async fn health(&self) -> Result<bool, ResolverError> {
        let id = (self.ids)();
        let value = self
            .call(METHOD_HEALTH, &Value::Array(Vec::new()), &id)
            .await?;
        Ok(wire::decode_result(value)?)
    }
}
