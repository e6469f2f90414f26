//! Resolve → sign → submit pipeline
//!
//! Each call owns its arguments, envelope and witnesses, so one
//! [`Orchestrator`] can be shared through an `Arc` by many concurrent callers.
//! Signing with one credential is serialized; everything else runs in parallel.
//!
//! A transaction is signed at most once per call. Submit retries reuse the same
//! signed payload and only change the correlation id.

pub mod service;

pub use service::TrpService;

use crate::binder::bind;
use crate::codec::{CardanoCodec, LedgerCodec};
use crate::credential::Credential;
use crate::envelope::{SignedTransaction, TransactionEnvelope};
use crate::error::{ResolverError, WasmTrpError};
use crate::resolver::{new_correlation_id, retry, HttpTransport, IdGenerator, ResolverClient, Transport};
use crate::signer::Signer;
use crate::template::TemplateRegistry;
use crate::types::TemplateId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// Pipeline step that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Credential,
    Template,
    Bind,
    Resolve,
    Sign,
    Submit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Credential => "credential",
            Stage::Template => "template",
            Stage::Bind => "bind",
            Stage::Resolve => "resolve",
            Stage::Sign => "sign",
            Stage::Submit => "submit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    pub error: WasmTrpError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: impl Into<WasmTrpError>) -> Self {
        PipelineError {
            stage,
            error: error.into(),
        }
    }
}

impl From<PipelineError> for WasmTrpError {
    fn from(err: PipelineError) -> Self {
        err.error
    }
}

/// Outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: String,
    /// Request id of the accepted submit attempt
    pub correlation_id: String,
    pub submit_attempts: u32,
}

/// One async mutex per signing key
///
/// Entries live only while some caller holds or awaits them, so the map is
/// bounded by the number of keys signing concurrently.
#[derive(Debug, Default)]
pub struct SigningGuards {
    locks: Mutex<HashMap<[u8; 32], Arc<tokio::sync::Mutex<()>>>>,
}

impl SigningGuards {
    pub fn guard_for(&self, public_key: [u8; 32]) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        // the map holds the only reference to an idle guard
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(public_key).or_default().clone()
    }

    /// Keys with a live guard
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drives templates through the resolver, signer and back
pub struct Orchestrator<T: Transport = HttpTransport, C: LedgerCodec = CardanoCodec> {
    registry: Arc<TemplateRegistry>,
    client: Arc<ResolverClient<T>>,
    signer: Signer<C>,
    guards: SigningGuards,
    correlation_ids: IdGenerator,
}

impl<T: Transport> Orchestrator<T, CardanoCodec> {
    pub fn new(registry: Arc<TemplateRegistry>, client: Arc<ResolverClient<T>>) -> Self {
        Self::with_signer(registry, client, Signer::cardano())
    }
}

impl<T: Transport, C: LedgerCodec> Orchestrator<T, C> {
    pub fn with_signer(
        registry: Arc<TemplateRegistry>,
        client: Arc<ResolverClient<T>>,
        signer: Signer<C>,
    ) -> Self {
        Orchestrator {
            registry,
            client,
            signer,
            guards: SigningGuards::default(),
            correlation_ids: Arc::new(new_correlation_id),
        }
    }

    /// Override the submit correlation id source
    pub fn with_correlation_ids(mut self, ids: IdGenerator) -> Self {
        self.correlation_ids = ids;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn client(&self) -> &ResolverClient<T> {
        &self.client
    }

    pub fn signer(&self) -> &Signer<C> {
        &self.signer
    }

    /// Look up, bind and resolve; returns the unsigned envelope
    pub async fn prepare(
        &self,
        template_id: &TemplateId,
        raw_args: &Value,
    ) -> Result<TransactionEnvelope, PipelineError> {
        let template = self
            .registry
            .lookup(&template_id.name, &template_id.version)
            .map_err(|e| PipelineError::new(Stage::Template, e))?;
        let args = bind(&template, raw_args).map_err(|e| PipelineError::new(Stage::Bind, e))?;
        self.client
            .resolve(&template, &args)
            .await
            .map_err(|e| PipelineError::new(Stage::Resolve, e))
    }

    /// Sign and assemble, holding the credential's signing guard throughout
    pub async fn sign(
        &self,
        envelope: TransactionEnvelope,
        credential: &Credential,
    ) -> Result<SignedTransaction, PipelineError> {
        let guard = self.guards.guard_for(credential.public_key());
        let _held = guard.lock().await;

        let envelope = self
            .signer
            .sign_and_attach(envelope, credential)
            .map_err(|e| PipelineError::new(Stage::Sign, e))?;
        let signed = self
            .signer
            .finalize(&envelope)
            .map_err(|e| PipelineError::new(Stage::Sign, e))?;
        tracing::debug!(
            tx_hash = %signed.hash_hex(),
            public_key = %credential.public_key_hex(),
            "signed transaction"
        );
        Ok(signed)
    }

    /// Submit a signed transaction, retrying only where the policy allows
    ///
    /// Every attempt carries a fresh correlation id.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<Receipt, PipelineError> {
        let policy = &self.client.options().retry;
        let result = retry(
            policy,
            "trp.submit",
            |attempt| async move {
                let correlation_id = (self.correlation_ids)();
                tracing::debug!(%correlation_id, attempt, "submitting transaction");
                let receipt = self.client.submit(tx, &correlation_id).await?;
                Ok::<_, ResolverError>((receipt, correlation_id))
            },
            |err| match err {
                ResolverError::Transport(t) => !t.is_ambiguous() || policy.retry_ambiguous_submits,
                ResolverError::Protocol(_) => false,
            },
        )
        .await
        .map_err(|failure| PipelineError::new(Stage::Submit, failure.error))?;

        let (receipt, correlation_id) = result.value;
        if !receipt.hash.eq_ignore_ascii_case(&tx.hash_hex()) {
            tracing::warn!(
                remote = %receipt.hash,
                local = %tx.hash_hex(),
                "resolver reported a different transaction hash"
            );
        }
        tracing::info!(
            tx_hash = %receipt.hash,
            %correlation_id,
            attempts = result.attempts,
            "transaction submitted"
        );
        Ok(Receipt {
            tx_hash: receipt.hash,
            correlation_id,
            submit_attempts: result.attempts,
        })
    }

    /// Run the whole pipeline for one transaction
    pub async fn execute_transaction(
        &self,
        template_id: &TemplateId,
        raw_args: &Value,
        credential: &Credential,
    ) -> Result<Receipt, PipelineError> {
        let span = tracing::info_span!("execute_transaction", template = %template_id);
        async {
            let envelope = self.prepare(template_id, raw_args).await?;
            let signed = self.sign(envelope, credential).await?;
            self.submit(&signed).await
        }
        .instrument(span)
        .await
    }
}
