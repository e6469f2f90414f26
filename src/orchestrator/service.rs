//! Caller-facing service: sessions plus the transaction pipeline

use super::{Orchestrator, PipelineError, Receipt, Stage};
use crate::codec::{CardanoCodec, LedgerCodec};
use crate::credential::{
    CredentialManager, CredentialRef, MemorySessionStore, Registration, SessionStatus,
    SessionStore,
};
use crate::envelope::{TransactionEnvelope, Witness};
use crate::error::{SigningError, WasmTrpError};
use crate::resolver::{HttpTransport, Transport};
use crate::types::{NetworkTag, TemplateId};
use serde_json::Value;

pub struct TrpService<
    T: Transport = HttpTransport,
    S: SessionStore = MemorySessionStore,
    C: LedgerCodec = CardanoCodec,
> {
    orchestrator: Orchestrator<T, C>,
    credentials: CredentialManager<S>,
}

impl<T: Transport, S: SessionStore, C: LedgerCodec> TrpService<T, S, C> {
    pub fn new(orchestrator: Orchestrator<T, C>, credentials: CredentialManager<S>) -> Self {
        TrpService {
            orchestrator,
            credentials,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<T, C> {
        &self.orchestrator
    }

    pub fn credentials(&self) -> &CredentialManager<S> {
        &self.credentials
    }

    /// Register a session, creating its credential on first use
    pub fn register(
        &self,
        session_id: &str,
        network: NetworkTag,
    ) -> Result<Registration, WasmTrpError> {
        Ok(self.credentials.register_session(session_id, network)?)
    }

    pub fn check_session(&self, session_id: &str) -> Result<SessionStatus, WasmTrpError> {
        Ok(self.credentials.check_session(session_id)?)
    }

    /// Resolve, sign with `credential_ref`, and submit
    pub async fn execute_transaction(
        &self,
        template_name: &str,
        version: &str,
        args: &Value,
        credential_ref: &CredentialRef,
    ) -> Result<Receipt, PipelineError> {
        let credential = self
            .credentials
            .resolve(credential_ref)
            .map_err(|e| PipelineError::new(Stage::Credential, e))?;
        self.orchestrator
            .execute_transaction(&TemplateId::new(template_name, version), args, &credential)
            .await
    }

    /// Resolve without signing, for callers whose wallet signs elsewhere
    pub async fn prepare_transaction(
        &self,
        template_name: &str,
        version: &str,
        args: &Value,
    ) -> Result<TransactionEnvelope, PipelineError> {
        self.orchestrator
            .prepare(&TemplateId::new(template_name, version), args)
            .await
    }

    /// Attach an externally produced CBOR witness and submit
    ///
    /// The witness must be a valid signature over this envelope.
    pub async fn submit_with_witness(
        &self,
        envelope: TransactionEnvelope,
        witness_cbor: &[u8],
    ) -> Result<Receipt, PipelineError> {
        let sign_err = |e: SigningError| PipelineError::new(Stage::Sign, e);
        let signer = self.orchestrator.signer();

        let witness = Witness::from_cbor(witness_cbor).map_err(sign_err)?;
        if !signer.verify(&envelope, &witness).map_err(sign_err)? {
            return Err(sign_err(SigningError::InvalidKey(format!(
                "witness from {} does not sign this transaction",
                witness.public_key_hex()
            ))));
        }
        let envelope = signer.attach(envelope, witness).map_err(sign_err)?;
        let signed = signer.finalize(&envelope).map_err(sign_err)?;
        self.orchestrator.submit(&signed).await
    }
}
