//! Session registration and credential lookup
//!
//! Persistence is left to a [`SessionStore`]; the core never sees cookies or
//! request objects. [`MemorySessionStore`] backs tests and the CLI.

use super::Credential;
use crate::error::CredentialError;
use crate::types::NetworkTag;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Which identity signs a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum CredentialRef {
    Session(String),
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub credential_ref: CredentialRef,
    /// Set once at registration, never reset
    pub registered: bool,
}

/// A session together with the credential generated for it
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session: Session,
    pub credential: Arc<Credential>,
}

/// External key-value store for sessions
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<StoredSession>, CredentialError>;
    fn put(&self, stored: StoredSession) -> Result<(), CredentialError>;
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Result<Option<StoredSession>, CredentialError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    fn put(&self, stored: StoredSession) -> Result<(), CredentialError> {
        self.sessions
            .write()
            .insert(stored.session.id.clone(), stored);
        Ok(())
    }
}

/// Result of `register_session`
#[derive(Debug, Clone)]
pub struct Registration {
    pub credential: Arc<Credential>,
    /// `Some(AlreadyRegistered)` when the session existed before this call
    pub notice: Option<CredentialError>,
}

impl Registration {
    pub fn is_new(&self) -> bool {
        self.notice.is_none()
    }
}

/// Registration state reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_registered: bool,
    /// Bech32 address of the session credential
    pub address: Option<String>,
}

/// Owns the admin credential and mediates session credentials
pub struct CredentialManager<S: SessionStore = MemorySessionStore> {
    store: S,
    admin: Option<Arc<Credential>>,
    // serializes get-then-put so a session is never generated twice
    registration: Mutex<()>,
}

impl<S: SessionStore> CredentialManager<S> {
    pub fn new(store: S) -> Self {
        CredentialManager {
            store,
            admin: None,
            registration: Mutex::new(()),
        }
    }

    pub fn with_admin(mut self, admin: Credential) -> Self {
        self.admin = Some(Arc::new(admin));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn admin_credential(&self) -> Result<Arc<Credential>, CredentialError> {
        self.admin
            .clone()
            .ok_or_else(|| CredentialError::Unavailable("no admin credential loaded".to_string()))
    }

    /// Create the credential for `session_id`, or return the existing one
    pub fn register_session(
        &self,
        session_id: &str,
        network: NetworkTag,
    ) -> Result<Registration, CredentialError> {
        let _guard = self.registration.lock();
        if let Some(existing) = self.store.get(session_id)? {
            tracing::debug!(session = session_id, "session already registered");
            return Ok(Registration {
                credential: existing.credential,
                notice: Some(CredentialError::AlreadyRegistered(session_id.to_string())),
            });
        }

        let credential = Credential::generate(network)
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
        let credential = Arc::new(credential);
        self.store.put(StoredSession {
            session: Session {
                id: session_id.to_string(),
                credential_ref: CredentialRef::Session(session_id.to_string()),
                registered: true,
            },
            credential: credential.clone(),
        })?;
        tracing::info!(
            session = session_id,
            public_key = %credential.public_key_hex(),
            "registered session"
        );
        Ok(Registration {
            credential,
            notice: None,
        })
    }

    pub fn resolve(&self, credential_ref: &CredentialRef) -> Result<Arc<Credential>, CredentialError> {
        match credential_ref {
            CredentialRef::Admin => self.admin_credential(),
            CredentialRef::Session(id) => self
                .store
                .get(id)?
                .map(|stored| stored.credential)
                .ok_or_else(|| CredentialError::UnknownSession(id.clone())),
        }
    }

    pub fn check_session(&self, session_id: &str) -> Result<SessionStatus, CredentialError> {
        let Some(stored) = self.store.get(session_id)? else {
            return Ok(SessionStatus {
                is_registered: false,
                address: None,
            });
        };
        let address = stored
            .credential
            .address()
            .to_bech32()
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
        Ok(SessionStatus {
            is_registered: stored.session.registered,
            address: Some(address),
        })
    }
}
