//! Credentials and sessions
//!
//! A [`Credential`] is the key material and derived address of one actor. Session
//! credentials are generated on first registration and never regenerated; the
//! admin credential is loaded from disk once at startup (see [`admin`]).

pub mod admin;
pub mod session;

pub use admin::{load_admin_credential, parse_admin_credential, write_admin_credential};
pub use session::{
    CredentialManager, CredentialRef, MemorySessionStore, Registration, Session, SessionStatus,
    SessionStore, StoredSession,
};

use crate::address::Address;
use crate::envelope::TxHash;
use crate::error::{SigningError, WasmTrpError};
use crate::types::NetworkTag;
use ed25519_dalek::{Signer as _, SigningKey};

/// Ed25519 key pair plus its Shelley base address
///
/// The signing key is zeroized on drop and never leaves this type except through
/// [`admin::write_admin_credential`].
#[derive(Clone)]
pub struct Credential {
    signing_key: SigningKey,
    address: Address,
    network: NetworkTag,
}

impl Credential {
    /// Generate a fresh key pair from OS randomness
    pub fn generate(network: NetworkTag) -> Result<Self, WasmTrpError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed).map_err(|e| {
            WasmTrpError::Signing(SigningError::InvalidKey(format!(
                "Failed to gather randomness: {}",
                e
            )))
        })?;
        let credential = Self::from_secret_key(&seed, network);
        seed.fill(0);
        credential
    }

    /// Create from a 32-byte Ed25519 secret key (seed)
    pub fn from_secret_key(secret_key: &[u8], network: NetworkTag) -> Result<Self, WasmTrpError> {
        let bytes: [u8; 32] = secret_key.try_into().map_err(|_| {
            SigningError::InvalidKey(format!(
                "Secret key must be 32 bytes, got {}",
                secret_key.len()
            ))
        })?;
        let signing_key = SigningKey::from_bytes(&bytes);
        let address = Address::from_public_key(network, signing_key.verifying_key().as_bytes())?;
        Ok(Credential {
            signing_key,
            address,
            network,
        })
    }

    /// Replace the derived base address with one read from disk
    pub(crate) fn with_address(mut self, address: Address) -> Self {
        self.network = address.network_tag();
        self.address = address;
        self
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> NetworkTag {
        self.network
    }

    /// Sign a transaction hash
    pub(crate) fn sign_hash(&self, hash: &TxHash) -> [u8; 64] {
        self.signing_key.sign(hash).to_bytes()
    }

    pub(crate) fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("public_key", &self.public_key_hex())
            .field("address", &self.address.to_hex())
            .field("network", &self.network)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}
