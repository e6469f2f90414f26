//! Transaction envelope and witnesses
//!
//! The envelope is what the resolver hands back: opaque payload bytes plus the
//! encoding and protocol version they travel with. Signing only ever appends
//! witnesses; the payload itself is never edited.

use crate::error::{SigningError, WasmTrpError};
use crate::types::PayloadEncoding;
use pallas_codec::minicbor::{self, Decoder};
use pallas_primitives::alonzo::VKeyWitness;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// Canonical transaction hash
pub type TxHash = [u8; 32];

/// Ed25519 verification key plus its signature over a transaction hash
#[derive(Clone, PartialEq, Eq)]
pub struct Witness {
    public_key: [u8; PUBLIC_KEY_LEN],
    signature: [u8; SIGNATURE_LEN],
}

impl Witness {
    /// Create a witness from raw parts
    ///
    /// # Arguments
    /// * `public_key` - 32-byte Ed25519 public key
    /// * `signature` - 64-byte Ed25519 signature
    pub fn new(public_key: &[u8], signature: &[u8]) -> Result<Self, SigningError> {
        let public_key: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
            SigningError::InvalidKey(format!(
                "Public key must be 32 bytes, got {}",
                public_key.len()
            ))
        })?;
        let signature: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|_| {
            SigningError::InvalidKey(format!(
                "Signature must be 64 bytes, got {}",
                signature.len()
            ))
        })?;
        Ok(Witness {
            public_key,
            signature,
        })
    }

    /// Decode a CBOR `[vkey, signature]` witness as produced by wallets
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, SigningError> {
        let mut decoder = Decoder::new(bytes);
        let witness: VKeyWitness = decoder.decode()?;
        if decoder.position() != bytes.len() {
            return Err(SigningError::MalformedPayload(
                "Trailing bytes after witness".to_string(),
            ));
        }
        Self::new(&witness.vkey, &witness.signature)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, SigningError> {
        Ok(minicbor::to_vec(self.to_vkey_witness())?)
    }

    /// Ledger representation of this witness
    pub fn to_vkey_witness(&self) -> VKeyWitness {
        VKeyWitness {
            vkey: self.public_key.to_vec().into(),
            signature: self.signature.to_vec().into(),
        }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }
}

impl std::fmt::Debug for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Witness")
            .field("public_key", &self.public_key_hex())
            .field("signature", &hex::encode(self.signature))
            .finish()
    }
}

/// Unsigned transaction as returned by the resolver, plus attached witnesses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    /// Decoded payload bytes
    payload: Vec<u8>,
    /// Encoding used on the wire
    encoding: PayloadEncoding,
    /// Protocol version the payload was produced under
    version: String,
    /// Witnesses in attachment order
    witnesses: Vec<Witness>,
}

impl TransactionEnvelope {
    pub fn new(payload: Vec<u8>, encoding: PayloadEncoding, version: impl Into<String>) -> Self {
        TransactionEnvelope {
            payload,
            encoding,
            version: version.into(),
            witnesses: Vec::new(),
        }
    }

    /// Create from the wire text form
    pub fn from_wire(
        payload: &str,
        encoding: PayloadEncoding,
        version: impl Into<String>,
    ) -> Result<Self, WasmTrpError> {
        let bytes = encoding.decode(payload)?;
        if bytes.is_empty() {
            return Err(WasmTrpError::InvalidInput(
                "Empty transaction payload".to_string(),
            ));
        }
        Ok(Self::new(bytes, encoding, version))
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload in its wire encoding
    pub fn payload_text(&self) -> String {
        self.encoding.encode(&self.payload)
    }

    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn witnesses(&self) -> &[Witness] {
        &self.witnesses
    }

    pub fn is_signed(&self) -> bool {
        !self.witnesses.is_empty()
    }

    pub fn has_witness_for(&self, public_key: &[u8]) -> bool {
        self.witnesses
            .iter()
            .any(|w| w.public_key.as_slice() == public_key)
    }

    /// Append a witness, rejecting a second witness for the same key
    pub fn add_witness(&mut self, witness: Witness) -> Result<(), SigningError> {
        if self.has_witness_for(witness.public_key()) {
            return Err(SigningError::DuplicateWitness(witness.public_key_hex()));
        }
        self.witnesses.push(witness);
        Ok(())
    }
}

/// Fully assembled transaction ready for `trp.submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub payload: Vec<u8>,
    pub encoding: PayloadEncoding,
    pub version: String,
    pub hash: TxHash,
}

impl SignedTransaction {
    pub fn payload_text(&self) -> String {
        self.encoding.encode(&self.payload)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}
