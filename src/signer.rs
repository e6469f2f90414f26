//! Witness production and attachment
//!
//! The signer never builds or edits transactions. It hashes the payload through
//! its [`LedgerCodec`], signs that hash, and appends witnesses to the envelope.

use crate::codec::{CardanoCodec, LedgerCodec};
use crate::credential::Credential;
use crate::envelope::{SignedTransaction, TransactionEnvelope, TxHash, Witness};
use crate::error::SigningError;
use ed25519_dalek::{Signature, VerifyingKey};

/// Signs envelopes for one ledger
#[derive(Debug, Clone, Default)]
pub struct Signer<C: LedgerCodec = CardanoCodec> {
    codec: C,
}

impl Signer<CardanoCodec> {
    pub fn cardano() -> Self {
        Signer {
            codec: CardanoCodec,
        }
    }
}

impl<C: LedgerCodec> Signer<C> {
    pub fn new(codec: C) -> Self {
        Signer { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Canonical hash of the envelope payload
    pub fn hash(&self, envelope: &TransactionEnvelope) -> Result<TxHash, SigningError> {
        self.codec.tx_hash(envelope.payload())
    }

    /// Produce a witness for `envelope` with `credential`
    ///
    /// Ed25519 signatures are deterministic, so signing the same envelope twice
    /// yields the same witness.
    pub fn sign(
        &self,
        envelope: &TransactionEnvelope,
        credential: &Credential,
    ) -> Result<Witness, SigningError> {
        let hash = self.hash(envelope)?;
        let signature = credential.sign_hash(&hash);
        Witness::new(&credential.public_key(), &signature)
    }

    /// Append a witness, returning the updated envelope
    pub fn attach(
        &self,
        mut envelope: TransactionEnvelope,
        witness: Witness,
    ) -> Result<TransactionEnvelope, SigningError> {
        self.add_witness(&mut envelope, witness)?;
        Ok(envelope)
    }

    /// Append a witness in place
    ///
    /// A key is rejected when it already witnesses the envelope, whether it was
    /// attached locally or came back from the resolver inside the payload.
    pub fn add_witness(
        &self,
        envelope: &mut TransactionEnvelope,
        witness: Witness,
    ) -> Result<(), SigningError> {
        let carried = self.codec.witnesses_in(envelope.payload())?;
        if carried.iter().any(|w| w.public_key() == witness.public_key()) {
            return Err(SigningError::DuplicateWitness(witness.public_key_hex()));
        }
        envelope.add_witness(witness)
    }

    pub fn sign_and_attach(
        &self,
        envelope: TransactionEnvelope,
        credential: &Credential,
    ) -> Result<TransactionEnvelope, SigningError> {
        let witness = self.sign(&envelope, credential)?;
        self.attach(envelope, witness)
    }

    /// Check that `witness` is a valid signature over this envelope's hash
    pub fn verify(
        &self,
        envelope: &TransactionEnvelope,
        witness: &Witness,
    ) -> Result<bool, SigningError> {
        let hash = self.hash(envelope)?;
        let key = VerifyingKey::from_bytes(witness.public_key())
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        let signature = Signature::from_bytes(witness.signature());
        Ok(key.verify_strict(&hash, &signature).is_ok())
    }

    /// Assemble the submittable payload from the envelope and its witnesses
    pub fn finalize(&self, envelope: &TransactionEnvelope) -> Result<SignedTransaction, SigningError> {
        let hash = self.hash(envelope)?;
        let payload = self.codec.assemble(envelope.payload(), envelope.witnesses())?;
        Ok(SignedTransaction {
            payload,
            encoding: envelope.encoding(),
            version: envelope.version().to_string(),
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{admin_credential, sample_envelope};
    use crate::types::NetworkTag;

    #[test]
    fn test_signing_is_deterministic() {
        let signer = Signer::cardano();
        let envelope = sample_envelope();
        let credential = admin_credential();
        let a = signer.sign(&envelope, &credential).unwrap();
        let b = signer.sign(&envelope, &credential).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.public_key(), &credential.public_key());
        assert!(signer.verify(&envelope, &a).unwrap());
    }

    #[test]
    fn test_duplicate_witness() {
        let signer = Signer::cardano();
        let credential = admin_credential();
        let envelope = signer
            .sign_and_attach(sample_envelope(), &credential)
            .unwrap();
        let err = signer.sign_and_attach(envelope, &credential).unwrap_err();
        assert!(matches!(err, SigningError::DuplicateWitness(_)));
    }

    #[test]
    fn test_duplicate_of_witness_carried_in_payload() {
        let signer = Signer::cardano();
        let credential = admin_credential();
        let signed = signer
            .finalize(&signer.sign_and_attach(sample_envelope(), &credential).unwrap())
            .unwrap();

        // resolver hands back a payload that already carries the admin witness
        let envelope = TransactionEnvelope::new(signed.payload, signed.encoding, signed.version);
        assert!(!envelope.is_signed());
        let err = signer.sign_and_attach(envelope.clone(), &credential).unwrap_err();
        assert!(matches!(err, SigningError::DuplicateWitness(_)));

        // a different key is still accepted and finalizes with both witnesses
        let other = Credential::generate(NetworkTag::Testnet).unwrap();
        let envelope = signer.sign_and_attach(envelope, &other).unwrap();
        let payload = signer.finalize(&envelope).unwrap().payload;
        let keys: Vec<[u8; 32]> = signer
            .codec()
            .witnesses_in(&payload)
            .unwrap()
            .iter()
            .map(|w| *w.public_key())
            .collect();
        assert_eq!(keys, vec![credential.public_key(), other.public_key()]);
    }

    #[test]
    fn test_distinct_keys_keep_order() {
        let signer = Signer::cardano();
        let first = Credential::generate(NetworkTag::Testnet).unwrap();
        let second = Credential::generate(NetworkTag::Testnet).unwrap();
        let envelope = signer.sign_and_attach(sample_envelope(), &first).unwrap();
        let envelope = signer.sign_and_attach(envelope, &second).unwrap();

        let keys: Vec<[u8; 32]> = envelope.witnesses().iter().map(|w| *w.public_key()).collect();
        assert_eq!(keys, vec![first.public_key(), second.public_key()]);

        let signed = signer.finalize(&envelope).unwrap();
        assert_eq!(signed.hash, signer.hash(&envelope).unwrap());
        assert_eq!(
            signer.codec().witnesses_in(&signed.payload).unwrap(),
            envelope.witnesses()
        );
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        let signer = Signer::cardano();
        let envelope = sample_envelope();
        let credential = admin_credential();
        let witness = signer.sign(&envelope, &credential).unwrap();

        let mut other = witness.signature().to_vec();
        other[0] ^= 0xff;
        let tampered = Witness::new(witness.public_key(), &other).unwrap();
        assert!(!signer.verify(&envelope, &tampered).unwrap());
    }

    #[test]
    fn test_unsigned_finalize_keeps_payload() {
        let signer = Signer::cardano();
        let envelope = sample_envelope();
        let signed = signer.finalize(&envelope).unwrap();
        assert_eq!(signed.payload, envelope.payload());
    }
}
