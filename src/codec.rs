//! Ledger codec: canonical transaction hash and witness-set assembly
//!
//! The signer is ledger agnostic; everything that depends on the transaction
//! byte layout lives behind [`LedgerCodec`]. The Cardano implementation decodes
//! transactions with pallas and splices the witness set so that the body bytes,
//! and therefore the hash, survive signing untouched.

use crate::envelope::{TxHash, Witness};
use crate::error::SigningError;
use pallas_codec::minicbor::data::{Tag, Type};
use pallas_codec::minicbor::{Decoder, Encoder};
use pallas_primitives::alonzo::VKeyWitness;
use pallas_traverse::{Era, MultiEraTx};

/// Witness set key holding verification key witnesses
const VKEY_WITNESSES: u64 = 0;
/// CBOR tag for sets, used by Conway witness sets
const SET_TAG: u64 = 258;

/// Ledger-specific transaction hashing and witness assembly
pub trait LedgerCodec: Send + Sync {
    /// Canonical hash that witnesses sign over
    fn tx_hash(&self, payload: &[u8]) -> Result<TxHash, SigningError>;

    /// Verification key witnesses already carried by the payload
    fn witnesses_in(&self, payload: &[u8]) -> Result<Vec<Witness>, SigningError>;

    /// Produce the submittable transaction bytes with `witnesses` added
    fn assemble(&self, payload: &[u8], witnesses: &[Witness]) -> Result<Vec<u8>, SigningError>;
}

/// Cardano (Shelley and later) transaction codec
#[derive(Debug, Clone, Copy, Default)]
pub struct CardanoCodec;

fn decode_tx(payload: &[u8]) -> Result<MultiEraTx<'_>, SigningError> {
    let tx = MultiEraTx::decode(payload).map_err(|e| {
        SigningError::MalformedPayload(format!("Failed to decode transaction: {}", e))
    })?;
    if tx.era() == Era::Byron {
        return Err(SigningError::MalformedPayload(
            "Byron transactions are not supported".to_string(),
        ));
    }
    Ok(tx)
}

/// Decoded witness set: set tag, vkey witnesses, and the raw bytes of every other entry
struct WitnessSet<'a> {
    tagged: bool,
    vkeys: Vec<VKeyWitness>,
    others: Vec<(u64, &'a [u8])>,
}

fn read_witness_set<'a>(
    payload: &'a [u8],
    decoder: &mut Decoder<'a>,
) -> Result<WitnessSet<'a>, SigningError> {
    let mut set = WitnessSet {
        tagged: false,
        vkeys: Vec::new(),
        others: Vec::new(),
    };
    let mut remaining = decoder.map()?;
    loop {
        match remaining {
            Some(0) => break,
            Some(n) => remaining = Some(n - 1),
            None => {
                if decoder.datatype()? == Type::Break {
                    // indefinite map terminator
                    decoder.set_position(decoder.position() + 1);
                    break;
                }
            }
        }
        let key = decoder.u64()?;
        if key == VKEY_WITNESSES {
            if decoder.datatype()? == Type::Tag {
                set.tagged = decoder.tag()? == Tag::new(SET_TAG);
            }
            set.vkeys = decoder.decode()?;
        } else {
            let start = decoder.position();
            decoder.skip()?;
            set.others.push((key, &payload[start..decoder.position()]));
        }
    }
    Ok(set)
}

fn encode_witness_set(set: &WitnessSet<'_>, added: &[Witness]) -> Result<Vec<u8>, SigningError> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.map(set.others.len() as u64 + 1)?;
    encoder.u64(VKEY_WITNESSES)?;
    if set.tagged {
        encoder.tag(Tag::new(SET_TAG))?;
    }
    encoder.array((set.vkeys.len() + added.len()) as u64)?;
    for vkey in &set.vkeys {
        encoder.encode(vkey)?;
    }
    for witness in added {
        encoder.encode(witness.to_vkey_witness())?;
    }
    for (key, raw) in &set.others {
        encoder.u64(*key)?;
        encoder.writer_mut().extend_from_slice(raw);
    }
    Ok(encoder.into_writer())
}

impl LedgerCodec for CardanoCodec {
    fn tx_hash(&self, payload: &[u8]) -> Result<TxHash, SigningError> {
        Ok(*decode_tx(payload)?.hash())
    }

    fn witnesses_in(&self, payload: &[u8]) -> Result<Vec<Witness>, SigningError> {
        decode_tx(payload)?
            .vkey_witnesses()
            .iter()
            .map(|w| Witness::new(&w.vkey, &w.signature))
            .collect()
    }

    fn assemble(&self, payload: &[u8], witnesses: &[Witness]) -> Result<Vec<u8>, SigningError> {
        let existing = self.witnesses_in(payload)?;
        if witnesses.is_empty() {
            return Ok(payload.to_vec());
        }
        for (i, witness) in witnesses.iter().enumerate() {
            let key = witness.public_key();
            if existing.iter().chain(&witnesses[..i]).any(|w| w.public_key() == key) {
                return Err(SigningError::DuplicateWitness(witness.public_key_hex()));
            }
        }

        // [body, witness_set, ...]; everything but the witness set is copied verbatim
        let mut decoder = Decoder::new(payload);
        decoder.array()?;
        decoder.skip()?;
        let set_start = decoder.position();
        let set = read_witness_set(payload, &mut decoder)?;
        let set_end = decoder.position();
        let witness_set = encode_witness_set(&set, witnesses)?;

        let mut out = Vec::with_capacity(payload.len() - (set_end - set_start) + witness_set.len());
        out.extend_from_slice(&payload[..set_start]);
        out.extend_from_slice(&witness_set);
        out.extend_from_slice(&payload[set_end..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SAMPLE_TX_BODY_HEX, SAMPLE_TX_HASH_HEX, SAMPLE_TX_HEX};

    fn witness(byte: u8) -> Witness {
        Witness::new(&[byte; 32], &[byte; 64]).unwrap()
    }

    /// Sample transaction with a custom witness set
    fn with_witness_set(witness_set: &[u8]) -> Vec<u8> {
        let mut payload = vec![0x84];
        payload.extend_from_slice(&hex::decode(SAMPLE_TX_BODY_HEX).unwrap());
        payload.extend_from_slice(witness_set);
        payload.extend_from_slice(&[0xf5, 0xf6]);
        payload
    }

    #[test]
    fn test_tx_hash_is_body_hash() {
        let payload = hex::decode(SAMPLE_TX_HEX).unwrap();
        assert_eq!(
            hex::encode(CardanoCodec.tx_hash(&payload).unwrap()),
            SAMPLE_TX_HASH_HEX
        );
    }

    #[test]
    fn test_assemble_adds_witness_set_entry() {
        let payload = hex::decode(SAMPLE_TX_HEX).unwrap();
        let signed = CardanoCodec
            .assemble(&payload, &[witness(1), witness(2)])
            .unwrap();

        // body is untouched, so the hash is stable across signing
        assert_eq!(
            hex::encode(CardanoCodec.tx_hash(&signed).unwrap()),
            SAMPLE_TX_HASH_HEX
        );
        let found = CardanoCodec.witnesses_in(&signed).unwrap();
        assert_eq!(found, vec![witness(1), witness(2)]);
        // is_valid and auxiliary data carried over
        assert_eq!(&signed[signed.len() - 2..], &[0xf5, 0xf6]);
    }

    #[test]
    fn test_assemble_appends_to_tagged_set() {
        // {0: 258([w7]), 4: [42]}
        let mut witness_set = vec![0xa2, 0x00, 0xd9, 0x01, 0x02, 0x81];
        witness_set.extend_from_slice(&witness(7).to_cbor().unwrap());
        witness_set.extend_from_slice(&[0x04, 0x81, 0x18, 0x2a]);
        let payload = with_witness_set(&witness_set);

        let signed = CardanoCodec.assemble(&payload, &[witness(3)]).unwrap();
        assert_eq!(
            CardanoCodec.witnesses_in(&signed).unwrap(),
            vec![witness(7), witness(3)]
        );
        let body_len = SAMPLE_TX_BODY_HEX.len() / 2;
        // tag preserved
        let tag_at = 1 + body_len + 2;
        assert_eq!(&signed[tag_at..tag_at + 3], &[0xd9, 0x01, 0x02]);
        // plutus data entry copied verbatim
        assert_eq!(&signed[signed.len() - 6..], &[0x04, 0x81, 0x18, 0x2a, 0xf5, 0xf6]);
    }

    #[test]
    fn test_assemble_rejects_key_already_in_payload() {
        let payload = CardanoCodec
            .assemble(&hex::decode(SAMPLE_TX_HEX).unwrap(), &[witness(5)])
            .unwrap();
        let err = CardanoCodec.assemble(&payload, &[witness(5)]).unwrap_err();
        assert!(matches!(err, SigningError::DuplicateWitness(_)));

        let err = CardanoCodec
            .assemble(&payload, &[witness(6), witness(6)])
            .unwrap_err();
        assert!(matches!(err, SigningError::DuplicateWitness(_)));
    }

    #[test]
    fn test_assemble_without_witnesses_is_identity() {
        let payload = hex::decode(SAMPLE_TX_HEX).unwrap();
        assert_eq!(CardanoCodec.assemble(&payload, &[]).unwrap(), payload);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(CardanoCodec.tx_hash(&[]).is_err());
        // array of one element
        assert!(CardanoCodec.tx_hash(&[0x81, 0xa0]).is_err());
        // not an array
        assert!(CardanoCodec.tx_hash(&[0xa0]).is_err());
        // truncated body
        assert!(CardanoCodec.tx_hash(&[0x84, 0xa3, 0x00]).is_err());
        assert!(CardanoCodec.witnesses_in(&[0x84, 0xa3, 0x00]).is_err());
    }
}
