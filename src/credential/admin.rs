//! Admin credential files
//!
//! The operator identity lives in a directory holding two files:
//! `user.sk`, a JSON text envelope whose `cborHex` is a CBOR byte string with
//! the 32-byte Ed25519 key, and `user.addr`, the bech32 address for that key.

use super::Credential;
use crate::address::{key_hash, Address};
use crate::error::CredentialError;
use pallas_codec::minicbor::{Decoder, Encoder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const SIGNING_KEY_FILE: &str = "user.sk";
pub const ADDRESS_FILE: &str = "user.addr";

const KEY_TYPE: &str = "PaymentSigningKeyShelley_ed25519";
const KEY_DESCRIPTION: &str = "Payment Signing Key";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextEnvelope {
    #[serde(rename = "type")]
    key_type: String,
    #[serde(default)]
    description: String,
    cbor_hex: String,
}

/// Load the admin credential from `dir`
pub fn load_admin_credential(dir: &Path) -> Result<Credential, CredentialError> {
    let read = |name: &str| {
        fs::read_to_string(dir.join(name)).map_err(|e| {
            CredentialError::Unavailable(format!("{}: {}", dir.join(name).display(), e))
        })
    };
    let signing_key = read(SIGNING_KEY_FILE)?;
    let address = read(ADDRESS_FILE)?;
    let credential = parse_admin_credential(&signing_key, &address)?;
    tracing::info!(
        address = %address.trim(),
        "loaded admin credential"
    );
    Ok(credential)
}

/// Parse the contents of `user.sk` and `user.addr`
///
/// The address must carry the payment key hash of the signing key.
pub fn parse_admin_credential(
    signing_key_json: &str,
    address_text: &str,
) -> Result<Credential, CredentialError> {
    let envelope: TextEnvelope = serde_json::from_str(signing_key_json).map_err(|e| {
        CredentialError::Unavailable(format!("{} is not a text envelope: {}", SIGNING_KEY_FILE, e))
    })?;
    let cbor_bytes = hex::decode(envelope.cbor_hex.trim()).map_err(|e| {
        CredentialError::Unavailable(format!("{} cborHex is not hex: {}", SIGNING_KEY_FILE, e))
    })?;

    let mut decoder = Decoder::new(&cbor_bytes);
    let secret = decoder
        .bytes()
        .map_err(|e| CredentialError::Unavailable(format!("{}: {}", SIGNING_KEY_FILE, e)))?;
    if decoder.position() != cbor_bytes.len() {
        return Err(CredentialError::Unavailable(format!(
            "{} has trailing bytes after the key",
            SIGNING_KEY_FILE
        )));
    }

    let address = Address::from_bech32(address_text)
        .map_err(|e| CredentialError::Unavailable(format!("{}: {}", ADDRESS_FILE, e)))?;
    let credential = Credential::from_secret_key(secret, address.network_tag())
        .map_err(|e| CredentialError::Unavailable(format!("{}: {}", SIGNING_KEY_FILE, e)))?;

    if address.payment_key_hash() != Some(key_hash(&credential.public_key())) {
        return Err(CredentialError::Unavailable(format!(
            "{} does not belong to the key in {}",
            ADDRESS_FILE, SIGNING_KEY_FILE
        )));
    }

    Ok(credential.with_address(address))
}

/// Write `user.sk` and `user.addr` for `credential` into `dir`
pub fn write_admin_credential(dir: &Path, credential: &Credential) -> Result<(), CredentialError> {
    let mut encoder = Encoder::new(Vec::with_capacity(34));
    encoder
        .bytes(&credential.secret_key_bytes())
        .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
    let key_cbor = encoder.into_writer();
    let envelope = TextEnvelope {
        key_type: KEY_TYPE.to_string(),
        description: KEY_DESCRIPTION.to_string(),
        cbor_hex: hex::encode(key_cbor),
    };
    let json = serde_json::to_string_pretty(&envelope)
        .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
    let address = credential
        .address()
        .to_bech32()
        .map_err(|e| CredentialError::Unavailable(e.to_string()))?;

    let unavailable = |name: &str, e: io::Error| {
        CredentialError::Unavailable(format!("{}: {}", dir.join(name).display(), e))
    };
    fs::create_dir_all(dir)
        .map_err(|e| CredentialError::Unavailable(format!("{}: {}", dir.display(), e)))?;
    write_private(&dir.join(SIGNING_KEY_FILE), &json)
        .map_err(|e| unavailable(SIGNING_KEY_FILE, e))?;
    fs::write(dir.join(ADDRESS_FILE), &address).map_err(|e| unavailable(ADDRESS_FILE, e))
}

/// Write a file readable by its owner only
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // an existing file keeps its old mode on open
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ADMIN_ADDRESS, ADMIN_PUBLIC_KEY_HEX, ADMIN_SIGNING_KEY_JSON};
    use crate::types::NetworkTag;

    #[test]
    fn test_parse_admin_credential() {
        let credential =
            parse_admin_credential(ADMIN_SIGNING_KEY_JSON, &format!("{}\n", ADMIN_ADDRESS)).unwrap();
        assert_eq!(credential.public_key_hex(), ADMIN_PUBLIC_KEY_HEX);
        assert_eq!(credential.network(), NetworkTag::Testnet);
        assert_eq!(credential.address().to_bech32().unwrap(), ADMIN_ADDRESS);
    }

    #[test]
    fn test_mismatched_address_rejected() {
        let other = Credential::generate(NetworkTag::Testnet).unwrap();
        let err = parse_admin_credential(
            ADMIN_SIGNING_KEY_JSON,
            &other.address().to_bech32().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, CredentialError::Unavailable(_)));
    }

    #[test]
    fn test_malformed_files() {
        assert!(parse_admin_credential("not json", ADMIN_ADDRESS).is_err());
        let short = r#"{"type": "x", "cborHex": "5810aabb"}"#;
        assert!(parse_admin_credential(short, ADMIN_ADDRESS).is_err());
        assert!(parse_admin_credential(ADMIN_SIGNING_KEY_JSON, "addr_test1xyz").is_err());
    }

    #[test]
    fn test_missing_directory() {
        let err = load_admin_credential(Path::new("/nonexistent/wasm-trp-admin")).unwrap_err();
        assert!(matches!(err, CredentialError::Unavailable(_)));
    }

    #[test]
    fn test_write_then_load() {
        let dir = std::env::temp_dir().join(format!("wasm-trp-admin-{}", std::process::id()));
        let credential = Credential::generate(NetworkTag::Testnet).unwrap();
        write_admin_credential(&dir, &credential).unwrap();

        let loaded = load_admin_credential(&dir).unwrap();
        assert_eq!(loaded.public_key(), credential.public_key());
        assert_eq!(loaded.address(), credential.address());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_signing_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("wasm-trp-admin-mode-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        // pre-existing world-readable key gets tightened on overwrite
        fs::write(dir.join(SIGNING_KEY_FILE), "{}").unwrap();
        fs::set_permissions(dir.join(SIGNING_KEY_FILE), fs::Permissions::from_mode(0o644)).unwrap();

        let credential = Credential::generate(NetworkTag::Testnet).unwrap();
        write_admin_credential(&dir, &credential).unwrap();

        let mode = fs::metadata(dir.join(SIGNING_KEY_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            load_admin_credential(&dir).unwrap().public_key(),
            credential.public_key()
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
