//! Account key material read from genesis artifacts.
//!
//! Keys are read from the cluster's on-disk storage, never generated here.
//! Validator keys live at `validators/validator-{i}/private-keys.yaml` and
//! the root account key at
//! `genesis-artifacts/root-account-private-keys.yaml`, both written by the
//! genesis tooling that builds the validator image.

use ed25519_dalek::{Signature, Signer, SigningKey};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Errors while loading or using account key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Key file missing or unreadable.
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Expected field missing from the key file.
    #[error("failed to parse {field} from {path}")]
    MissingField { field: &'static str, path: String },

    /// Key or address is not valid hex.
    #[error("invalid hex in {field}: {source}")]
    BadHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    /// Private key has the wrong length for ed25519.
    #[error("private key must be 32 bytes, got {0}")]
    BadKeyLength(usize),
}

/// An account address plus its ed25519 signing key.
pub struct AccountKey {
    /// Account address, lowercase hex without `0x` prefix.
    pub address: String,
    signing_key: SigningKey,
}

impl AccountKey {
    /// Parse account key material from a `private-keys.yaml` file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, KeyError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&content, &display)
    }

    /// Parse account key material from key-file contents.
    pub fn from_yaml(content: &str, path: &str) -> Result<Self, KeyError> {
        let addr_re = Regex::new(r"account_address:\s*([a-fA-F0-9]+)").expect("static regex");
        let key_re =
            Regex::new(r#"account_private_key:\s*"(0x[a-fA-F0-9]+)""#).expect("static regex");

        let address = addr_re
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase())
            .ok_or_else(|| KeyError::MissingField {
                field: "account_address",
                path: path.to_string(),
            })?;

        let private_key = key_re
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| KeyError::MissingField {
                field: "account_private_key",
                path: path.to_string(),
            })?;

        let key_bytes =
            hex::decode(private_key.trim_start_matches("0x")).map_err(|source| KeyError::BadHex {
                field: "account_private_key",
                source,
            })?;
        let key_bytes: [u8; 32] = key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::BadKeyLength(key_bytes.len()))?;

        Ok(Self {
            address,
            signing_key: SigningKey::from_bytes(&key_bytes),
        })
    }

    /// Sign a message with this account's key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Public key, lowercase hex without `0x` prefix.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print private key material.
        f.debug_struct("AccountKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;
    use std::io::Write;

    const SAMPLE: &str = r#"---
account_address: A550C18A550C18A550C18A550C18A550C18A550C18A550C18A550C18A550C18
account_private_key: "0x0101010101010101010101010101010101010101010101010101010101010101"
consensus_private_key: "0x0202020202020202020202020202020202020202020202020202020202020202"
"#;

    #[test]
    fn test_parse_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let key = AccountKey::from_yaml_file(file.path()).unwrap();
        assert_eq!(
            key.address,
            "a550c18a550c18a550c18a550c18a550c18a550c18a550c18a550c18a550c18"
        );
        assert_eq!(key.public_key_hex().len(), 64);
    }

    #[test]
    fn test_signature_verifies() {
        let key = AccountKey::from_yaml(SAMPLE, "inline").unwrap();
        let signature = key.sign(b"payload");

        let public = hex::decode(key.public_key_hex()).unwrap();
        let verifying =
            ed25519_dalek::VerifyingKey::from_bytes(&public.try_into().unwrap()).unwrap();
        verifying.verify(b"payload", &signature).unwrap();
    }

    #[test]
    fn test_missing_address_is_an_error() {
        let err = AccountKey::from_yaml("account_private_key: \"0x01\"", "inline").unwrap_err();
        assert!(matches!(
            err,
            KeyError::MissingField {
                field: "account_address",
                ..
            }
        ));
    }

    #[test]
    fn test_short_key_is_an_error() {
        let content = "account_address: ab\naccount_private_key: \"0x0102\"\n";
        let err = AccountKey::from_yaml(content, "inline").unwrap_err();
        assert!(matches!(err, KeyError::BadKeyLength(2)));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = AccountKey::from_yaml(SAMPLE, "inline").unwrap();
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("0101"));
    }
}
