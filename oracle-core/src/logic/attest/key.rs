//! Enclave Key Custody
//!
//! The signing key is loaded once at startup and never leaves this module:
//! there is no accessor for its bytes, `Debug` is redacted, and every
//! intermediate seed buffer is zeroized.

use std::path::{Path, PathBuf};

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::signer::SigningError;

pub const KEY_SOURCE_ENV: &str = "ORACLE_KEY_SOURCE";
pub const SEALED_KEY_PATH_ENV: &str = "ORACLE_SEALED_KEY_PATH";
pub const SIGNING_KEY_HEX_ENV: &str = "ORACLE_SIGNING_KEY_HEX";

const SEED_LEN: usize = 32;

// ============================================================================
// ERRORS
// ============================================================================

/// Provisioning failures. Messages never carry key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("unknown key source '{0}'; expected sealed_file, env or ephemeral")]
    UnknownSource(String),

    #[error("{0} is required for this key source")]
    Missing(&'static str),

    #[error("cannot read sealed key at {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("key material must be 32 raw bytes or 64 hex characters")]
    Malformed,

    #[error("ephemeral signing keys are refused in production")]
    EphemeralInProduction,
}

// ============================================================================
// SOURCES
// ============================================================================

/// Where the enclave key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Sealed file: 32 raw bytes or 64 hex characters
    SealedFile(PathBuf),
    /// `ORACLE_SIGNING_KEY_HEX` (development)
    EnvHex,
    /// Fresh random key per process (development only)
    Ephemeral,
}

impl KeySource {
    /// Resolve from `ORACLE_KEY_SOURCE`. When unset, a configured sealed
    /// path wins, then an env key, then ephemeral.
    pub fn from_env() -> Result<Self, KeyError> {
        let sealed_path = || {
            std::env::var(SEALED_KEY_PATH_ENV)
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        };

        match std::env::var(KEY_SOURCE_ENV) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "sealed_file" | "file" => sealed_path()
                    .map(KeySource::SealedFile)
                    .ok_or(KeyError::Missing(SEALED_KEY_PATH_ENV)),
                "env" => Ok(KeySource::EnvHex),
                "ephemeral" => Ok(KeySource::Ephemeral),
                other => Err(KeyError::UnknownSource(other.to_string())),
            },
            Err(_) => Ok(match sealed_path() {
                Some(path) => KeySource::SealedFile(path),
                None if std::env::var(SIGNING_KEY_HEX_ENV).is_ok() => KeySource::EnvHex,
                None => KeySource::Ephemeral,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::SealedFile(_) => "sealed_file",
            KeySource::EnvHex => "env",
            KeySource::Ephemeral => "ephemeral",
        }
    }

    /// Provision the key. Ephemeral keys are refused when `production`.
    pub fn load(&self, production: bool) -> Result<EnclaveKey, KeyError> {
        let key = match self {
            KeySource::SealedFile(path) => EnclaveKey::from_sealed_file(path)?,
            KeySource::EnvHex => {
                let value = Zeroizing::new(
                    std::env::var(SIGNING_KEY_HEX_ENV).map_err(|_| KeyError::Missing(SIGNING_KEY_HEX_ENV))?,
                );
                EnclaveKey::from_hex(&value)?
            }
            KeySource::Ephemeral if production => return Err(KeyError::EphemeralInProduction),
            KeySource::Ephemeral => EnclaveKey::ephemeral(),
        };

        tracing::info!(
            source = self.as_str(),
            public_key = %key.public_key_hex(),
            "enclave signing key provisioned"
        );
        Ok(key)
    }
}

// ============================================================================
// ENCLAVE KEY
// ============================================================================

/// Ed25519 signing key held for the process lifetime.
///
/// `seal` wipes the secret; every later signature fails with
/// `SigningError::KeyUnavailable`.
pub struct EnclaveKey {
    signing: RwLock<Option<SigningKey>>,
    verifying: VerifyingKey,
}

impl std::fmt::Debug for EnclaveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnclaveKey")
            .field("public_key", &self.public_key_hex())
            .field("sealed", &self.is_sealed())
            .finish_non_exhaustive()
    }
}

impl EnclaveKey {
    fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        let signing = SigningKey::from_bytes(seed);
        let verifying = signing.verifying_key();
        Self {
            signing: RwLock::new(Some(signing)),
            verifying,
        }
    }

    /// Random key, for development
    pub fn ephemeral() -> Self {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng.fill_bytes(&mut seed[..]);
        Self::from_seed(&seed)
    }

    /// 32 raw bytes, or 64 hex characters (surrounding whitespace ignored)
    pub fn from_material(material: &[u8]) -> Result<Self, KeyError> {
        if material.len() == SEED_LEN {
            let mut seed = Zeroizing::new([0u8; SEED_LEN]);
            seed.copy_from_slice(material);
            return Ok(Self::from_seed(&seed));
        }

        let text = std::str::from_utf8(material).map_err(|_| KeyError::Malformed)?;
        Self::from_hex(text)
    }

    /// 64 hex characters, optional `0x`
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let text = text.trim();
        let text = text.strip_prefix("0x").unwrap_or(text);
        if text.len() != SEED_LEN * 2 {
            return Err(KeyError::Malformed);
        }

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        hex::decode_to_slice(text, &mut seed[..]).map_err(|_| KeyError::Malformed)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn from_sealed_file(path: &Path) -> Result<Self, KeyError> {
        let material = Zeroizing::new(std::fs::read(path).map_err(|e| KeyError::Unreadable {
            path: path.display().to_string(),
            reason: e.kind().to_string(),
        })?);
        Self::from_material(&material)
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// Lowercase hex, no prefix
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying.as_bytes())
    }

    pub fn is_sealed(&self) -> bool {
        self.signing.read().is_none()
    }

    /// Wipe the secret. Irreversible.
    pub fn seal(&self) {
        // SigningKey zeroizes itself on drop
        let wiped = self.signing.write().take().is_some();
        if wiped {
            tracing::info!(public_key = %self.public_key_hex(), "enclave signing key sealed");
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        let guard = self.signing.read();
        let key = guard.as_ref().ok_or(SigningError::KeyUnavailable)?;
        key.try_sign(message)
            .map_err(|_| SigningError::Signature("ed25519 signing failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC_HEX: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn test_hex_material() {
        let key = EnclaveKey::from_material(SEED_HEX.as_bytes()).unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC_HEX);

        let prefixed = format!("0x{}\n", SEED_HEX);
        let key = EnclaveKey::from_material(prefixed.as_bytes()).unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC_HEX);
    }

    #[test]
    fn test_raw_sealed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&hex::decode(SEED_HEX).unwrap()).unwrap();

        let key = KeySource::SealedFile(file.path().to_path_buf()).load(true).unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC_HEX);
    }

    #[test]
    fn test_malformed_material() {
        assert_eq!(EnclaveKey::from_material(b"abc").unwrap_err(), KeyError::Malformed);
        assert_eq!(
            EnclaveKey::from_material("zz".repeat(32).as_bytes()).unwrap_err(),
            KeyError::Malformed
        );
    }

    #[test]
    fn test_missing_sealed_file() {
        let err = KeySource::SealedFile(PathBuf::from("/nonexistent/oracle.key"))
            .load(false)
            .unwrap_err();
        assert!(matches!(err, KeyError::Unreadable { .. }));
    }

    #[test]
    fn test_ephemeral_refused_in_production() {
        assert_eq!(
            KeySource::Ephemeral.load(true).unwrap_err(),
            KeyError::EphemeralInProduction
        );
        assert!(KeySource::Ephemeral.load(false).is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EnclaveKey::from_material(SEED_HEX.as_bytes()).unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains(PUBLIC_HEX));
        assert!(!rendered.contains(SEED_HEX));
    }

    #[test]
    fn test_sealed_key_cannot_sign() {
        let key = EnclaveKey::ephemeral();
        assert!(key.sign(b"payload").is_ok());
        key.seal();
        assert!(key.is_sealed());
        assert_eq!(key.sign(b"payload").unwrap_err(), SigningError::KeyUnavailable);
    }
}
