//! In-memory secret sealing using AES-256-GCM
//!
//! Secrets held by the accessor are encrypted with a key derived from the
//! process memory key. Every seal draws a fresh random salt and nonce; the
//! per-secret key is derived from the memory key and the salt with
//! HKDF-SHA256, and the secret name is bound as associated data.
//!
//! ## Configuration
//!
//! The memory key is loaded from `MEMORY_ENCRYPTION_KEY` (base64-encoded
//! 32 bytes). It is required whenever the accessor is enabled; there is no
//! random fallback, so a restarted process can reproduce its configuration.

use base64::Engine;
use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::error::{Result, SecretsError};
use super::types::SecretString;

/// Environment variable holding the base64 memory key
pub const MEMORY_KEY_ENV: &str = "MEMORY_ENCRYPTION_KEY";

/// Size of AES-256-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of the per-secret HKDF salt in bytes
pub const SALT_SIZE: usize = 16;

const KEY_SIZE: usize = 32;

const HKDF_INFO: &[u8] = b"consult-sweeper/memory-secret/v1";

/// An at-rest-in-memory secret: ciphertext plus everything needed to open it
/// except the memory key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptedSecret {
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub salt: [u8; SALT_SIZE],
    pub tag: [u8; TAG_SIZE],
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("name", &self.name)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self { nonce: Some(nonce_bytes) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// Seals and opens secrets with the process memory key
#[derive(Clone)]
pub struct MemoryCipher {
    key_bytes: Arc<Zeroizing<[u8; KEY_SIZE]>>,
    rng: Arc<SystemRandom>,
}

impl MemoryCipher {
    /// Build a cipher from a base64-encoded 32-byte key
    pub fn from_base64(key_base64: &SecretString) -> Result<Self> {
        let decoded = Zeroizing::new(
            base64::engine::general_purpose::STANDARD
                .decode(key_base64.expose_secret().trim())
                .map_err(|e| {
                    SecretsError::config_error(format!("Invalid base64 in {}: {}", MEMORY_KEY_ENV, e))
                })?,
        );

        if decoded.len() != KEY_SIZE {
            return Err(SecretsError::config_error(format!(
                "{} must be {} bytes (256 bits), got {} bytes",
                MEMORY_KEY_ENV,
                KEY_SIZE,
                decoded.len()
            )));
        }

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&decoded);

        debug!("Memory cipher initialized");

        Ok(Self { key_bytes: Arc::new(key), rng: Arc::new(SystemRandom::new()) })
    }

    /// Deterministic cipher for tests
    #[cfg(test)]
    pub fn for_testing() -> Self {
        let key = SecretString::new(base64::engine::general_purpose::STANDARD.encode([0x42u8; 32]));
        Self::from_base64(&key).expect("static test key is valid")
    }

    fn derive_key(&self, salt: &[u8; SALT_SIZE]) -> Result<UnboundKey> {
        let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, salt).extract(&self.key_bytes[..]);
        let info = [HKDF_INFO];
        let okm = prk.expand(&info, &AES_256_GCM).map_err(|_| {
            error!("Failed to derive per-secret key");
            SecretsError::encryption("Failed to derive per-secret key")
        })?;
        Ok(UnboundKey::from(okm))
    }

    /// Seal a plaintext value under `name`
    #[instrument(skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    pub fn seal(&self, name: &str, plaintext: &[u8]) -> Result<EncryptedSecret> {
        let mut nonce = [0u8; NONCE_SIZE];
        let mut salt = [0u8; SALT_SIZE];
        self.rng.fill(&mut nonce).and_then(|_| self.rng.fill(&mut salt)).map_err(|_| {
            error!("Failed to generate random nonce or salt");
            SecretsError::encryption("Failed to generate random nonce or salt")
        })?;

        let mut sealing_key = aead::SealingKey::new(self.derive_key(&salt)?, SingleNonce::new(nonce));

        let mut ciphertext = plaintext.to_vec();
        let tag = sealing_key
            .seal_in_place_separate_tag(Aad::from(name.as_bytes()), &mut ciphertext)
            .map_err(|_| {
                error!(name = %name, "Encryption failed");
                SecretsError::encryption(format!("Failed to encrypt secret '{}'", name))
            })?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag.as_ref());

        Ok(EncryptedSecret { name: name.to_string(), ciphertext, nonce, salt, tag: tag_bytes })
    }

    /// Open a sealed secret back into plaintext
    #[instrument(skip(self, secret), fields(name = %secret.name))]
    pub fn open(&self, secret: &EncryptedSecret) -> Result<SecretString> {
        let mut opening_key =
            aead::OpeningKey::new(self.derive_key(&secret.salt)?, SingleNonce::new(secret.nonce));

        let mut buffer = Zeroizing::new(Vec::with_capacity(secret.ciphertext.len() + TAG_SIZE));
        buffer.extend_from_slice(&secret.ciphertext);
        buffer.extend_from_slice(&secret.tag);

        let plaintext = opening_key
            .open_in_place(Aad::from(secret.name.as_bytes()), &mut buffer[..])
            .map_err(|_| {
                error!(name = %secret.name, "Decryption failed - tampering or wrong key");
                SecretsError::encryption(format!(
                    "Failed to decrypt secret '{}' - authentication failed",
                    secret.name
                ))
            })?;

        let value = String::from_utf8(plaintext.to_vec()).map_err(|_| {
            SecretsError::encryption(format!("Secret '{}' is not valid UTF-8", secret.name))
        })?;

        Ok(SecretString::new(value))
    }
}

impl fmt::Debug for MemoryCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCipher").field("key_bytes", &"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let cipher = MemoryCipher::for_testing();
        let sealed = cipher.seal("OPENAI_API_KEY", b"sk-test-value").unwrap();

        assert_eq!(sealed.ciphertext.len(), "sk-test-value".len());
        assert_ne!(sealed.ciphertext, b"sk-test-value");

        let opened = cipher.open(&sealed).unwrap();
        assert_eq!(opened.expose_secret(), "sk-test-value");
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_seal() {
        let cipher = MemoryCipher::for_testing();
        let a = cipher.seal("KEY", b"same").unwrap();
        let b = cipher.seal("KEY", b"same").unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = MemoryCipher::for_testing();
        let mut sealed = cipher.seal("KEY", b"sensitive").unwrap();
        sealed.tag[0] ^= 0xFF;

        assert!(matches!(cipher.open(&sealed), Err(SecretsError::Encryption { .. })));
    }

    #[test]
    fn test_name_is_bound_to_ciphertext() {
        let cipher = MemoryCipher::for_testing();
        let mut sealed = cipher.seal("OPENAI_API_KEY", b"sensitive").unwrap();
        sealed.name = "OTHER_KEY".to_string();

        assert!(cipher.open(&sealed).is_err());
    }

    #[test]
    fn test_wrong_memory_key_fails() {
        let cipher = MemoryCipher::for_testing();
        let sealed = cipher.seal("KEY", b"sensitive").unwrap();

        let other_key =
            SecretString::new(base64::engine::general_purpose::STANDARD.encode([0x07u8; 32]));
        let other = MemoryCipher::from_base64(&other_key).unwrap();
        assert!(other.open(&sealed).is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let cipher = MemoryCipher::for_testing();
        let sealed = cipher.seal("EMPTY", b"").unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert!(cipher.open(&sealed).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_key_length() {
        let short = SecretString::new(base64::engine::general_purpose::STANDARD.encode([0u8; 16]));
        let result = MemoryCipher::from_base64(&short);
        assert!(matches!(result, Err(SecretsError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_base64() {
        let result = MemoryCipher::from_base64(&SecretString::new("not base64 !!"));
        assert!(matches!(result, Err(SecretsError::ConfigError { .. })));
    }

    #[test]
    fn test_debug_redacts() {
        let cipher = MemoryCipher::for_testing();
        let sealed = cipher.seal("KEY", b"sensitive").unwrap();
        let out = format!("{:?} {:?}", cipher, sealed);
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("sensitive"));
    }}
