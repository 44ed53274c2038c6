use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::repository::error::CryptoError;

/// Symmetric encryption of cached passwords, keyed by per-instance key material.
pub trait PasswordCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, key_material: &str) -> Result<String, CryptoError>;

    fn decrypt(&self, ciphertext: &str, key_material: &str) -> Result<String, CryptoError>;
}

const MAGIC: &[u8; 4] = b"OCP1";
const NONCE_LEN: usize = 12;

/// AES-256-GCM with a SHA-256 derived key.
///
/// Output is base64 of `OCP1 || nonce || ciphertext+tag`, so it fits a text column.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmPasswordCipher;

impl AesGcmPasswordCipher {
    pub fn new() -> Self {
        Self
    }

    fn cipher(key_material: &str) -> Result<Aes256Gcm, CryptoError> {
        let key = Sha256::digest(key_material.as_bytes());
        Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Cipher)
    }
}

impl PasswordCipher for AesGcmPasswordCipher {
    fn encrypt(&self, plaintext: &str, key_material: &str) -> Result<String, CryptoError> {
        let cipher = Self::cipher(key_material)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CryptoError::Cipher)?;

        let mut out = Vec::with_capacity(MAGIC.len() + NONCE_LEN + sealed.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(B64.encode(out))
    }

    fn decrypt(&self, ciphertext: &str, key_material: &str) -> Result<String, CryptoError> {
        let raw = B64.decode(ciphertext.trim())?;
        if raw.len() < MAGIC.len() + NONCE_LEN || &raw[..MAGIC.len()] != MAGIC {
            return Err(CryptoError::InvalidFormat);
        }
        let (nonce_bytes, sealed) = raw[MAGIC.len()..].split_at(NONCE_LEN);
        let cipher = Self::cipher(key_material)?;
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::Cipher)?;
        Ok(String::from_utf8(plain)?)
    }
}
