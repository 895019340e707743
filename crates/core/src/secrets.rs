//! Authenticated encryption for AI-provider credentials at rest.
//!
//! Credentials are sealed with AES-256-GCM before they touch the database
//! and only decrypted transiently for the outbound judgement call. The key
//! is derived from a process-wide secret via SHA-256, so deployments supply
//! one passphrase-style env var instead of raw key bytes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// GCM standard 96-bit nonce.
const NONCE_LEN: usize = 12;

/// Seals and opens provider credentials.
///
/// Ciphertexts are `nonce || gcm_output` so each row is self-contained.
pub struct CredentialCipher {
    key: Key<Aes256Gcm>,
}

impl CredentialCipher {
    /// Derive the AES-256 key from a process-wide secret.
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self {
            key: Key::<Aes256Gcm>::clone_from_slice(&digest),
        }
    }

    /// Encrypt a plaintext credential with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CoreError> {
        let cipher = Aes256Gcm::new(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CoreError::Internal("Credential encryption failed".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a sealed credential. Fails on truncation or tampering (the
    /// GCM tag authenticates the ciphertext).
    pub fn decrypt(&self, sealed: &[u8]) -> Result<String, CoreError> {
        if sealed.len() <= NONCE_LEN {
            return Err(CoreError::Internal(
                "Sealed credential is too short".into(),
            ));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CoreError::Internal("Credential decryption failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CoreError::Internal("Decrypted credential is not UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let cipher = CredentialCipher::from_secret("unit-test-secret");
        let sealed = cipher.encrypt("sk-abc123").expect("encrypt should succeed");
        let opened = cipher.decrypt(&sealed).expect("decrypt should succeed");
        assert_eq!(opened, "sk-abc123");
    }

    #[test]
    fn nonces_are_unique_per_encryption() {
        let cipher = CredentialCipher::from_secret("unit-test-secret");
        let a = cipher.encrypt("same-plaintext").unwrap();
        let b = cipher.encrypt("same-plaintext").unwrap();
        assert_ne!(a, b, "fresh nonce per call must vary the ciphertext");
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = CredentialCipher::from_secret("unit-test-secret");
        let mut sealed = cipher.encrypt("sk-abc123").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(cipher.decrypt(&sealed).is_err());
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let sealer = CredentialCipher::from_secret("key-one");
        let opener = CredentialCipher::from_secret("key-two");
        let sealed = sealer.encrypt("sk-abc123").unwrap();
        assert!(opener.decrypt(&sealed).is_err());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let cipher = CredentialCipher::from_secret("unit-test-secret");
        assert!(cipher.decrypt(&[0u8; 4]).is_err());
    }
}
