//! Ad account token encryption using AES-256-GCM
//!
//! Access tokens are sealed with additional authenticated data (AAD) built
//! from the owning manager and the external account id, so a ciphertext
//! copied onto another account row fails to decrypt.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Key material wiped from memory on drop
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        Ok(ZeroizingKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn cipher(key: &CryptoKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seals `plaintext` as `version || nonce || ciphertext+tag`.
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut sealed = cipher(key)
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + sealed.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut sealed);

    Ok(result)
}

/// Opens a payload produced by [`encrypt_bytes`]. Rows written before
/// encryption was enabled carry no version marker and are returned as-is.
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let Some(&version) = ciphertext.first() else {
        return Err(CryptoError::EmptyCiphertext);
    };

    if version != VERSION_ENCRYPTED {
        return Ok(ciphertext.to_vec());
    }

    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let sealed = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    cipher(key)
        .decrypt(nonce, Payload { msg: sealed, aad })
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

fn account_token_aad(gestor_id: Uuid, external_account_id: &str) -> String {
    format!("{}|{}", gestor_id, external_account_id)
}

/// Encrypt an ad account access token bound to its owner and external id
pub fn encrypt_account_token(
    key: &CryptoKey,
    gestor_id: Uuid,
    external_account_id: &str,
    access_token: &str,
) -> Result<Vec<u8>, CryptoError> {
    let aad = account_token_aad(gestor_id, external_account_id);
    encrypt_bytes(key, aad.as_bytes(), access_token.as_bytes())
}

/// Decrypt an ad account access token previously sealed with [`encrypt_account_token`]
pub fn decrypt_account_token(
    key: &CryptoKey,
    gestor_id: Uuid,
    external_account_id: &str,
    ciphertext: &[u8],
) -> Result<String, CryptoError> {
    let aad = account_token_aad(gestor_id, external_account_id);
    let bytes = decrypt_bytes(key, aad.as_bytes(), ciphertext)?;
    String::from_utf8(bytes)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![7u8; 32]).expect("valid test key")
    }

    #[test]
    fn account_token_roundtrip() {
        let key = test_key();
        let gestor_id = Uuid::new_v4();

        let sealed = encrypt_account_token(&key, gestor_id, "123456", "EAAB-token").unwrap();
        assert!(is_encrypted_payload(&sealed));
        assert!(!sealed.windows(10).any(|w| w == b"EAAB-token"));

        let opened = decrypt_account_token(&key, gestor_id, "123456", &sealed).unwrap();
        assert_eq!(opened, "EAAB-token");
    }

    #[test]
    fn token_moved_to_another_account_fails() {
        let key = test_key();
        let gestor_id = Uuid::new_v4();
        let sealed = encrypt_account_token(&key, gestor_id, "123456", "EAAB-token").unwrap();

        assert!(decrypt_account_token(&key, gestor_id, "999999", &sealed).is_err());
        assert!(decrypt_account_token(&key, Uuid::new_v4(), "123456", &sealed).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = test_key();
        let mut sealed = encrypt_bytes(&key, b"aad", b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert!(matches!(
            decrypt_bytes(&key, b"aad", &sealed),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let key = test_key();
        let first = encrypt_bytes(&key, b"aad", b"secret").unwrap();
        let second = encrypt_bytes(&key, b"aad", b"secret").unwrap();

        assert_ne!(&first[1..13], &second[1..13]);
    }

    #[test]
    fn legacy_plaintext_rows_pass_through() {
        let key = test_key();
        let opened = decrypt_account_token(&key, Uuid::new_v4(), "123", b"plain-token").unwrap();
        assert_eq!(opened, "plain-token");
    }

    #[test]
    fn short_and_empty_payloads_are_rejected() {
        let key = test_key();
        assert!(matches!(
            decrypt_bytes(&key, b"aad", &[]),
            Err(CryptoError::EmptyCiphertext)
        ));
        assert!(matches!(
            decrypt_bytes(&key, b"aad", &[VERSION_ENCRYPTED, 0x02]),
            Err(CryptoError::InvalidFormat)
        ));
    }

    #[test]
    fn key_length_is_enforced() {
        assert!(matches!(
            CryptoKey::new(vec![0u8; 16]),
            Err(CryptoError::InvalidKeyLength(16))
        ));
        assert!(CryptoKey::new(vec![0u8; 32]).is_ok());
    }
}
