//! Key derivation and record sealing.
//!
//! ## Security Model
//!
//! - The caller's raw key never touches disk. A 32-byte store key is derived
//!   from it with HKDF-SHA256 and a random per-store salt kept in the header.
//! - Every record is sealed with AES-256-GCM under a fresh random nonce.
//! - The store salt is bound to every record as associated data, so frames
//!   copied from another store fail authentication.
//! - Derived keys are zeroized on drop.

use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Size of the per-store salt in bytes.
pub const SALT_SIZE: usize = 16;

/// HKDF context string; changing it orphans every existing store.
const KEY_INFO: &[u8] = b"strongbox-store-key-v1";

/// Rejects raw keys that cannot unlock anything.
///
/// # Errors
///
/// Returns `MalformedInput` for an empty key.
pub fn validate_raw_key(raw_key: &str) -> CoreResult<()> {
    if raw_key.is_empty() {
        return Err(CoreError::malformed_input("raw key must not be empty"));
    }
    Ok(())
}

/// Generates a fresh random store salt.
#[must_use]
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// A store key derived from the caller's raw key.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey {
    bytes: [u8; KEY_SIZE],
}

impl StoreKey {
    /// Derives the store key for `raw_key` under `salt`.
    ///
    /// HKDF is a key derivation function, not a password hash: raw keys are
    /// expected to carry high entropy already (generated secrets, not
    /// user-chosen passwords).
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` for an empty key.
    pub fn derive(raw_key: &str, salt: &[u8; SALT_SIZE]) -> CoreResult<Self> {
        validate_raw_key(raw_key)?;

        let hk = Hkdf::<Sha256>::new(Some(salt), raw_key.as_bytes());
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(KEY_INFO, &mut bytes)
            .map_err(|_| CoreError::encryption_failed("HKDF expand failed"))?;

        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Seals and opens record payloads for one store.
///
/// Sealed layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
pub struct RecordCipher {
    cipher: Aes256Gcm,
    aad: [u8; SALT_SIZE],
}

impl RecordCipher {
    /// Creates a cipher for the store identified by `salt`.
    #[must_use]
    pub fn new(key: &StoreKey, salt: [u8; SALT_SIZE]) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher, aad: salt }
    }

    /// Derives the key for `raw_key` and builds the cipher in one step.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` for an empty key.
    pub fn for_raw_key(raw_key: &str, salt: [u8; SALT_SIZE]) -> CoreResult<Self> {
        let key = StoreKey::derive(raw_key, &salt)?;
        Ok(Self::new(&key, salt))
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let payload = Payload {
            msg: plaintext,
            aad: &self.aad,
        };
        let ciphertext = self
            .cipher
            .encrypt(nonce, payload)
            .map_err(|_| CoreError::encryption_failed("plaintext rejected by cipher"))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);
        Ok(sealed)
    }

    /// Decrypts a payload produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the payload is too short or fails
    /// authentication. Callers that use a failed open to detect a wrong key
    /// map this to `AuthenticationFailed` themselves.
    pub fn open(&self, sealed: &[u8]) -> CoreResult<Vec<u8>> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CoreError::corruption("sealed payload too short"));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let payload = Payload {
            msg: ciphertext,
            aad: &self.aad,
        };
        self.cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|_| CoreError::corruption("sealed payload failed authentication"))
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher").finish_non_exhaustive()
    }
}
