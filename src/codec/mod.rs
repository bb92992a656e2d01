//! Field-level codec for RED-tier values.
//!
//! Individual field values are sealed with AES-256-GCM under the single
//! process-wide key and stored as one opaque base64 string per field. A fixed
//! associated-data tag binds every ciphertext to this codec, so blobs cannot
//! be replayed into some other decryption path.

mod masking;

pub use masking::{mask_value, MaskKind};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::FieldKey;
use crate::errors::CryptoError;

/// Associated data bound into every ciphertext.
const FIELD_AAD: &[u8] = b"hims-access/field";

/// Blob layout: `version(1) | nonce(12) | tag(16) | ciphertext`.
const BLOB_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// An encrypted field value as it is stored inside an entity record.
///
/// Opaque to every caller: created by [`FieldCipher::encrypt`], consumed by
/// [`FieldCipher::decrypt`], and otherwise only moved around as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedField(String);

impl EncryptedField {
    /// Wraps a value read back from storage. No validation happens here;
    /// malformed blobs surface as [`CryptoError::Malformed`] on decrypt.
    pub fn from_storage(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated encryption for individual RED-tier field values.
///
/// Stateless beyond the loaded key; safe to share across tasks.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &FieldKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Constructs the cipher from process configuration, failing closed when
    /// the key is absent or too short.
    pub fn from_env() -> Result<Self, CryptoError> {
        Ok(Self::new(&FieldKey::from_env()?))
    }

    /// Seals a plaintext value with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: FIELD_AAD,
                },
            )
            .map_err(|_| CryptoError::EncryptFailed)?;

        // aes-gcm appends the tag to the ciphertext; split it back out so the
        // stored layout keeps the tag in the header.
        let split = sealed.len() - TAG_LEN;
        let (ciphertext, tag) = sealed.split_at(split);

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(ciphertext);

        Ok(EncryptedField(BASE64.encode(blob)))
    }

    /// Opens a stored blob. Fails explicitly on malformed input, an unknown
    /// layout version, tampering, or the wrong key; never returns garbage.
    pub fn decrypt(&self, field: &EncryptedField) -> Result<String, CryptoError> {
        let blob = BASE64
            .decode(field.as_str())
            .map_err(|err| CryptoError::Malformed(err.to_string()))?;

        if blob.len() < HEADER_LEN {
            return Err(CryptoError::Malformed(format!(
                "blob too short: {} bytes",
                blob.len()
            )));
        }
        if blob[0] != BLOB_VERSION {
            return Err(CryptoError::UnsupportedVersion(blob[0]));
        }

        let nonce = Nonce::from_slice(&blob[1..1 + NONCE_LEN]);
        let tag = &blob[1 + NONCE_LEN..HEADER_LEN];
        let ciphertext = &blob[HEADER_LEN..];

        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let plaintext = self
            .cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &sealed,
                    aad: FIELD_AAD,
                },
            )
            .map_err(|_| CryptoError::DecryptFailed)?;

        String::from_utf8(plaintext).map_err(|err| CryptoError::Malformed(err.to_string()))
    }
}
