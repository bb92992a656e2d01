use crate::errors::CryptoError;

/// Environment variable holding the symmetric key for field-level encryption.
pub const CRYPTO_KEY_ENV: &str = "HIMS_CRYPTO_KEY";

/// Minimum accepted key length in characters. Shorter keys fail closed; there
/// is no fallback or default key.
pub const MIN_CRYPTO_KEY_LENGTH: usize = 32;

const KEY_BYTES: usize = 32;

/// A validated AES-256 key for the field codec.
///
/// Holds the first 32 bytes of the configured key material. `Debug` is
/// redacted and there is no `Display`/serde so the key cannot leak into logs
/// or snapshots.
#[derive(Clone)]
pub struct FieldKey([u8; KEY_BYTES]);

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redacted: never expose key material.
        f.write_str("FieldKey(..)")
    }
}

impl FieldKey {
    /// Reads the key from `HIMS_CRYPTO_KEY`.
    pub fn from_env() -> Result<Self, CryptoError> {
        match std::env::var(CRYPTO_KEY_ENV) {
            Ok(raw) => Self::from_material(&raw),
            Err(_) => Err(CryptoError::KeyMissing),
        }
    }

    /// Validates raw key material and derives the fixed-size key from it.
    pub fn from_material(raw: &str) -> Result<Self, CryptoError> {
        if raw.is_empty() {
            return Err(CryptoError::KeyMissing);
        }
        if raw.len() < MIN_CRYPTO_KEY_LENGTH {
            return Err(CryptoError::KeyTooShort {
                required: MIN_CRYPTO_KEY_LENGTH,
                actual: raw.len(),
            });
        }

        let mut key = [0u8; KEY_BYTES];
        key.copy_from_slice(&raw.as_bytes()[..KEY_BYTES]);
        Ok(Self(key))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }
}
