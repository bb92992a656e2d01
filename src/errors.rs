use crate::authz::{Module, PermissionLevel};

pub type AccessResult<T> = Result<T, AccessError>;

#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    /// No actor could be resolved for the request. Always fatal.
    #[error("authentication required")]
    AuthenticationMissing,
    /// The actor is resolved but its effective permission does not meet the
    /// required level. The message deliberately names only the module and the
    /// required level, never which role would have been sufficient.
    #[error("insufficient permissions: {required} required for {module}")]
    PermissionDenied {
        module: Module,
        required: PermissionLevel,
    },
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A business operation invoked through the gate failed.
    #[error("operation failed: {0}")]
    Operation(#[source] anyhow::Error),
}

impl AccessError {
    pub fn denied(module: Module, required: PermissionLevel) -> Self {
        Self::PermissionDenied { module, required }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("encryption key is not configured")]
    KeyMissing,
    #[error("encryption key must be at least {required} characters, got {actual}")]
    KeyTooShort { required: usize, actual: usize },
    #[error("malformed encrypted field: {0}")]
    Malformed(String),
    #[error("unsupported encrypted field version {0}")]
    UnsupportedVersion(u8),
    #[error("encryption failed")]
    EncryptFailed,
    /// Authentication failed during decryption: tampered ciphertext, a
    /// mismatched tag, or the wrong key. AES-GCM does not distinguish.
    #[error("decryption failed")]
    DecryptFailed,
}

#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    #[error("audit store error")]
    Store(#[from] sqlx::Error),
    #[error("failed to serialize audit entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("malformed audit row: {0}")]
    Malformed(String),
    #[error("audit hash chain broken at row {row}")]
    ChainBroken { row: usize },
}
