//! Append-only audit trail for authorization decisions and protected-data
//! access.
//!
//! Every entry carries an explicit durability policy: compliance-critical
//! events (denials, overrides, RED-field access) must reach the store or the
//! caller hears about it; best-effort telemetry is logged-and-tolerated.

mod sqlite;

pub use sqlite::SqliteAuditSink;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AuditError;

/// Action codes recorded in the audit trail. Closed set; reports group on
/// these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    PermissionDenied,
    AdminOverride,
    FieldDecrypted,
    FieldMasked,
    FieldEncrypted,
    FileAccessed,
    RecordCreated,
    RecordUpdated,
    RecordDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PermissionDenied => "PERMISSION_DENIED",
            AuditAction::AdminOverride => "ADMIN_OVERRIDE",
            AuditAction::FieldDecrypted => "FIELD_DECRYPTED",
            AuditAction::FieldMasked => "FIELD_MASKED",
            AuditAction::FieldEncrypted => "FIELD_ENCRYPTED",
            AuditAction::FileAccessed => "FILE_ACCESSED",
            AuditAction::RecordCreated => "RECORD_CREATED",
            AuditAction::RecordUpdated => "RECORD_UPDATED",
            AuditAction::RecordDeleted => "RECORD_DELETED",
        }
    }

    /// The durability policy an action carries unless a caller overrides it.
    /// Denials, overrides and RED-field events must not be lost silently;
    /// access telemetry is best effort.
    pub fn default_durability(&self) -> Durability {
        match self {
            AuditAction::PermissionDenied
            | AuditAction::AdminOverride
            | AuditAction::FieldDecrypted
            | AuditAction::FieldMasked
            | AuditAction::FieldEncrypted => Durability::MustSucceed,
            AuditAction::FileAccessed
            | AuditAction::RecordCreated
            | AuditAction::RecordUpdated
            | AuditAction::RecordDeleted => Durability::BestEffort,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a failed audit write may be tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Log the failure and carry on; the triggering operation is unaffected.
    BestEffort,
    /// Surface the failure to the caller of the triggering operation.
    MustSucceed,
}

/// One immutable audit record. Construct via [`AuditEntry::new`]; snapshots
/// and metadata are sanitized on the way in, so secrets and RED plaintext
/// never sit in the trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub durability: Durability,
}

impl AuditEntry {
    pub fn new(
        actor_id: Uuid,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            occurred_at: Utc::now(),
            before: None,
            after: None,
            metadata: None,
            durability: action.default_durability(),
        }
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(sanitize_snapshot(before));
        self
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(sanitize_snapshot(after));
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(sanitize_snapshot(metadata));
        self
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    /// Canonical JSON used for the hash chain.
    pub fn canonical_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Keys whose values are dropped from before/after snapshots regardless of
/// nesting depth.
const SENSITIVE_KEYS: [&str; 12] = [
    "password",
    "password_hash",
    "token",
    "access_token",
    "refresh_token",
    "secret",
    "api_key",
    "ssn",
    "passport",
    "salary",
    "medical",
    "financial",
];

const REDACTED: &str = "[REDACTED]";

/// Recursively replaces values under sensitive keys with `[REDACTED]`.
pub fn sanitize_snapshot(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sanitized = map
                .into_iter()
                .map(|(key, entry)| {
                    if SENSITIVE_KEYS.contains(&key.as_str()) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, sanitize_snapshot(entry))
                    }
                })
                .collect();
            Value::Object(sanitized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_snapshot).collect()),
        other => other,
    }
}

/// Destination for audit entries. Append-only by contract: implementations
/// expose no update or delete of recorded entries.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// In-memory sink for tests and ephemeral tooling.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit sink poisoned").clone()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .expect("audit sink poisoned")
            .push(entry.clone());
        Ok(())
    }
}
