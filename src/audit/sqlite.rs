//! SQLite-backed audit sink.
//!
//! Rows are append-only: this module exposes insert and read operations only,
//! and each row is chained to its predecessor with
//! `hash = sha256(prev_hash || canonical_json)` so retroactive edits are
//! detectable.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{AuditAction, AuditEntry, AuditSink, Durability};
use crate::errors::AuditError;

#[derive(Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Entries touching one entity, oldest first. Compliance reports walk
    /// this to reconstruct who saw or changed a record.
    pub async fn entries_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let rows = sqlx::query(
            "SELECT id, actor_id, action, entity_type, entity_id, occurred_at, \
             before_json, after_json, metadata_json, durability \
             FROM audit_log WHERE entity_type = ? AND entity_id = ? ORDER BY occurred_at, rowid",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_row).collect()
    }

    /// Everything one actor did, oldest first.
    pub async fn entries_for_actor(&self, actor_id: Uuid) -> Result<Vec<AuditEntry>, AuditError> {
        let rows = sqlx::query(
            "SELECT id, actor_id, action, entity_type, entity_id, occurred_at, \
             before_json, after_json, metadata_json, durability \
             FROM audit_log WHERE actor_id = ? ORDER BY occurred_at, rowid",
        )
        .bind(actor_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_row).collect()
    }

    /// Walks the whole chain and recomputes every link. Returns the number of
    /// verified rows; any mismatch means a row was altered after the fact.
    pub async fn verify_chain(&self) -> Result<usize, AuditError> {
        let rows = sqlx::query("SELECT payload_json, prev_hash, hash FROM audit_log ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        let mut expected_prev: Option<String> = None;
        for (index, row) in rows.iter().enumerate() {
            let payload: String = row.get("payload_json");
            let prev_hash: Option<String> = row.get("prev_hash");
            let hash: String = row.get("hash");

            if prev_hash != expected_prev {
                return Err(AuditError::ChainBroken { row: index });
            }
            if chain_hash(prev_hash.as_deref(), &payload) != hash {
                return Err(AuditError::ChainBroken { row: index });
            }
            expected_prev = Some(hash);
        }

        Ok(rows.len())
    }
}

#[async_trait::async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let payload = entry.canonical_json()?;

        // The prev-hash read and the insert must see a consistent tail, so
        // both run inside one transaction; SQLite serializes the writers.
        let mut tx = self.pool.begin().await?;

        let prev_hash: Option<String> =
            sqlx::query_scalar("SELECT hash FROM audit_log ORDER BY rowid DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let hash = chain_hash(prev_hash.as_deref(), &payload);

        let result = sqlx::query(
            "INSERT INTO audit_log \
             (id, actor_id, action, entity_type, entity_id, occurred_at, \
              before_json, after_json, metadata_json, durability, payload_json, prev_hash, hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(entry.actor_id.to_string())
        .bind(entry.action.as_str())
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.occurred_at)
        .bind(entry.before.as_ref().map(|v| v.to_string()))
        .bind(entry.after.as_ref().map(|v| v.to_string()))
        .bind(entry.metadata.as_ref().map(|v| v.to_string()))
        .bind(durability_str(entry.durability))
        .bind(&payload)
        .bind(&prev_hash)
        .bind(&hash)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                // Secondary channel: the process log always hears about a
                // failed audit write, whatever the caller decides to do.
                tracing::error!(
                    action = %entry.action,
                    entity_type = %entry.entity_type,
                    entity_id = %entry.entity_id,
                    error = %err,
                    "failed to persist audit entry"
                );
                Err(AuditError::Store(err))
            }
        }
    }
}

fn chain_hash(prev_hash: Option<&str>, payload: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

fn durability_str(durability: Durability) -> &'static str {
    match durability {
        Durability::BestEffort => "best_effort",
        Durability::MustSucceed => "must_succeed",
    }
}

fn parse_durability(value: &str) -> Durability {
    match value {
        "must_succeed" => Durability::MustSucceed,
        _ => Durability::BestEffort,
    }
}

fn parse_action(value: &str) -> AuditAction {
    match value {
        "PERMISSION_DENIED" => AuditAction::PermissionDenied,
        "ADMIN_OVERRIDE" => AuditAction::AdminOverride,
        "FIELD_DECRYPTED" => AuditAction::FieldDecrypted,
        "FIELD_MASKED" => AuditAction::FieldMasked,
        "FIELD_ENCRYPTED" => AuditAction::FieldEncrypted,
        "RECORD_CREATED" => AuditAction::RecordCreated,
        "RECORD_UPDATED" => AuditAction::RecordUpdated,
        "RECORD_DELETED" => AuditAction::RecordDeleted,
        _ => AuditAction::FileAccessed,
    }
}

fn parse_row(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry, AuditError> {
    let json_column = |name: &str| -> Result<Option<serde_json::Value>, AuditError> {
        let raw: Option<String> = row.get(name);
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    };

    // A corrupt id must fail loudly: attribution is the whole point of the
    // trail, and a nil-uuid default would hide the damage.
    let uuid_column = |name: &str| -> Result<Uuid, AuditError> {
        Uuid::parse_str(row.get(name))
            .map_err(|err| AuditError::Malformed(format!("{name}: {err}")))
    };

    Ok(AuditEntry {
        id: uuid_column("id")?,
        actor_id: uuid_column("actor_id")?,
        action: parse_action(row.get("action")),
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        occurred_at: row.get::<DateTime<Utc>, _>("occurred_at"),
        before: json_column("before_json")?,
        after: json_column("after_json")?,
        metadata: json_column("metadata_json")?,
        durability: parse_durability(row.get("durability")),
    })
}
