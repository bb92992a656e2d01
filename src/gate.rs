//! The enforcement gate - the single chokepoint for protected operations.
//!
//! Every request funnels through here: the actor's module permission is
//! evaluated, the operation runs only on success, RED-tier field access goes
//! through the codec or the masking fallback, and the interesting outcomes
//! land in the audit trail.

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::authz::{meets_requirement, Actor, Module, PermissionLevel, SensitivityTier};
use crate::codec::{mask_value, EncryptedField, FieldCipher, MaskKind};
use crate::errors::{AccessError, AccessResult};

/// Lifecycle of one request through the gate. Used for tracing; `Denied` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Received,
    Authenticated,
    Authorized,
    Executing,
    Completed,
    Denied,
    Failed,
}

/// Where a protected field lives, for audit attribution.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
    pub field: &'a str,
}

impl<'a> FieldRef<'a> {
    pub fn new(entity_type: &'a str, entity_id: &'a str, field: &'a str) -> Self {
        Self {
            entity_type,
            entity_id,
            field,
        }
    }
}

/// A read of one protected field: the stored representation plus how to mask
/// it when the plaintext must not (or cannot) be shown.
#[derive(Debug, Clone, Copy)]
pub struct FieldRead<'a> {
    pub field: FieldRef<'a>,
    pub tier: SensitivityTier,
    pub mask_kind: MaskKind,
    /// The value as stored: plaintext for GREEN/AMBER, an encrypted blob for RED.
    pub stored: &'a str,
    /// The crew member the record belongs to, for subject-scoped entities.
    /// Crew-portal actors may only see their own records unmasked.
    pub subject: Option<Uuid>,
}

/// A write of one protected field.
#[derive(Debug, Clone, Copy)]
pub struct FieldWrite<'a> {
    pub field: FieldRef<'a>,
    pub mask_kind: MaskKind,
    pub plaintext: &'a str,
}

pub struct EnforcementGate {
    cipher: FieldCipher,
    audit: Arc<dyn AuditSink>,
}

impl EnforcementGate {
    pub fn new(cipher: FieldCipher, audit: Arc<dyn AuditSink>) -> Self {
        Self { cipher, audit }
    }

    /// Checks the actor's effective permission on `module` against `required`.
    ///
    /// A system-admin bypass and a denial both leave an audit entry before
    /// this returns; a normal policy grant does not.
    pub async fn authorize(
        &self,
        actor: &Actor,
        module: Module,
        required: PermissionLevel,
    ) -> AccessResult<()> {
        if actor.is_system_admin() {
            // Authorized by override, not by policy. Recorded distinctly so
            // compliance review can tell the two apart.
            tracing::info!(
                actor_id = %actor.id,
                module = %module,
                required = %required,
                "authorized via system-admin override"
            );
            let entry = AuditEntry::new(
                actor.id,
                AuditAction::AdminOverride,
                "module",
                module.as_str(),
            )
            .with_metadata(json!({ "required": required.as_str() }));
            self.record_now(&entry).await?;
            return Ok(());
        }

        let effective = actor.effective_permission(module);
        if meets_requirement(effective, required) {
            tracing::debug!(
                actor_id = %actor.id,
                module = %module,
                effective = %effective,
                required = %required,
                "permission granted"
            );
            return Ok(());
        }

        tracing::debug!(
            actor_id = %actor.id,
            module = %module,
            effective = %effective,
            required = %required,
            "permission denied"
        );
        let entry = AuditEntry::new(
            actor.id,
            AuditAction::PermissionDenied,
            "module",
            module.as_str(),
        )
        .with_metadata(json!({
            "required": required.as_str(),
            "effective": effective.as_str(),
        }));
        self.record_now(&entry).await?;

        Err(AccessError::denied(module, required))
    }

    /// Resolves a protected field for display.
    ///
    /// GREEN and AMBER values pass through unchanged (the module permission
    /// gate already ran upstream). RED values decrypt only for actors holding
    /// explicit clearance; everyone else - and every decryption failure -
    /// gets the masked stored representation. The two fallback causes produce
    /// identical output, so a viewer cannot tell "not allowed" from
    /// "corrupted"; only the audit trail keeps that distinction.
    pub async fn read_protected_field(
        &self,
        actor: &Actor,
        read: FieldRead<'_>,
    ) -> AccessResult<String> {
        if read.tier != SensitivityTier::Red {
            return Ok(read.stored.to_string());
        }

        if !actor.may_view_unmasked(SensitivityTier::Red) {
            // No clearance: mask without touching the ciphertext. Not
            // attempting decryption avoids both needless exposure and a
            // timing signal about whether it would have succeeded.
            return self
                .masked_fallback(actor, read, "clearance_absent", None)
                .await;
        }

        if let Some(subject) = read.subject {
            // Crew self-service scope: a portal-only actor's RED clearance
            // covers its own records and nothing else.
            if !actor.may_access_subject(subject) {
                return self
                    .masked_fallback(actor, read, "subject_out_of_scope", None)
                    .await;
            }
        }

        match self
            .cipher
            .decrypt(&EncryptedField::from_storage(read.stored))
        {
            Ok(plaintext) => {
                let entry = self
                    .field_entry(actor, AuditAction::FieldDecrypted, read.field)
                    .with_metadata(json!({
                        "field": read.field.field,
                        "mask_kind": read.mask_kind.as_str(),
                    }));
                self.record_now(&entry).await?;
                Ok(plaintext)
            }
            Err(err) => {
                // Corrupt or legacy ciphertext must not take down unrelated
                // reads; degrade to the masked form and keep the cause
                // server-side only.
                tracing::warn!(
                    actor_id = %actor.id,
                    entity_type = %read.field.entity_type,
                    entity_id = %read.field.entity_id,
                    field = %read.field.field,
                    error = %err,
                    "field decryption failed, returning masked value"
                );
                self.masked_fallback(actor, read, "crypto_failure", Some(err.to_string()))
                    .await
            }
        }
    }

    /// Every masked fallback goes through here so the three causes (no
    /// clearance, out-of-scope subject, crypto failure) produce identical
    /// output for the same stored value and differ only in audit metadata.
    async fn masked_fallback(
        &self,
        actor: &Actor,
        read: FieldRead<'_>,
        reason: &str,
        error: Option<String>,
    ) -> AccessResult<String> {
        let mut metadata = json!({
            "field": read.field.field,
            "mask_kind": read.mask_kind.as_str(),
            "reason": reason,
        });
        if let Some(error) = error {
            metadata["error"] = Value::String(error);
        }
        let entry = self
            .field_entry(actor, AuditAction::FieldMasked, read.field)
            .with_metadata(metadata);
        self.record_now(&entry).await?;
        Ok(mask_value(read.mask_kind, read.stored))
    }

    /// Seals a RED-tier value for storage. The audit snapshot carries only
    /// the masked plaintext; the clear value never reaches the trail.
    pub async fn write_protected_field(
        &self,
        actor: &Actor,
        write: FieldWrite<'_>,
    ) -> AccessResult<EncryptedField> {
        let sealed = self.cipher.encrypt(write.plaintext)?;

        let entry = self
            .field_entry(actor, AuditAction::FieldEncrypted, write.field)
            .with_after(json!({
                write.field.field: mask_value(write.mask_kind, write.plaintext),
            }))
            .with_metadata(json!({
                "field": write.field.field,
                "mask_kind": write.mask_kind.as_str(),
            }));
        self.record_now(&entry).await?;

        Ok(sealed)
    }

    /// Best-effort access telemetry (`FILE_ACCESSED` and friends). The write
    /// is spawned so a cancelled caller cannot drop it, and a failed write is
    /// only logged.
    pub fn record_file_access(
        &self,
        actor: &Actor,
        entity_type: &str,
        entity_id: &str,
        metadata: Option<serde_json::Value>,
    ) {
        let mut entry = AuditEntry::new(actor.id, AuditAction::FileAccessed, entity_type, entity_id);
        if let Some(metadata) = metadata {
            entry = entry.with_metadata(metadata);
        }
        self.spawn_best_effort(entry);
    }

    /// Runs one request end to end through the gate's state machine:
    /// `Received -> Authenticated -> Authorized -> Executing -> Completed`,
    /// with `Denied` and `Failed` terminal.
    pub async fn enforce<T, F, Fut>(
        &self,
        actor: Option<&Actor>,
        module: Module,
        required: PermissionLevel,
        op: F,
    ) -> AccessResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        tracing::debug!(module = %module, phase = ?RequestPhase::Received, "request received");

        let Some(actor) = actor else {
            return Err(AccessError::AuthenticationMissing);
        };
        tracing::debug!(
            actor_id = %actor.id,
            module = %module,
            phase = ?RequestPhase::Authenticated,
            "actor resolved"
        );

        if let Err(err) = self.authorize(actor, module, required).await {
            tracing::debug!(
                actor_id = %actor.id,
                module = %module,
                phase = ?RequestPhase::Denied,
                "request denied"
            );
            return Err(err);
        }
        tracing::debug!(
            actor_id = %actor.id,
            module = %module,
            phase = ?RequestPhase::Authorized,
            "request authorized"
        );

        tracing::debug!(actor_id = %actor.id, module = %module, phase = ?RequestPhase::Executing, "executing");
        match op().await {
            Ok(value) => {
                tracing::debug!(
                    actor_id = %actor.id,
                    module = %module,
                    phase = ?RequestPhase::Completed,
                    "request completed"
                );
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(
                    actor_id = %actor.id,
                    module = %module,
                    phase = ?RequestPhase::Failed,
                    error = %err,
                    "operation failed"
                );
                Err(AccessError::Operation(err))
            }
        }
    }

    fn field_entry(&self, actor: &Actor, action: AuditAction, field: FieldRef<'_>) -> AuditEntry {
        AuditEntry::new(actor.id, action, field.entity_type, field.entity_id)
    }

    /// Compliance-critical write: the outcome is surfaced to the caller, but
    /// the write itself runs on a detached task so a cancelled request cannot
    /// abort it mid-flight and leave a hole in the trail.
    async fn record_now(&self, entry: &AuditEntry) -> AccessResult<()> {
        let sink = Arc::clone(&self.audit);
        let entry = entry.clone();
        let write = tokio::spawn(async move { sink.record(&entry).await });
        match write.await {
            Ok(result) => result.map_err(AccessError::from),
            Err(join_err) => Err(AccessError::Operation(join_err.into())),
        }
    }

    fn spawn_best_effort(&self, entry: AuditEntry) {
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(err) = sink.record(&entry).await {
                tracing::error!(
                    action = %entry.action,
                    entity_type = %entry.entity_type,
                    entity_id = %entry.entity_id,
                    error = %err,
                    "best-effort audit write failed"
                );
            }
        });
    }
}
