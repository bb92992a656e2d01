use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::tempdir;
use uuid::Uuid;

use hims_access::audit::{AuditAction, SqliteAuditSink};
use hims_access::authz::SensitivityTier;
use hims_access::codec::mask_value;
use hims_access::config::FieldKey;
use hims_access::gate::{FieldRead, FieldRef, FieldWrite};
use hims_access::{
    AccessError, Actor, EnforcementGate, FieldCipher, MaskKind, Module, PermissionLevel, Role,
};

async fn setup() -> Result<(EnforcementGate, SqliteAuditSink, tempfile::TempDir)> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    let sink = SqliteAuditSink::new(pool);
    let key = FieldKey::from_material("integration-test-key-0123456789ab")?;
    let gate = EnforcementGate::new(FieldCipher::new(&key), Arc::new(sink.clone()));

    Ok((gate, sink, dir))
}

fn actor(roles: &[Role]) -> Actor {
    Actor::new(Uuid::new_v4(), roles.iter().copied())
}

#[tokio::test]
async fn accounting_view_on_contracts_is_granted_silently() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let accounting = actor(&[Role::Accounting]);

    gate.authorize(&accounting, Module::Contracts, PermissionLevel::ViewAccess)
        .await?;

    assert!(sink.entries_for_actor(accounting.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn crew_portal_denial_on_principals_records_one_entry() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let portal = actor(&[Role::CrewPortal]);

    let err = gate
        .authorize(&portal, Module::Principals, PermissionLevel::ViewAccess)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::PermissionDenied { .. }));

    let entries = sink.entries_for_actor(portal.id).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::PermissionDenied);
    assert_eq!(entries[0].entity_type, "module");
    assert_eq!(entries[0].entity_id, "principals");
    Ok(())
}

#[tokio::test]
async fn hr_without_clearance_reads_passport_masked() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let hr_admin = actor(&[Role::HrAdmin]);
    let hr = actor(&[Role::Hr]);
    let field = FieldRef::new("crew", "crew-42", "passport_number");

    // HR_ADMIN seals the passport on write.
    let sealed = gate
        .write_protected_field(
            &hr_admin,
            FieldWrite {
                field,
                mask_kind: MaskKind::Passport,
                plaintext: "C1234567",
            },
        )
        .await?;

    // HR holds EDIT_ACCESS on crew yet no RED clearance: masked, never the
    // plaintext, and the ciphertext is not even attempted.
    let read = FieldRead {
        field,
        tier: SensitivityTier::Red,
        mask_kind: MaskKind::Passport,
        stored: sealed.as_str(),
        subject: None,
    };
    let shown = gate.read_protected_field(&hr, read).await?;

    assert_ne!(shown, "C1234567");
    assert!(shown.contains("****"));
    assert_eq!(shown, mask_value(MaskKind::Passport, sealed.as_str()));

    let entries = sink.entries_for_actor(hr.id).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::FieldMasked);
    assert_eq!(
        entries[0].metadata.as_ref().context("metadata")?["reason"],
        "clearance_absent"
    );
    Ok(())
}

#[tokio::test]
async fn cleared_actor_round_trips_a_red_field() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let hr_admin = actor(&[Role::HrAdmin]);
    let field = FieldRef::new("crew", "crew-42", "passport_number");

    let sealed = gate
        .write_protected_field(
            &hr_admin,
            FieldWrite {
                field,
                mask_kind: MaskKind::Passport,
                plaintext: "C1234567",
            },
        )
        .await?;

    let shown = gate
        .read_protected_field(
            &hr_admin,
            FieldRead {
                field,
                tier: SensitivityTier::Red,
                mask_kind: MaskKind::Passport,
                stored: sealed.as_str(),
                subject: None,
            },
        )
        .await?;
    assert_eq!(shown, "C1234567");

    // The write snapshot in the trail carries only the masked value.
    let entries = sink.entries_for_entity("crew", "crew-42").await?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::FieldEncrypted);
    let after = entries[0].after.as_ref().context("after snapshot")?;
    assert_eq!(after["passport_number"], "C1****67");
    assert_eq!(entries[1].action, AuditAction::FieldDecrypted);
    Ok(())
}

#[tokio::test]
async fn corrupted_ciphertext_is_masked_not_an_error() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let hr_admin = actor(&[Role::HrAdmin]);
    let field = FieldRef::new("crew", "crew-9", "medical_result");

    let sealed = gate
        .write_protected_field(
            &hr_admin,
            FieldWrite {
                field,
                mask_kind: MaskKind::MedicalResult,
                plaintext: "fit for duty",
            },
        )
        .await?;

    // Corrupt the stored blob the way a bad migration or bit rot would.
    let mut corrupted = sealed.into_inner();
    corrupted.insert(4, '!');

    let shown = gate
        .read_protected_field(
            &hr_admin,
            FieldRead {
                field,
                tier: SensitivityTier::Red,
                mask_kind: MaskKind::MedicalResult,
                stored: &corrupted,
                subject: None,
            },
        )
        .await?;

    assert_eq!(shown, mask_value(MaskKind::MedicalResult, &corrupted));
    assert_ne!(shown, "fit for duty");

    let entries = sink.entries_for_entity("crew", "crew-9").await?;
    assert_eq!(entries.last().context("entry")?.action, AuditAction::FieldMasked);
    assert_eq!(
        entries.last().context("entry")?.metadata.as_ref().context("metadata")?["reason"],
        "crypto_failure"
    );
    Ok(())
}

#[tokio::test]
async fn crew_portal_sees_only_its_own_passport_unmasked() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let hr_admin = actor(&[Role::HrAdmin]);
    let member = actor(&[Role::CrewPortal]);
    let field = FieldRef::new("crew", "crew-12", "passport_number");

    let sealed = gate
        .write_protected_field(
            &hr_admin,
            FieldWrite {
                field,
                mask_kind: MaskKind::Passport,
                plaintext: "C1234567",
            },
        )
        .await?;

    // The member's own record decrypts.
    let own = gate
        .read_protected_field(
            &member,
            FieldRead {
                field,
                tier: SensitivityTier::Red,
                mask_kind: MaskKind::Passport,
                stored: sealed.as_str(),
                subject: Some(member.id),
            },
        )
        .await?;
    assert_eq!(own, "C1234567");

    // A different portal actor gets the masked form, with the scope denial
    // retained server-side in the trail.
    let stranger = actor(&[Role::CrewPortal]);
    let shown = gate
        .read_protected_field(
            &stranger,
            FieldRead {
                field,
                tier: SensitivityTier::Red,
                mask_kind: MaskKind::Passport,
                stored: sealed.as_str(),
                subject: Some(member.id),
            },
        )
        .await?;
    assert_ne!(shown, "C1234567");
    assert_eq!(shown, mask_value(MaskKind::Passport, sealed.as_str()));

    let entries = sink.entries_for_actor(stranger.id).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::FieldMasked);
    assert_eq!(
        entries[0].metadata.as_ref().context("metadata")?["reason"],
        "subject_out_of_scope"
    );
    Ok(())
}

#[tokio::test]
async fn system_admin_override_is_audited_distinctly() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let admin = actor(&[Role::Staff]).with_system_admin(true);

    gate.authorize(&admin, Module::Accounting, PermissionLevel::FullAccess)
        .await?;

    let entries = sink.entries_for_actor(admin.id).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::AdminOverride);
    assert_eq!(entries[0].entity_id, "accounting");
    Ok(())
}

#[tokio::test]
async fn enforce_runs_the_operation_only_when_authorized() -> Result<()> {
    let (gate, sink, _dir) = setup().await?;
    let hr = actor(&[Role::Hr]);

    let created = gate
        .enforce(Some(&hr), Module::Crew, PermissionLevel::EditAccess, || async {
            Ok("crew-101".to_string())
        })
        .await?;
    assert_eq!(created, "crew-101");

    // Staff has no accounting access at all; the operation must not run.
    let staff = actor(&[Role::Staff]);
    let err = gate
        .enforce(
            Some(&staff),
            Module::Accounting,
            PermissionLevel::ViewAccess,
            || async {
                panic!("must not execute");
                #[allow(unreachable_code)]
                Ok(())
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::PermissionDenied { .. }));
    assert_eq!(sink.entries_for_actor(staff.id).await?.len(), 1);

    // No actor resolved at all.
    let err = gate
        .enforce(None, Module::Crew, PermissionLevel::ViewAccess, || async { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::AuthenticationMissing));
    Ok(())
}
