use uuid::Uuid;

use super::matrix::{may_view_tier, permission_level};
use super::roles::{Module, PermissionLevel, Role, SensitivityTier};

/// The authenticated identity performing a request.
///
/// Resolved by the authentication layer and handed to the enforcement gate.
/// The role set is never empty: an actor constructed with no roles is
/// normalized to the lowest-privilege role rather than rejected, so a
/// misconfigured account degrades to crew-portal visibility instead of
/// failing arbitrarily. The normalization is logged as a warning.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    roles: Vec<Role>,
    system_admin: bool,
}

impl Actor {
    pub fn new(id: Uuid, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut deduped: Vec<Role> = Vec::new();
        for role in roles {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }

        if deduped.is_empty() {
            tracing::warn!(actor_id = %id, "actor has no roles, normalizing to CREW_PORTAL");
            deduped.push(Role::CrewPortal);
        }

        Self {
            id,
            roles: deduped,
            system_admin: false,
        }
    }

    /// Builds an actor from raw role strings, normalizing unknown values.
    pub fn from_role_names<'a>(id: Uuid, names: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(id, names.into_iter().map(Role::parse_or_default))
    }

    /// Marks the actor as a system administrator. The flag bypasses the
    /// permission matrix but never the sensitivity matrix.
    pub fn with_system_admin(mut self, system_admin: bool) -> Self {
        self.system_admin = system_admin;
        self
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_system_admin(&self) -> bool {
        self.system_admin
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Effective module permission: the maximum level across the actor's
    /// roles. System admins short-circuit to FULL_ACCESS; the gate records
    /// that bypass distinctly so an audit can tell policy from override.
    pub fn effective_permission(&self, module: Module) -> PermissionLevel {
        if self.system_admin {
            tracing::debug!(
                actor_id = %self.id,
                module = %module,
                "system_admin bypass"
            );
            return PermissionLevel::FullAccess;
        }

        self.roles
            .iter()
            .map(|role| permission_level(*role, module))
            .max()
            .unwrap_or(PermissionLevel::None)
    }

    /// Whether any of the actor's roles clears the given sensitivity tier.
    ///
    /// The system-admin flag deliberately plays no part here: elevating
    /// module permission must never silently elevate data clearance.
    pub fn may_view_unmasked(&self, tier: SensitivityTier) -> bool {
        let allowed = self.roles.iter().any(|role| may_view_tier(*role, tier));
        if !allowed {
            tracing::debug!(
                actor_id = %self.id,
                tier = %tier,
                "sensitivity clearance absent"
            );
        }
        allowed
    }

    /// Crew self-service scope: an actor whose only role is CREW_PORTAL may
    /// touch nothing but its own records. Office roles have broader access
    /// governed by the permission matrix.
    pub fn may_access_subject(&self, subject_id: Uuid) -> bool {
        let portal_only = self.roles.iter().all(|role| *role == Role::CrewPortal);
        if portal_only && !self.system_admin {
            return subject_id == self.id;
        }
        true
    }
}

/// `actual` satisfies `required` under the total permission order.
pub fn meets_requirement(actual: PermissionLevel, required: PermissionLevel) -> bool {
    actual >= required
}
