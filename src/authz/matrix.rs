//! The permission and sensitivity matrices.
//!
//! Both matrices are pure functions over closed enums: every Role x Module
//! pair is decidable at compile time and anything not explicitly granted is
//! NONE. There is no runtime mutation; a policy change is a code change.

use super::roles::{Module, PermissionLevel, Role, SensitivityTier};

/// Looks up the permission level a single role holds on a module.
pub fn permission_level(role: Role, module: Module) -> PermissionLevel {
    use Module as M;
    use PermissionLevel::{EditAccess as Edit, FullAccess as Full, None, ViewAccess as View};

    match role {
        // Top management: full access to everything.
        Role::Director => Full,

        // Crew Documentation & Mobilization Officer: full crew management,
        // documents, contracts, agency agreements.
        Role::Cdmo => match module {
            M::Dashboard => Full,
            M::Crew => Full,
            M::Principals => Full,
            M::Contracts => Full,
            M::Applications => Full,
            M::Assignments => Full,
            M::Vessels => View,
            M::Documents => Full,
            M::Medical => Edit,
            M::Visas => Full,
            M::AgencyFees => Full,
            M::Accounting => None,
            M::WageScales => View,
            M::AgencyAgreements => Full,
            M::Disciplinary => Edit,
            M::Quality => View,
            M::NationalHolidays => View,
            M::Compliance => Full,
            M::Crewing => Full,
            M::Insurance => Edit,
            M::Dispatches => Full,
            M::Pkl => Full,
        },

        // Fleet operations, dispatches, basic crew info.
        Role::Operational => match module {
            M::Dashboard => Full,
            M::Crew => View,
            M::Principals => View,
            M::Contracts => View,
            M::Applications => View,
            M::Assignments => View,
            M::Vessels => Full,
            M::Documents => Edit,
            M::Visas => Edit,
            M::AgencyAgreements => View,
            M::Disciplinary => View,
            M::Quality => Edit,
            M::NationalHolidays => View,
            M::Compliance => View,
            M::Crewing => Edit,
            M::Insurance => View,
            M::Dispatches => Full,
            M::Pkl => Edit,
            _ => None,
        },

        // Financial modules, wage scales, agency fees; enhanced contract access.
        Role::Accounting => match module {
            M::Dashboard => Full,
            M::Crew => View,
            M::Principals => View,
            M::Contracts => Full,
            M::Vessels => View,
            M::Documents => View,
            M::AgencyFees => Full,
            M::Accounting => Full,
            M::WageScales => Full,
            M::AgencyAgreements => Edit,
            M::NationalHolidays => View,
            M::Crewing => View,
            M::Insurance => View,
            M::Dispatches => View,
            M::Pkl => View,
            _ => None,
        },

        // HR functions, disciplinary, quality, training.
        Role::Hr => match module {
            M::Dashboard => Full,
            M::Crew => Edit,
            M::Principals => View,
            M::Contracts => View,
            M::Applications => Edit,
            M::Assignments => Edit,
            M::Vessels => View,
            M::Documents => Edit,
            M::Medical => Full,
            M::Visas => Edit,
            M::WageScales => View,
            M::AgencyAgreements => View,
            M::Disciplinary => Full,
            M::Quality => Full,
            M::NationalHolidays => Full,
            M::Compliance => Edit,
            M::Crewing => Edit,
            M::Insurance => Edit,
            M::Dispatches => View,
            M::Pkl => Edit,
            _ => None,
        },

        // HR with administrative ownership of crew records and applications.
        Role::HrAdmin => match module {
            M::Dashboard => Full,
            M::Crew => Full,
            M::Principals => View,
            M::Contracts => View,
            M::Applications => Full,
            M::Assignments => Edit,
            M::Vessels => View,
            M::Documents => Full,
            M::Medical => Full,
            M::Visas => Edit,
            M::WageScales => View,
            M::AgencyAgreements => View,
            M::Disciplinary => Full,
            M::Quality => Full,
            M::NationalHolidays => Full,
            M::Compliance => Full,
            M::Crewing => Edit,
            M::Insurance => Edit,
            M::Dispatches => View,
            M::Pkl => Edit,
            _ => None,
        },

        // Quality Management Representative: owns quality and compliance.
        Role::Qmr => match module {
            M::Dashboard => Full,
            M::Crew => View,
            M::Vessels => View,
            M::Documents => Edit,
            M::Disciplinary => View,
            M::Quality => Full,
            M::NationalHolidays => View,
            M::Compliance => Full,
            M::Crewing => View,
            _ => None,
        },

        // Department section heads: review-level office access.
        Role::SectionHead => match module {
            M::Dashboard => Full,
            M::Crew => View,
            M::Contracts => View,
            M::Applications => View,
            M::Assignments => View,
            M::Vessels => View,
            M::Documents => View,
            M::Disciplinary => Edit,
            M::Quality => Edit,
            M::NationalHolidays => View,
            M::Compliance => View,
            M::Crewing => View,
            _ => None,
        },

        // General office staff: view-only on non-sensitive modules.
        Role::Staff => match module {
            M::Dashboard => View,
            M::Crew => View,
            M::Vessels => View,
            M::Documents => View,
            M::NationalHolidays => View,
            M::Crewing => View,
            _ => None,
        },

        // Crew self-service: limited view of own records.
        Role::CrewPortal => match module {
            M::Dashboard => View,
            M::Crew => View,
            M::Vessels => View,
            M::Documents => View,
            M::Medical => View,
            M::Visas => View,
            M::NationalHolidays => View,
            M::Compliance => View,
            M::Crewing => View,
            M::Insurance => View,
            M::Pkl => View,
            _ => None,
        },
    }
}

/// Whether a role holds explicit clearance for unmasked RED-tier data.
///
/// This is independent of module permission: a role can hold FULL_ACCESS on a
/// module and still be denied unmasked RED data.
pub fn has_red_clearance(role: Role) -> bool {
    match role {
        Role::Director | Role::Cdmo | Role::HrAdmin => true,
        // Crew members may see their own RED data; the self-scope rule is
        // enforced separately by `Actor::may_access_subject`.
        Role::CrewPortal => true,
        // Plain HR edits crew records but reads identity documents, medical
        // results and salary figures masked; HR_ADMIN carries the clearance.
        Role::Hr
        | Role::Operational
        | Role::Accounting
        | Role::Qmr
        | Role::SectionHead
        | Role::Staff => false,
    }
}

/// Whether a role may view unmasked data of the given tier.
pub fn may_view_tier(role: Role, tier: SensitivityTier) -> bool {
    match tier {
        SensitivityTier::Green => true,
        // AMBER is gated by module permission, which callers check upstream;
        // the tier itself adds no extra gate.
        SensitivityTier::Amber => true,
        SensitivityTier::Red => has_red_clearance(role),
    }
}

/// Modules on which the role holds any permission at all.
pub fn accessible_modules(role: Role) -> Vec<Module> {
    Module::ALL
        .into_iter()
        .filter(|module| permission_level(role, *module) > PermissionLevel::None)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_total_over_all_pairs() {
        // The match is exhaustive by construction; this pins down that every
        // pair yields a well-formed level without panicking.
        for role in Role::ALL {
            for module in Module::ALL {
                let _ = permission_level(role, module);
            }
        }
    }

    #[test]
    fn director_has_full_access_everywhere() {
        for module in Module::ALL {
            assert_eq!(
                permission_level(Role::Director, module),
                PermissionLevel::FullAccess
            );
        }
    }

    #[test]
    fn accounting_holds_full_access_on_contracts() {
        assert_eq!(
            permission_level(Role::Accounting, Module::Contracts),
            PermissionLevel::FullAccess
        );
    }

    #[test]
    fn crew_portal_has_no_access_to_principals() {
        assert_eq!(
            permission_level(Role::CrewPortal, Module::Principals),
            PermissionLevel::None
        );
    }

    #[test]
    fn module_permission_does_not_imply_red_clearance() {
        // HR holds FULL_ACCESS on medical yet RED clearance is a separate
        // grant; Accounting holds FULL_ACCESS on accounting with no clearance.
        assert_eq!(
            permission_level(Role::Accounting, Module::Accounting),
            PermissionLevel::FullAccess
        );
        assert!(!has_red_clearance(Role::Accounting));
        assert!(!has_red_clearance(Role::Operational));
        assert!(!has_red_clearance(Role::Hr));
    }

    #[test]
    fn green_and_amber_are_unrestricted_at_tier_level() {
        for role in Role::ALL {
            assert!(may_view_tier(role, SensitivityTier::Green));
            assert!(may_view_tier(role, SensitivityTier::Amber));
        }
    }

    #[test]
    fn accessible_modules_excludes_none_grants() {
        let modules = accessible_modules(Role::Staff);
        assert!(modules.contains(&Module::Dashboard));
        assert!(!modules.contains(&Module::Accounting));
        assert!(!modules.contains(&Module::Principals));
    }
}
