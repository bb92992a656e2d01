use serde::{Deserialize, Serialize};

/// The closed set of application roles.
///
/// Roles are fixed at compile time; there is no runtime role authoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Director,
    Cdmo,
    Operational,
    Accounting,
    Hr,
    HrAdmin,
    Qmr,
    SectionHead,
    Staff,
    CrewPortal,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Director,
        Role::Cdmo,
        Role::Operational,
        Role::Accounting,
        Role::Hr,
        Role::HrAdmin,
        Role::Qmr,
        Role::SectionHead,
        Role::Staff,
        Role::CrewPortal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "DIRECTOR",
            Role::Cdmo => "CDMO",
            Role::Operational => "OPERATIONAL",
            Role::Accounting => "ACCOUNTING",
            Role::Hr => "HR",
            Role::HrAdmin => "HR_ADMIN",
            Role::Qmr => "QMR",
            Role::SectionHead => "SECTION_HEAD",
            Role::Staff => "STAFF",
            Role::CrewPortal => "CREW_PORTAL",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_uppercase().as_str() {
            "DIRECTOR" => Some(Role::Director),
            "CDMO" => Some(Role::Cdmo),
            "OPERATIONAL" => Some(Role::Operational),
            "ACCOUNTING" => Some(Role::Accounting),
            "HR" => Some(Role::Hr),
            "HR_ADMIN" => Some(Role::HrAdmin),
            "QMR" => Some(Role::Qmr),
            "SECTION_HEAD" => Some(Role::SectionHead),
            "STAFF" => Some(Role::Staff),
            "CREW_PORTAL" => Some(Role::CrewPortal),
            _ => None,
        }
    }

    /// Parses a role name, normalizing unknown values to the lowest-privilege
    /// role instead of failing. Session payloads from older deployments carry
    /// role strings this build no longer knows about.
    pub fn parse_or_default(value: &str) -> Role {
        match Role::parse(value) {
            Some(role) => role,
            None => {
                tracing::warn!(role = %value, "unknown role string, defaulting to CREW_PORTAL");
                Role::CrewPortal
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission levels, totally ordered so "meets or exceeds" is `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    None,
    ViewAccess,
    EditAccess,
    FullAccess,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::None => "NO_ACCESS",
            PermissionLevel::ViewAccess => "VIEW_ACCESS",
            PermissionLevel::EditAccess => "EDIT_ACCESS",
            PermissionLevel::FullAccess => "FULL_ACCESS",
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of business modules gated by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Module {
    Dashboard,
    Crew,
    Principals,
    Contracts,
    Applications,
    Assignments,
    Vessels,
    Documents,
    Medical,
    Visas,
    AgencyFees,
    Accounting,
    WageScales,
    AgencyAgreements,
    Disciplinary,
    Quality,
    NationalHolidays,
    Compliance,
    Crewing,
    Insurance,
    Dispatches,
    Pkl,
}

impl Module {
    pub const ALL: [Module; 22] = [
        Module::Dashboard,
        Module::Crew,
        Module::Principals,
        Module::Contracts,
        Module::Applications,
        Module::Assignments,
        Module::Vessels,
        Module::Documents,
        Module::Medical,
        Module::Visas,
        Module::AgencyFees,
        Module::Accounting,
        Module::WageScales,
        Module::AgencyAgreements,
        Module::Disciplinary,
        Module::Quality,
        Module::NationalHolidays,
        Module::Compliance,
        Module::Crewing,
        Module::Insurance,
        Module::Dispatches,
        Module::Pkl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Crew => "crew",
            Module::Principals => "principals",
            Module::Contracts => "contracts",
            Module::Applications => "applications",
            Module::Assignments => "assignments",
            Module::Vessels => "vessels",
            Module::Documents => "documents",
            Module::Medical => "medical",
            Module::Visas => "visas",
            Module::AgencyFees => "agencyFees",
            Module::Accounting => "accounting",
            Module::WageScales => "wageScales",
            Module::AgencyAgreements => "agencyAgreements",
            Module::Disciplinary => "disciplinary",
            Module::Quality => "quality",
            Module::NationalHolidays => "nationalHolidays",
            Module::Compliance => "compliance",
            Module::Crewing => "crewing",
            Module::Insurance => "insurance",
            Module::Dispatches => "dispatches",
            Module::Pkl => "pkl",
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-sensitivity tiers for stored values.
///
/// GREEN data is unrestricted. AMBER data is gated only by module permission.
/// RED data (identity documents, medical results, salary figures) additionally
/// requires explicit clearance; module permission alone never grants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitivityTier {
    Green,
    Amber,
    Red,
}

impl SensitivityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityTier::Green => "GREEN",
            SensitivityTier::Amber => "AMBER",
            SensitivityTier::Red => "RED",
        }
    }
}

impl std::fmt::Display for SensitivityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
