pub mod audit;
pub mod authz;
pub mod codec;
pub mod config;
pub mod errors;
pub mod gate;

// Re-export the main entry points for consumers and tests
pub use authz::{Actor, Module, PermissionLevel, Role, SensitivityTier};
pub use codec::{EncryptedField, FieldCipher, MaskKind};
pub use errors::{AccessError, AccessResult};
pub use gate::EnforcementGate;
