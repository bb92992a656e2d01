//! Authorization module - roles, permission matrix, and evaluation
//!
//! This module implements the role/module permission model with support for:
//! - A closed set of roles and business modules
//! - An immutable Role x Module permission matrix (NONE default)
//! - Data-sensitivity tiers (GREEN/AMBER/RED) orthogonal to module permission
//! - Multi-role actors with a system-admin override flag

mod evaluator;
mod matrix;
mod roles;

pub use evaluator::{meets_requirement, Actor};
pub use matrix::{accessible_modules, has_red_clearance, may_view_tier, permission_level};
pub use roles::{Module, PermissionLevel, Role, SensitivityTier};
