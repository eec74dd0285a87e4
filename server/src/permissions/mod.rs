//! Permission system types and utilities.
//!
//! Roles carry a [`Permissions`] bitmask. Routes declare a
//! [`PermissionRequirement`] and the guard middleware evaluates it against
//! every role assigned to the caller.

pub mod flags;
pub mod guard;
pub mod middleware;

pub use flags::Permissions;
pub use guard::{authorize, union_of, PermissionError, PermissionRequirement, RequirementMode};
pub use middleware::{enforce_permissions, require, with_requirement, CallerRoles};
