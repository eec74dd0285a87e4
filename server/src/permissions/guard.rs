//! Permission evaluation.
//!
//! A protected route declares a [`PermissionRequirement`]: a list of
//! permissions and a mode. Each required permission is satisfied when at
//! least one of the caller's roles carries all of its bits. In
//! [`RequirementMode::All`] every listed permission must be satisfied, in
//! [`RequirementMode::Any`] at least one.
//!
//! Roles are checked one by one. Because a single-bit requirement is
//! satisfied by some role exactly when it is set in the union of all roles,
//! [`PermissionRequirement::is_satisfied_by_union`] gives the same answer for
//! single-bit requirements; the tests below pin that equivalence.

use serde::{Deserialize, Serialize};

use super::flags::Permissions;
use crate::users::UserStatus;

/// How the permissions of a requirement combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementMode {
    /// Every listed permission must be satisfied.
    All,
    /// At least one listed permission must be satisfied.
    Any,
}

/// Permissions a route demands from its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub permissions: Vec<Permissions>,
    pub mode: RequirementMode,
}

impl PermissionRequirement {
    /// Require every permission in `permissions`.
    pub fn all(permissions: impl IntoIterator<Item = Permissions>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
            mode: RequirementMode::All,
        }
    }

    /// Require at least one permission in `permissions`.
    pub fn any(permissions: impl IntoIterator<Item = Permissions>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
            mode: RequirementMode::Any,
        }
    }

    /// Shorthand for a single required permission.
    #[must_use]
    pub fn one(permission: Permissions) -> Self {
        Self::all([permission])
    }

    /// Evaluate against each role mask independently.
    ///
    /// An empty list grants in `All` mode and denies in `Any` mode.
    #[must_use]
    pub fn is_satisfied_by(&self, roles: &[Permissions]) -> bool {
        let satisfied = |required: &Permissions| roles.iter().any(|role| role.has(*required));
        match self.mode {
            RequirementMode::All => self.permissions.iter().all(satisfied),
            RequirementMode::Any => self.permissions.iter().any(satisfied),
        }
    }

    /// Evaluate against the pre-computed union of the caller's roles.
    ///
    /// Agrees with [`Self::is_satisfied_by`] whenever every required
    /// permission is a single bit, which is how routes declare them.
    #[must_use]
    pub fn is_satisfied_by_union(&self, union: Permissions) -> bool {
        let satisfied = |required: &Permissions| union.has(*required);
        match self.mode {
            RequirementMode::All => self.permissions.iter().all(satisfied),
            RequirementMode::Any => self.permissions.iter().any(satisfied),
        }
    }
}

/// Union of the given role masks.
#[must_use]
pub fn union_of(roles: &[Permissions]) -> Permissions {
    roles
        .iter()
        .fold(Permissions::empty(), |acc, role| acc | *role)
}

/// Decide whether a caller may proceed.
///
/// - No requirement: granted, regardless of the caller.
/// - Caller unknown: [`PermissionError::UserNotFound`].
/// - Caller not active: [`PermissionError::UserInactive`].
/// - Otherwise the requirement is evaluated per role.
pub fn authorize(
    caller_status: Option<UserStatus>,
    roles: &[Permissions],
    requirement: Option<&PermissionRequirement>,
) -> Result<(), PermissionError> {
    let Some(requirement) = requirement else {
        return Ok(());
    };

    match caller_status {
        None => return Err(PermissionError::UserNotFound),
        Some(UserStatus::Active) => {}
        Some(_) => return Err(PermissionError::UserInactive),
    }

    if requirement.is_satisfied_by(roles) {
        Ok(())
    } else {
        Err(PermissionError::Denied {
            required: requirement.permissions.clone(),
            mode: requirement.mode,
        })
    }
}

/// Permission check errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// No user behind the session, or the user row is gone.
    UserNotFound,

    /// User exists but is not active.
    UserInactive,

    /// Role set does not satisfy the requirement.
    Denied {
        required: Vec<Permissions>,
        mode: RequirementMode,
    },
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound => write!(f, "User not found"),
            Self::UserInactive => write!(f, "User is not active"),
            Self::Denied { .. } => write!(f, "Permission denied"),
        }
    }
}

impl std::error::Error for PermissionError {}
