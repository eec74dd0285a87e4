//! Route-level permission guard.
//!
//! A route opts in by attaching a [`PermissionRequirement`] with
//! [`with_requirement`]; [`enforce_permissions`] then loads the caller and
//! their roles and evaluates the requirement. Routes without a requirement
//! pass straight through.
//!
//! ```ignore
//! let route = require(
//!     get(handlers::list),
//!     &state,
//!     PermissionRequirement::one(Permissions::READ_USERS),
//! );
//! ```

use axum::{
    extract::{Request, State},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use futures::future::BoxFuture;

use super::flags::Permissions;
use super::guard::{authorize, PermissionError, PermissionRequirement};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::roles::{self, Role};
use crate::users::{self, UserStatus};

/// Roles of the caller, loaded by the guard and available to handlers.
#[derive(Debug, Clone, Default)]
pub struct CallerRoles(pub Vec<Role>);

impl CallerRoles {
    /// Permission masks, one per role.
    #[must_use]
    pub fn masks(&self) -> Vec<Permissions> {
        self.0.iter().map(|role| role.permissions).collect()
    }

    /// Evaluate an additional requirement against the already-loaded roles.
    #[must_use]
    pub fn satisfies(&self, requirement: &PermissionRequirement) -> bool {
        requirement.is_satisfied_by(&self.masks())
    }

    /// Like [`Self::satisfies`], failing with [`PermissionError::Denied`].
    pub fn check(&self, requirement: &PermissionRequirement) -> Result<(), PermissionError> {
        if self.satisfies(requirement) {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                required: requirement.permissions.clone(),
                mode: requirement.mode,
            })
        }
    }
}

impl<S> axum::extract::FromRequestParts<S> for CallerRoles
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Forbidden(PermissionError::UserNotFound.to_string()))
    }
}

/// Attach a permission requirement to the request.
///
/// Must be layered outside [`enforce_permissions`] so the requirement is
/// present when the guard runs.
pub fn with_requirement(
    requirement: PermissionRequirement,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    move |mut request: Request, next: Next| {
        request.extensions_mut().insert(requirement.clone());
        Box::pin(async move { next.run(request).await })
    }
}

/// Evaluate the attached [`PermissionRequirement`] for the authenticated caller.
///
/// On success the caller's roles are inserted as [`CallerRoles`].
pub async fn enforce_permissions(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(requirement) = request.extensions().get::<PermissionRequirement>().cloned() else {
        return Ok(next.run(request).await);
    };

    let caller = request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.id)
        .ok_or(PermissionError::UserNotFound)?;

    let status = users::queries::find_status(&state.db, caller).await?;

    let roles = if status == Some(UserStatus::Active) {
        roles::queries::find_by_user(&state.db, caller).await?
    } else {
        Vec::new()
    };
    let caller_roles = CallerRoles(roles);

    if let Err(err) = authorize(status, &caller_roles.masks(), Some(&requirement)) {
        tracing::debug!(user_id = caller, error = %err, "Permission check failed");
        return Err(err.into());
    }

    request.extensions_mut().insert(caller_roles);
    Ok(next.run(request).await)
}

/// Guard a method router with `requirement`.
pub fn require(
    route: MethodRouter<AppState>,
    state: &AppState,
    requirement: PermissionRequirement,
) -> MethodRouter<AppState> {
    route
        .route_layer(from_fn_with_state(state.clone(), enforce_permissions))
        .route_layer(from_fn(with_requirement(requirement)))
}
