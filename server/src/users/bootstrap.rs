//! First administrator.
//!
//! An empty installation has nobody able to create users. When
//! `BOOTSTRAP_ADMIN_EMAIL`/`BOOTSTRAP_ADMIN_PASSWORD` are set and the user
//! table is empty, that account is created holding the seeded
//! `Administrator` role.

use anyhow::{bail, Context, Result};
use sqlx::PgPool;
use tracing::info;

use super::queries;
use crate::auth::{hash_password, validate_password_strength};
use crate::config::BootstrapAdmin;
use crate::roles;

/// Name of the role seeded by the initial migration.
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// Create the bootstrap administrator if no user exists yet.
///
/// Returns the new user's id, or `None` when users already exist.
pub async fn ensure_admin(pool: &PgPool, admin: &BootstrapAdmin) -> Result<Option<i64>> {
    if !queries::is_empty(pool).await? {
        return Ok(None);
    }

    if validate_password_strength(&admin.password).is_err() || admin.password.len() < 12 {
        bail!("BOOTSTRAP_ADMIN_PASSWORD does not meet the password policy");
    }

    let role = roles::queries::find_by_name(pool, ADMINISTRATOR_ROLE)
        .await?
        .context("Administrator role is missing; run migrations first")?;

    let password_hash = hash_password(&admin.password)?;
    let email = admin.email.trim().to_lowercase();

    let mut tx = pool.begin().await?;
    let user = queries::create(&mut *tx, admin.name.trim(), &email, &password_hash).await?;
    queries::assign_role(&mut *tx, user.id, role.id).await?;
    tx.commit().await?;

    info!(user_id = user.id, role_id = role.id, "Bootstrap administrator created");
    Ok(Some(user.id))
}
