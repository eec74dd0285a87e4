//! Password hashing and strength rules.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::ValidationError;

use crate::error::{ApiError, ApiResult};

/// Special characters a password must draw at least one from.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal("auth::hash_password", e))
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| ApiError::internal("auth::verify_password", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Require an uppercase letter, a lowercase letter, a digit and one of
/// [`PASSWORD_SPECIALS`]. Length is checked separately.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password").with_message(
            "Password must include at least one uppercase letter, one lowercase letter, one number, and one special character."
                .into(),
        ))
    }
}
