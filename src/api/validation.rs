//! Input validation for API requests.
//!
//! Only shape checks happen here; whether credentials are correct is decided
//! by the Pelios API.

use super::error::{ApiError, ValidationErrorBuilder};
use crate::models::Credentials;

const MAX_FIELD_LEN: usize = 256;

/// Validate a user name
pub fn validate_user_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("User name is required".to_string());
    }

    if name.len() > MAX_FIELD_LEN {
        return Err(format!("User name is too long (max {} characters)", MAX_FIELD_LEN));
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > MAX_FIELD_LEN {
        return Err(format!("Password is too long (max {} characters)", MAX_FIELD_LEN));
    }

    Ok(())
}

/// Validate a credentials payload, collecting every field error
pub fn validate_credentials(credentials: &Credentials) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_user_name(&credentials.user_name) {
        errors.add("userName", e);
    }
    if let Err(e) = validate_password(&credentials.password) {
        errors.add("password", e);
    }

    errors.finish()
}
