//! Input validation functions
//!
//! Mirrors the constraints the auth pages put on their inputs so a
//! submission that skipped the browser checks is still rejected before
//! it reaches the identity provider.

use crate::errors::ValidationError;
use validator::ValidateEmail;

/// Minimum password length accepted on sign-up
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MAX_EMAIL_LENGTH: usize = 255;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;

/// Reject a blank value for a required field
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if !email.validate_email() {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Validate password length
///
/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str, min: usize) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < min {
        return Err(ValidationError::PasswordTooShort { min });
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate display name
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Required("name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}
