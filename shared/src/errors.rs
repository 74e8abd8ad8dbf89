//! Error types for the Fitness Assistant auth surface

use thiserror::Error;

/// Form validation failures
///
/// Raised before any call to the identity provider is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Email too long")]
    EmailTooLong,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Password too long")]
    PasswordTooLong,

    #[error("Name too long")]
    NameTooLong,
}

impl ValidationError {
    /// Form field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field) => field,
            ValidationError::InvalidEmail | ValidationError::EmailTooLong => "email",
            ValidationError::PasswordTooShort { .. } | ValidationError::PasswordTooLong => {
                "password"
            }
            ValidationError::NameTooLong => "name",
        }
    }
}
