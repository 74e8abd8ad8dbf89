//! Form payloads and small shared enums

use crate::errors::ValidationError;
use crate::validation::{
    require, validate_display_name, validate_email, validate_password, MIN_PASSWORD_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sign-in form submission
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignInForm {
    /// Check the fields in the order they appear on the page.
    ///
    /// Only presence and email format are enforced here; the password
    /// length rule belongs to the identity provider on sign-in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        validate_email(self.email.trim())?;
        require("password", &self.password)?;
        Ok(())
    }
}

impl fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sign-up form submission
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpForm {
    /// Check the fields in the order they appear on the page.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        validate_display_name(self.name.trim())?;
        require("email", &self.email)?;
        validate_email(self.email.trim())?;
        require("password", &self.password)?;
        validate_password(&self.password, MIN_PASSWORD_LENGTH)?;
        Ok(())
    }
}

impl fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One-shot notification shown after a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SignedIn,
    CheckEmail,
    SignedOut,
}

impl Notice {
    /// Short code stored in the flash cookie
    pub fn code(&self) -> &'static str {
        match self {
            Notice::SignedIn => "signed-in",
            Notice::CheckEmail => "check-email",
            Notice::SignedOut => "signed-out",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::SignedIn => "Signed in!",
            Notice::CheckEmail => "Sign-up successful!",
            Notice::SignedOut => "Signed out",
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self {
            Notice::CheckEmail => Some("Please check your email to confirm your account."),
            _ => None,
        }
    }
}

impl FromStr for Notice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signed-in" => Ok(Notice::SignedIn),
            "check-email" => Ok(Notice::CheckEmail),
            "signed-out" => Ok(Notice::SignedOut),
            _ => Err(()),
        }
    }
}

/// Third-party providers the identity service can federate to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            _ => Err(()),
        }
    }
}
