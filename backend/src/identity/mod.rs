//! External identity provider
//!
//! Everything that actually authenticates a user lives on the hosted
//! provider. This module only describes what the web service asks of it
//! and carries the opaque session it hands back.

mod gotrue;

pub use gotrue::GoTrueClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitness_auth_shared::OAuthProvider;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Errors returned by the identity provider client
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The provider answered and said no (bad credentials, duplicate email, ...)
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("identity provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid identity provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl IdentityError {
    /// Text suitable for an on-page notification
    pub fn user_message(&self) -> String {
        match self {
            IdentityError::Rejected { message, .. } => message.clone(),
            IdentityError::Unreachable(_) => {
                "The sign-in service is unavailable. Please try again later.".to_string()
            }
            IdentityError::UnexpectedResponse(_) | IdentityError::InvalidUrl(_) => {
                "Something went wrong while contacting the sign-in service.".to_string()
            }
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, IdentityError::Rejected { .. })
    }
}

/// User record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Provider-issued session
///
/// The tokens are opaque here: they are stored in cookies and handed back
/// to the provider, never decoded.
pub struct Session {
    access_token: SecretString,
    refresh_token: SecretString,
    expires_at: Option<DateTime<Utc>>,
    user: IdentityUser,
}

impl Session {
    pub fn new(
        access_token: SecretString,
        refresh_token: SecretString,
        expires_at: Option<DateTime<Utc>>,
        user: IdentityUser,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            user,
        }
    }

    #[inline]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[inline]
    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[inline]
    pub fn user(&self) -> &IdentityUser {
        &self.user
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving the session for a request
#[derive(Debug)]
pub enum SessionLookup {
    /// The presented access token is still valid
    Active(Session),
    /// The provider issued new tokens; cookies must be rewritten
    Refreshed(Session),
    Missing,
}

impl SessionLookup {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionLookup::Active(session) | SessionLookup::Refreshed(session) => Some(session),
            SessionLookup::Missing => None,
        }
    }

    pub fn into_session(self) -> Option<Session> {
        match self {
            SessionLookup::Active(session) | SessionLookup::Refreshed(session) => Some(session),
            SessionLookup::Missing => None,
        }
    }
}

/// Outcome of a sign-up
#[derive(Debug)]
pub enum Registration {
    /// The provider sent a confirmation email; no session yet
    PendingConfirmation(IdentityUser),
    /// Email confirmation is disabled on the provider
    SignedIn(Session),
}

/// Credentials a request carries for session resolution
///
/// Built once from the request cookies; the guard never looks at anything
/// else on the request when deciding about the session.
#[derive(Default)]
pub struct RequestContext {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
}

impl RequestContext {
    pub fn new(access_token: Option<SecretString>, refresh_token: Option<SecretString>) -> Self {
        let non_empty =
            |token: Option<SecretString>| token.filter(|t| !t.expose_secret().is_empty());
        Self {
            access_token: non_empty(access_token),
            refresh_token: non_empty(refresh_token),
        }
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    /// No credentials at all; resolution can skip the provider
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Operations the web service needs from the hosted identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Email/password sign-in
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Create an account; the display name is stored as user metadata
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, IdentityError>;

    /// URL that starts the federated sign-in flow with `provider`
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, IdentityError>;

    /// Finish a federated sign-in by trading the callback code for a session
    async fn exchange_code(&self, code: &str, code_verifier: &str)
        -> Result<Session, IdentityError>;

    /// Resolve the session for a request, refreshing it when needed
    async fn get_session(&self, ctx: &RequestContext) -> Result<SessionLookup, IdentityError>;

    /// Revoke the session on the provider
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), IdentityError>;

    async fn health(&self) -> Result<(), IdentityError>;
}
