//! HTTP client for a GoTrue-compatible hosted auth service
//!
//! Every call carries the project's public `apikey`; user-scoped calls add
//! the session's access token as a bearer token.

use super::{
    IdentityError, IdentityProvider, IdentityUser, Registration, RequestContext, Session,
    SessionLookup,
};
use crate::config::IdentityConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fitness_auth_shared::OAuthProvider;
use reqwest::{header::HeaderMap, header::HeaderValue, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

/// Keys GoTrue uses for the human-readable part of an error body,
/// in the order they are preferred.
const ERROR_MESSAGE_KEYS: [&str; 4] = ["msg", "error_description", "message", "error"];

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(TokenResponse),
    User(UserResponse),
}

impl From<UserResponse> for IdentityUser {
    fn from(user: UserResponse) -> Self {
        let display_name = ["name", "full_name"].iter().find_map(|key| {
            user.user_metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Self {
            id: user.id,
            email: user.email,
            display_name,
        }
    }
}

impl TokenResponse {
    fn into_session(self) -> Session {
        // Out-of-range values from the provider leave the expiry unknown
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            });
        Session::new(
            SecretString::new(self.access_token),
            SecretString::new(self.refresh_token),
            expires_at,
            self.user.into(),
        )
    }
}

/// GoTrue REST client
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base: Url,
}

impl GoTrueClient {
    /// Build a client for the configured project
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let base = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))
            .with_context(|| format!("invalid identity provider url: {}", config.url))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.anon_key)
            .context("identity anon key is not a valid header value")?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build identity http client")?;

        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        Ok(self.base.join(path)?)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/token")?)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let tokens: TokenResponse = read_json(response).await?;
        Ok(tokens.into_session())
    }

    async fn fetch_user(&self, access_token: &SecretString) -> Result<IdentityUser, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let user: UserResponse = read_json(response).await?;
        Ok(user.into())
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<SessionLookup, IdentityError> {
        match self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": refresh_token.expose_secret() }),
            )
            .await
        {
            Ok(session) => {
                debug!(user_id = %session.user().id, "Session refreshed");
                Ok(SessionLookup::Refreshed(session))
            }
            Err(IdentityError::Rejected { status, .. }) if is_token_rejection(status) => {
                debug!(status, "Refresh token rejected");
                Ok(SessionLookup::Missing)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip_all)]
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    #[instrument(skip_all)]
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/signup")?)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": display_name },
            }))
            .send()
            .await?;

        let registration = match read_json::<SignupResponse>(response).await? {
            SignupResponse::Session(tokens) => Registration::SignedIn(tokens.into_session()),
            SignupResponse::User(user) => Registration::PendingConfirmation(user.into()),
        };
        Ok(registration)
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, IdentityError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, IdentityError> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": code, "code_verifier": code_verifier }),
        )
        .await
    }

    #[instrument(skip_all, fields(ctx = ?ctx))]
    async fn get_session(&self, ctx: &RequestContext) -> Result<SessionLookup, IdentityError> {
        if let Some(access_token) = ctx.access_token() {
            match self.fetch_user(access_token).await {
                Ok(user) => {
                    let refresh_token = ctx
                        .refresh_token()
                        .map(|t| t.expose_secret().clone())
                        .unwrap_or_default();
                    return Ok(SessionLookup::Active(Session::new(
                        SecretString::new(access_token.expose_secret().clone()),
                        SecretString::new(refresh_token),
                        None,
                        user,
                    )));
                }
                Err(IdentityError::Rejected { status, .. }) if is_token_rejection(status) => {
                    debug!(status, "Access token rejected");
                }
                Err(e) => return Err(e),
            }
        }

        match ctx.refresh_token() {
            Some(refresh_token) => self.refresh(refresh_token).await,
            None => Ok(SessionLookup::Missing),
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // An already-invalid token means there is nothing left to revoke
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            warn!(status = status.as_u16(), "Logout for an already invalid session");
            return Ok(());
        }
        Err(rejection(status, response).await)
    }

    async fn health(&self) -> Result<(), IdentityError> {
        let response = self.http.get(self.endpoint("auth/v1/health")?).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(rejection(status, response).await)
        }
    }
}

/// Statuses that mean the presented token is no good. Anything else
/// (rate limiting included) is a lookup failure, not a signed-out user.
fn is_token_rejection(status: u16) -> bool {
    matches!(status, 400 | 401 | 403 | 404)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
    let status = response.status();
    if !status.is_success() {
        return Err(rejection(status, response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| IdentityError::UnexpectedResponse(e.to_string()))
}

async fn rejection(status: StatusCode, response: reqwest::Response) -> IdentityError {
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    IdentityError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Pull the human-readable message out of a GoTrue error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ERROR_MESSAGE_KEYS.iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoTrueClient {
        GoTrueClient::new(&IdentityConfig {
            url: "https://project.example.co/".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_error_message_prefers_msg() {
        let body = r#"{"code":400,"msg":"Invalid login credentials","error":"invalid_grant"}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid login credentials"));
    }

    #[test]
    fn test_error_message_falls_back_to_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
        assert_eq!(error_message(body).as_deref(), Some("Email not confirmed"));
    }

    #[test]
    fn test_error_message_non_json() {
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_authorize_url() {
        let url = client()
            .authorize_url(
                OAuthProvider::Google,
                "http://127.0.0.1:8080/auth/callback",
                "challenge",
            )
            .unwrap();
        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".to_string(), "google".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://127.0.0.1:8080/auth/callback".to_string()
        )));
        assert!(pairs.contains(&("code_challenge_method".to_string(), "s256".to_string())));
    }

    #[test]
    fn test_user_display_name_from_metadata() {
        let user: UserResponse = serde_json::from_value(json!({
            "id": "u1",
            "email": "kim@example.com",
            "user_metadata": { "name": "Kim" }
        }))
        .unwrap();
        let user: IdentityUser = user.into();
        assert_eq!(user.display_name.as_deref(), Some("Kim"));
    }

    #[test]
    fn test_token_expiry_from_expires_in() {
        let tokens: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "u1" }
        }))
        .unwrap();
        let session = tokens.into_session();
        let expires_at = session.expires_at().unwrap();
        assert!(expires_at > Utc::now() + Duration::seconds(3500));
    }

    #[test]
    fn test_out_of_range_expires_in_leaves_expiry_unknown() {
        let tokens: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": i64::MAX,
            "user": { "id": "u1" }
        }))
        .unwrap();
        assert!(tokens.into_session().expires_at().is_none());
    }

    #[test]
    fn test_token_rejection_statuses() {
        for status in [400, 401, 403, 404] {
            assert!(is_token_rejection(status), "{}", status);
        }
        for status in [408, 422, 429, 500, 503] {
            assert!(!is_token_rejection(status), "{}", status);
        }
    }

    #[test]
    fn test_signup_response_without_session_is_user() {
        let response: SignupResponse = serde_json::from_value(json!({
            "id": "u1",
            "email": "kim@example.com",
            "confirmation_sent_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(matches!(response, SignupResponse::User(_)));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = GoTrueClient::new(&IdentityConfig {
            url: "not a url".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        });
        assert!(result.is_err());
    }
}
