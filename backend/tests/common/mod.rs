//! Common test utilities for integration tests
//!
//! Builds the full router on top of an in-memory identity provider so the
//! pages, the guard and the cookies can be exercised without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use fake::{faker::internet::en::SafeEmail, faker::name::en::Name, Fake};
use fitness_auth_shared::OAuthProvider;
use fitness_auth_web::{
    config::AppConfig,
    identity::{
        IdentityError, IdentityProvider, IdentityUser, Registration, RequestContext, Session,
        SessionLookup,
    },
    routes,
    state::AppState,
};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const CODE_FOR_GOOGLE: &str = "google-auth-code";

/// Provider operations, in the order they were called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate(String),
    Register(String),
    ExchangeCode(String),
    GetSession,
    SignOut,
    Health,
}

struct Account {
    password: String,
    user: IdentityUser,
}

/// In-memory stand-in for the hosted identity provider
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    /// access token -> user
    sessions: Mutex<HashMap<String, IdentityUser>>,
    /// refresh token -> user
    refresh_tokens: Mutex<HashMap<String, IdentityUser>>,
    calls: Mutex<Vec<Call>>,
    /// Sign-up returns a session instead of waiting for confirmation
    pub auto_confirm: AtomicBool,
    /// Every call fails as if the provider were misbehaving
    pub broken: AtomicBool,
}

impl FakeIdentity {
    pub fn add_account(&self, email: &str, password: &str, name: Option<&str>) -> IdentityUser {
        let user = IdentityUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            display_name: name.map(str::to_string),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(email)
    }

    /// Issue a session directly, as if the user had signed in earlier
    pub fn issue(&self, user: &IdentityUser) -> (String, String) {
        let session = self.new_session(user.clone());
        (
            session.access_token().expose_secret().clone(),
            session.refresh_token().expose_secret().clone(),
        )
    }

    /// Invalidate an access token, leaving its refresh token usable
    pub fn expire(&self, access_token: &str) {
        self.sessions.lock().unwrap().remove(access_token);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn is_active(&self, access_token: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(access_token)
    }

    fn record(&self, call: Call) -> Result<(), IdentityError> {
        self.calls.lock().unwrap().push(call);
        if self.broken.load(Ordering::SeqCst) {
            return Err(IdentityError::UnexpectedResponse("provider is down".to_string()));
        }
        Ok(())
    }

    fn new_session(&self, user: IdentityUser) -> Session {
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(access.clone(), user.clone());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh.clone(), user.clone());
        Session::new(
            SecretString::new(access),
            SecretString::new(refresh),
            None,
            user,
        )
    }
}

fn rejected(status: u16, message: &str) -> IdentityError {
    IdentityError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.record(Call::Authenticate(email.to_string()))?;
        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(rejected(400, "Invalid login credentials")),
            }
        };
        Ok(self.new_session(user))
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Registration, IdentityError> {
        self.record(Call::Register(email.to_string()))?;
        if self.has_account(email) {
            return Err(rejected(422, "User already registered"));
        }
        let user = self.add_account(email, password, Some(display_name));
        if self.auto_confirm.load(Ordering::SeqCst) {
            Ok(Registration::SignedIn(self.new_session(user)))
        } else {
            Ok(Registration::PendingConfirmation(user))
        }
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, IdentityError> {
        let mut url = Url::parse("https://identity.test/auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, IdentityError> {
        self.record(Call::ExchangeCode(code_verifier.to_string()))?;
        if code != CODE_FOR_GOOGLE {
            return Err(rejected(404, "invalid flow state, no valid flow state found"));
        }
        let user = IdentityUser {
            id: Uuid::new_v4().to_string(),
            email: Some(SafeEmail().fake()),
            display_name: Some(Name().fake()),
        };
        Ok(self.new_session(user))
    }

    async fn get_session(&self, ctx: &RequestContext) -> Result<SessionLookup, IdentityError> {
        self.record(Call::GetSession)?;

        if let Some(access) = ctx.access_token() {
            let user = self.sessions.lock().unwrap().get(access.expose_secret()).cloned();
            if let Some(user) = user {
                let refresh = ctx
                    .refresh_token()
                    .map(|t| t.expose_secret().clone())
                    .unwrap_or_default();
                return Ok(SessionLookup::Active(Session::new(
                    SecretString::new(access.expose_secret().clone()),
                    SecretString::new(refresh),
                    None,
                    user,
                )));
            }
        }

        let Some(refresh) = ctx.refresh_token() else {
            return Ok(SessionLookup::Missing);
        };
        let user = self
            .refresh_tokens
            .lock()
            .unwrap()
            .remove(refresh.expose_secret());
        Ok(match user {
            Some(user) => SessionLookup::Refreshed(self.new_session(user)),
            None => SessionLookup::Missing,
        })
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), IdentityError> {
        self.record(Call::SignOut)?;
        let user = self
            .sessions
            .lock()
            .unwrap()
            .remove(access_token.expose_secret());
        // Logout revokes every refresh token the user holds
        if let Some(user) = user {
            self.refresh_tokens
                .lock()
                .unwrap()
                .retain(|_, holder| holder.id != user.id);
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), IdentityError> {
        self.record(Call::Health)
    }
}

/// Response captured for assertions
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// Value the response sets for `name`; empty when the cookie is removed
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies().iter().find_map(|c| {
            c.strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
    }

    pub fn removes_cookie(&self, name: &str) -> bool {
        let prefix = format!("{}=", name);
        self.set_cookies()
            .iter()
            .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub identity: Arc<FakeIdentity>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let identity = Arc::new(FakeIdentity::default());
        let state = AppState::new(identity.clone(), config);
        let app = routes::create_router(state);
        Self { app, identity }
    }

    /// Make a GET request, optionally carrying a `Cookie` header
    pub async fn get(&self, path: &str, cookies: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Make a POST request with a urlencoded form body
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookies: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }
}

/// Cookie header for a signed-in browser
pub fn session_cookie(access: &str, refresh: &str) -> String {
    format!("fa-access-token={}; fa-refresh-token={}", access, refresh)
}

pub fn random_email() -> String {
    SafeEmail().fake()
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.server.public_url = "http://fitness.test".to_string();
    config
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
