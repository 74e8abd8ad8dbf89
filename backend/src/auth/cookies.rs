//! Cookies owned by the auth surface
//!
//! Two HttpOnly cookies carry the provider's session tokens. Two more are
//! short-lived helpers: the flash notice shown after a redirect and the
//! PKCE verifier held across the OAuth round trip.

use crate::config::SessionConfig;
use crate::identity::{RequestContext, Session};
use axum::http::{header::SET_COOKIE, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use fitness_auth_shared::Notice;
use secrecy::{ExposeSecret, SecretString};
use time::Duration;

pub const FLASH_COOKIE: &str = "fa-flash";
pub const PKCE_COOKIE: &str = "fa-pkce-verifier";

const FLASH_MAX_AGE_SECS: i64 = 60;
const PKCE_MAX_AGE_SECS: i64 = 600;

/// Cookie names and attributes, fixed at startup
#[derive(Debug, Clone)]
pub struct SessionCookies {
    access_cookie: String,
    refresh_cookie: String,
    secure: bool,
    max_age_secs: i64,
}

impl SessionCookies {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            access_cookie: config.access_cookie.clone(),
            refresh_cookie: config.refresh_cookie.clone(),
            secure: config.secure,
            max_age_secs: config.max_age_secs,
        }
    }

    #[inline]
    pub fn access_cookie(&self) -> &str {
        &self.access_cookie
    }

    /// Credentials the identity provider needs to resolve this request
    pub fn request_context(&self, jar: &CookieJar) -> RequestContext {
        let token = |name: &str| {
            jar.get(name)
                .map(|c| SecretString::new(c.value().to_string()))
        };
        RequestContext::new(token(&self.access_cookie), token(&self.refresh_cookie))
    }

    /// Persist a freshly issued session
    pub fn store(&self, jar: CookieJar, session: &Session) -> CookieJar {
        jar.add(self.build(
            self.access_cookie.clone(),
            session.access_token().expose_secret().clone(),
            self.max_age_secs,
        ))
        .add(self.build(
            self.refresh_cookie.clone(),
            session.refresh_token().expose_secret().clone(),
            self.max_age_secs,
        ))
    }

    /// Drop both session cookies
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.removal(self.access_cookie.clone()))
            .remove(self.removal(self.refresh_cookie.clone()))
    }

    pub fn set_notice(&self, jar: CookieJar, notice: Notice) -> CookieJar {
        jar.add(self.build(
            FLASH_COOKIE.to_string(),
            notice.code().to_string(),
            FLASH_MAX_AGE_SECS,
        ))
    }

    /// Read the pending notice, if any, and consume it
    pub fn take_notice(&self, jar: CookieJar) -> (CookieJar, Option<Notice>) {
        let Some(value) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
            return (jar, None);
        };
        let jar = jar.remove(self.removal(FLASH_COOKIE.to_string()));
        (jar, value.parse().ok())
    }

    pub fn store_verifier(&self, jar: CookieJar, verifier: &str) -> CookieJar {
        jar.add(self.build(
            PKCE_COOKIE.to_string(),
            verifier.to_string(),
            PKCE_MAX_AGE_SECS,
        ))
    }

    /// Read and consume the PKCE verifier; it is single use
    pub fn take_verifier(&self, jar: CookieJar) -> (CookieJar, Option<String>) {
        let verifier = jar
            .get(PKCE_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());
        let jar = jar.remove(self.removal(PKCE_COOKIE.to_string()));
        (jar, verifier)
    }

    fn build(&self, name: String, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age_secs))
            .build()
    }

    fn removal(&self, name: String) -> Cookie<'static> {
        Cookie::build(name).path("/").build()
    }
}

/// Whether a response already writes the named cookie
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.split_once('=')
                .is_some_and(|(cookie_name, _)| cookie_name.trim() == name)
        })
}
