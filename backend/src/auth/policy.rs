//! Path classification for the route guard
//!
//! Pure functions only: given a path and whether a session exists, say
//! what to do. The middleware supplies both inputs.

use crate::config::GuardConfig;

/// Route guard verdict for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision<'a> {
    PassThrough,
    Redirect(&'a str),
}

/// Static path classification, fixed at startup
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    protected_prefixes: Vec<String>,
    sign_in_path: String,
    sign_up_path: String,
    dashboard_path: String,
    excluded_prefixes: Vec<String>,
}

impl GuardPolicy {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            protected_prefixes: config.protected_prefixes.clone(),
            sign_in_path: config.sign_in_path.clone(),
            sign_up_path: config.sign_up_path.clone(),
            dashboard_path: config.dashboard_path.clone(),
            excluded_prefixes: config.excluded_prefixes.clone(),
        }
    }

    /// Assets, favicon and public files never reach the session lookup
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Raw prefix match: `/settings-export` is protected too
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Exact match only; `/sign-in/` is not an auth page
    pub fn is_auth_page(&self, path: &str) -> bool {
        path == self.sign_in_path || path == self.sign_up_path
    }

    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision<'_> {
        if self.is_protected(path) && !has_session {
            return GuardDecision::Redirect(&self.sign_in_path);
        }
        if self.is_auth_page(path) && has_session {
            return GuardDecision::Redirect(&self.dashboard_path);
        }
        GuardDecision::PassThrough
    }

    #[inline]
    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    #[inline]
    pub fn sign_up_path(&self) -> &str {
        &self.sign_up_path
    }

    #[inline]
    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }
}
