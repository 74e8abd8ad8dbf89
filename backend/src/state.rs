//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Explicit collaborators**: the identity provider is injected, never a global
//! 2. **Cheap cloning**: All fields are Arc'd
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::{GuardPolicy, SessionCookies};
use crate::config::AppConfig;
use crate::identity::IdentityProvider;
use std::sync::Arc;

/// Shared application state
///
/// This struct holds all shared resources that handlers need access to.
/// All fields are designed for cheap cloning across async tasks.
#[derive(Clone)]
pub struct AppState {
    /// Hosted identity provider client
    pub identity: Arc<dyn IdentityProvider>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Route guard path classification
    pub guard: Arc<GuardPolicy>,
    /// Session cookie names and attributes
    pub cookies: Arc<SessionCookies>,
}

impl AppState {
    /// Create a new application state
    ///
    /// The guard policy and cookie settings are derived from the config
    /// here, once, and never change afterwards.
    pub fn new(identity: Arc<dyn IdentityProvider>, config: AppConfig) -> Self {
        let guard = GuardPolicy::from_config(&config.guard);
        let cookies = SessionCookies::from_config(&config.session);

        Self {
            identity,
            config: Arc::new(config),
            guard: Arc::new(guard),
            cookies: Arc::new(cookies),
        }
    }

    /// Get a reference to the identity provider
    #[inline]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the guard policy
    #[inline]
    pub fn guard(&self) -> &GuardPolicy {
        &self.guard
    }

    /// Get a reference to the session cookie settings
    #[inline]
    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }
}
