//! Configuration management for the Fitness Assistant auth web service
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: FA__)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub guard: GuardConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible origin, used to build OAuth callback URLs
    pub public_url: String,
    /// Directory served under `/assets`
    pub assets_dir: String,
}

/// Hosted identity provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Public (anon) API key sent as the `apikey` header
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub access_cookie: String,
    pub refresh_cookie: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

/// What the route guard does when the session lookup itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailureMode {
    /// Treat the request as having no session
    Closed,
    /// Let the request through untouched
    Open,
}

/// Route guard path classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub protected_prefixes: Vec<String>,
    pub sign_in_path: String,
    pub sign_up_path: String,
    pub dashboard_path: String,
    /// Requests under these prefixes skip the guard entirely
    pub excluded_prefixes: Vec<String>,
    pub on_lookup_error: LookupFailureMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_cookie: "fa-access-token".to_string(),
            refresh_cookie: "fa-refresh-token".to_string(),
            secure: false,
            max_age_secs: 604800, // 7 days
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: [
                "/dashboard",
                "/meals",
                "/workouts",
                "/calendar",
                "/progress",
                "/settings",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            sign_in_path: "/sign-in".to_string(),
            sign_up_path: "/sign-up".to_string(),
            dashboard_path: "/dashboard".to_string(),
            excluded_prefixes: ["/assets", "/favicon.ico", "/public"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            on_lookup_error: LookupFailureMode::Closed,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://127.0.0.1:8080".to_string(),
                assets_dir: "assets".to_string(),
            },
            identity: IdentityConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                timeout_secs: 10,
            },
            session: SessionConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with FA__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (FA__ prefix)
            // e.g., FA__IDENTITY__URL=https://abc.supabase.co sets identity.url
            .add_source(
                config::Environment::with_prefix("FA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("guard.protected_prefixes")
                    .with_list_parse_key("guard.excluded_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Callback URL the identity provider sends OAuth users back to
    pub fn oauth_callback_url(&self) -> String {
        format!(
            "{}/auth/callback",
            self.server.public_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.guard.sign_in_path, "/sign-in");
        assert_eq!(config.guard.dashboard_path, "/dashboard");
        assert_eq!(config.guard.protected_prefixes.len(), 6);
        assert_eq!(config.guard.on_lookup_error, LookupFailureMode::Closed);
        assert!(!config.session.secure);
    }

    #[test]
    fn test_is_production() {
        // Default should be false (development)
        assert!(!AppConfig::is_production());
    }

    #[test]
    fn test_oauth_callback_url_trims_slash() {
        let mut config = AppConfig::default();
        config.server.public_url = "https://fitness.example.com/".to_string();
        assert_eq!(
            config.oauth_callback_url(),
            "https://fitness.example.com/auth/callback"
        );
    }

    #[test]
    fn test_debug_redacts_anon_key() {
        let mut config = AppConfig::default();
        config.identity.anon_key = "super-secret-anon-key".to_string();
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-anon-key"));
    }

    #[test]
    fn test_lookup_failure_mode_serde() {
        let mode: LookupFailureMode = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(mode, LookupFailureMode::Open);
    }
}
