//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness check (identity provider)
//! - /health/live - Liveness check (always returns OK if server is running)

use crate::identity::IdentityProvider;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;
use tracing::warn;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub identity_provider: CheckStatus,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    /// Round trip to the dependency, in milliseconds
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Time one call to the identity provider's health endpoint
async fn check_identity(identity: &dyn IdentityProvider) -> CheckStatus {
    let started = Instant::now();
    let result = identity.health().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(()) => CheckStatus {
            status: "healthy".to_string(),
            latency_ms,
            message: None,
        },
        Err(e) => {
            warn!(error = %e, latency_ms, "Identity provider health check failed");
            CheckStatus {
                status: "unhealthy".to_string(),
                latency_ms,
                message: Some(e.user_message()),
            }
        }
    }
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

/// Readiness check - confirms the identity provider answers
/// Returns 503 when it does not; the provider's latency is reported either way
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let identity_check = check_identity(state.identity()).await;
    let is_healthy = identity_check.is_healthy();

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(HealthChecks {
            identity_provider: identity_check,
        }),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness check - reports if the service is alive
/// Always returns OK if the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityConfig;
    use crate::identity::GoTrueClient;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unhealthy() {
        let client = GoTrueClient::new(&IdentityConfig {
            url: "http://127.0.0.1:1".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let check = check_identity(&client).await;

        assert!(!check.is_healthy());
        assert_eq!(
            check.message.as_deref(),
            Some("The sign-in service is unavailable. Please try again later.")
        );
    }
}
