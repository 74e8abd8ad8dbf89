//! Route guard middleware
//!
//! Runs in front of every page. Resolves the caller's session through the
//! identity provider and either lets the request through or redirects it,
//! according to [`GuardPolicy`].

use super::cookies::sets_cookie;
use super::policy::GuardDecision;
use crate::config::LookupFailureMode;
use crate::error::ApiError;
use crate::identity::{Session, SessionLookup};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, warn};

/// Session resolved by the route guard for the current request
///
/// Only present when the guard let the request through with a valid
/// session; handlers on unprotected routes should extract
/// `Option<CurrentSession>`.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Arc<Session>);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("No active session".to_string()))
    }
}

/// Route guard, applied with `middleware::from_fn_with_state`
pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let policy = state.guard();

    if policy.is_excluded(&path) {
        return next.run(request).await;
    }

    let cookies = state.cookies();
    let ctx = cookies.request_context(&jar);

    let lookup = if ctx.is_empty() {
        Ok(SessionLookup::Missing)
    } else {
        state.identity().get_session(&ctx).await
    };

    // Cookie changes to apply to whatever response we end up producing
    let mut cookie_update: Option<CookieJar> = None;
    let session = match lookup {
        Ok(SessionLookup::Active(session)) => Some(session),
        Ok(SessionLookup::Refreshed(session)) => {
            cookie_update = Some(cookies.store(jar, &session));
            Some(session)
        }
        Ok(SessionLookup::Missing) => {
            if !ctx.is_empty() {
                debug!(path = %path, "Clearing stale session cookies");
                cookie_update = Some(cookies.clear(jar));
            }
            None
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Session lookup failed");
            match state.config().guard.on_lookup_error {
                LookupFailureMode::Open => return next.run(request).await,
                LookupFailureMode::Closed => None,
            }
        }
    };

    let response = match policy.decide(&path, session.is_some()) {
        GuardDecision::Redirect(to) => {
            debug!(from = %path, to = %to, "Route guard redirect");
            Redirect::to(to).into_response()
        }
        GuardDecision::PassThrough => {
            if let Some(session) = session {
                request
                    .extensions_mut()
                    .insert(CurrentSession(Arc::new(session)));
            }
            next.run(request).await
        }
    };

    match cookie_update {
        // A handler that wrote the session cookies itself (sign-out, sign-in) wins
        Some(jar) if !sets_cookie(response.headers(), cookies.access_cookie()) => {
            (jar, response).into_response()
        }
        _ => response,
    }
}
