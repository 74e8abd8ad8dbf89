//! Authentication routes
//!
//! Sign-in and sign-up pages with their form submissions, the OAuth
//! handoff, and sign-out. Every identity-provider failure is caught here
//! and turned into a notification on the re-rendered form; nothing
//! propagates past the handler.

use super::pages::{sign_in_page, sign_up_page, SignInView, SignUpView, Toast};
use crate::auth::{CurrentSession, PkcePair};
use crate::error::{ApiError, ApiResult};
use crate::identity::{IdentityError, IdentityUser, Registration};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use fitness_auth_shared::{Notice, OAuthProvider, SignInForm, SignUpForm};
use serde::Deserialize;
use tracing::{info, warn};

const SIGN_IN_FAILED: &str = "Sign-in failed";
const SIGN_UP_FAILED: &str = "Sign-up failed";

/// Create the page-level auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(sign_in_form).post(sign_in))
        .route("/sign-up", get(sign_up_form).post(sign_up))
        .route("/sign-out", post(sign_out))
        .route("/auth/oauth/:provider", get(oauth_start))
        .route("/auth/callback", get(oauth_callback))
}

/// JSON session routes, nested under `/api/v1/auth`
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/me", get(current_user))
}

/// Status for a failed identity call on a form
fn failure_status(err: &IdentityError, rejected: StatusCode) -> StatusCode {
    match err {
        IdentityError::Rejected { .. } => rejected,
        IdentityError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        IdentityError::UnexpectedResponse(_) | IdentityError::InvalidUrl(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn sign_in_error(jar: CookieJar, status: StatusCode, email: &str, message: String) -> Response {
    let page = sign_in_page(&SignInView {
        email,
        toast: Some(Toast::error(SIGN_IN_FAILED, message)),
    });
    (status, jar, page).into_response()
}

/// GET /sign-in
async fn sign_in_form(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = state.cookies().take_notice(jar);
    let page = sign_in_page(&SignInView {
        email: "",
        toast: notice.map(Toast::from),
    });
    (jar, page)
}

/// POST /sign-in
///
/// Exactly one provider call per valid submission; invalid input never
/// leaves the process.
async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return sign_in_error(
            jar,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form.email,
            e.to_string(),
        );
    }

    let email = form.email.trim();
    match state.identity().authenticate(email, &form.password).await {
        Ok(session) => {
            info!(user_id = %session.user().id, "User signed in");
            let cookies = state.cookies();
            let jar = cookies.set_notice(cookies.store(jar, &session), Notice::SignedIn);
            (jar, Redirect::to(state.guard().dashboard_path())).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Sign-in rejected");
            let status = failure_status(&e, StatusCode::UNAUTHORIZED);
            sign_in_error(jar, status, &form.email, e.user_message())
        }
    }
}

/// GET /sign-up
async fn sign_up_form(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, notice) = state.cookies().take_notice(jar);
    let page = sign_up_page(&SignUpView {
        toast: notice.map(Toast::from),
        ..Default::default()
    });
    (jar, page)
}

/// POST /sign-up
///
/// On success the user is sent to sign in; the account still has to be
/// confirmed through the email the provider sends.
async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> Response {
    let render_error = |jar: CookieJar, status: StatusCode, message: String| {
        let page = sign_up_page(&SignUpView {
            name: &form.name,
            email: &form.email,
            toast: Some(Toast::error(SIGN_UP_FAILED, message)),
        });
        (status, jar, page).into_response()
    };

    if let Err(e) = form.validate() {
        return render_error(jar, StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    let result = state
        .identity()
        .register(form.email.trim(), &form.password, form.name.trim())
        .await;

    match result {
        Ok(registration) => {
            let user_id = match &registration {
                Registration::PendingConfirmation(user) => &user.id,
                Registration::SignedIn(session) => &session.user().id,
            };
            info!(user_id = %user_id, "User registered");
            let jar = state.cookies().set_notice(jar, Notice::CheckEmail);
            (jar, Redirect::to(state.guard().sign_in_path())).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Sign-up rejected");
            let status = failure_status(&e, StatusCode::BAD_REQUEST);
            render_error(jar, status, e.user_message())
        }
    }
}

/// GET /auth/oauth/:provider
///
/// Hands the browser to the identity provider; the result arrives later
/// at `/auth/callback`.
async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> ApiResult<Response> {
    let provider: OAuthProvider = provider
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unsupported provider: {}", provider)))?;

    let pkce = PkcePair::generate()?;
    let redirect_to = state.config().oauth_callback_url();
    let url = state
        .identity()
        .authorize_url(provider, &redirect_to, &pkce.challenge)?;

    info!(provider = provider.as_str(), "Starting OAuth sign-in");
    let jar = state.cookies().store_verifier(jar, &pkce.verifier);
    Ok((jar, Redirect::to(url.as_str())).into_response())
}

/// Query parameters the provider appends to the callback URL
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/callback
async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    let cookies = state.cookies();
    let (jar, verifier) = cookies.take_verifier(jar);

    if let Some(message) = params.error_description.or(params.error) {
        warn!(error = %message, "OAuth sign-in failed at provider");
        return sign_in_error(jar, StatusCode::UNAUTHORIZED, "", message);
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return sign_in_error(
            jar,
            StatusCode::BAD_REQUEST,
            "",
            "Missing authorization code".to_string(),
        );
    };

    let Some(verifier) = verifier else {
        return sign_in_error(
            jar,
            StatusCode::BAD_REQUEST,
            "",
            "Your sign-in attempt expired. Please try again.".to_string(),
        );
    };

    match state.identity().exchange_code(&code, &verifier).await {
        Ok(session) => {
            info!(user_id = %session.user().id, "User signed in with OAuth");
            let jar = cookies.set_notice(cookies.store(jar, &session), Notice::SignedIn);
            (jar, Redirect::to(state.guard().dashboard_path())).into_response()
        }
        Err(e) => {
            warn!(error = %e, "OAuth code exchange failed");
            let status = failure_status(&e, StatusCode::UNAUTHORIZED);
            sign_in_error(jar, status, "", e.user_message())
        }
    }
}

/// POST /sign-out
///
/// Provider logout is best effort; the cookies are cleared regardless.
async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
    session: Option<CurrentSession>,
) -> Response {
    let cookies = state.cookies();

    if let Some(CurrentSession(session)) = session {
        match state.identity().sign_out(session.access_token()).await {
            Ok(()) => info!(user_id = %session.user().id, "User signed out"),
            Err(e) => warn!(error = %e, "Provider logout failed, clearing cookies anyway"),
        }
    }

    let jar = cookies.set_notice(cookies.clear(jar), Notice::SignedOut);
    (jar, Redirect::to(state.guard().sign_in_path())).into_response()
}

/// GET /api/v1/auth/me
async fn current_user(session: CurrentSession) -> Json<IdentityUser> {
    Json(session.0.user().clone())
}
