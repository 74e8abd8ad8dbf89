//! Protected app sections
//!
//! Only the shell lives here. Normally the route guard has already
//! ensured a session exists; when the guard fails open during a provider
//! outage the shell renders without a user.

use super::pages::{app_shell_page, Toast};
use crate::auth::CurrentSession;
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;

/// Section paths and their page titles
const SECTIONS: [(&str, &str); 6] = [
    ("/dashboard", "Dashboard"),
    ("/meals", "Meals"),
    ("/workouts", "Workouts"),
    ("/calendar", "Calendar"),
    ("/progress", "Progress"),
    ("/settings", "Settings"),
];

/// Create the app shell routes
pub fn app_routes() -> Router<AppState> {
    SECTIONS
        .iter()
        .fold(Router::new(), |router, &(path, _)| {
            router
                .route(path, get(section_page))
                .route(&format!("{}/*rest", path), get(section_page))
        })
        .route("/", get(root))
}

fn section_title(path: &str) -> &'static str {
    SECTIONS
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, title)| *title)
        .unwrap_or("Dashboard")
}

/// GET / sends everyone to the dashboard; the guard takes it from there
async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(state.guard().dashboard_path())
}

async fn section_page(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    session: Option<CurrentSession>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, notice) = state.cookies().take_notice(jar);
    let toast = notice.map(Toast::from);
    let user = session.as_ref().map(|CurrentSession(session)| session.user());
    let page = app_shell_page(section_title(uri.path()), user, toast.as_ref());
    (jar, page)
}
