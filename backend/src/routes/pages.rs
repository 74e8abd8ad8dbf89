//! Server-rendered markup for the auth pages and the app shell
//!
//! Deliberately plain: one stylesheet, no client framework. The only
//! script disables the submit button while a form is in flight.

use crate::identity::IdentityUser;
use axum::response::Html;
use fitness_auth_shared::{Notice, OAuthProvider, MIN_PASSWORD_LENGTH};

/// Notification rendered at the top of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

impl Toast {
    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: Some(description.into()),
            variant: ToastVariant::Destructive,
        }
    }
}

impl From<Notice> for Toast {
    fn from(notice: Notice) -> Self {
        Self {
            title: notice.title().to_string(),
            description: notice.description().map(str::to_string),
            variant: ToastVariant::Default,
        }
    }
}

/// Values echoed back into the sign-in form
#[derive(Debug, Default)]
pub struct SignInView<'a> {
    pub email: &'a str,
    pub toast: Option<Toast>,
}

/// Values echoed back into the sign-up form
#[derive(Debug, Default)]
pub struct SignUpView<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub toast: Option<Toast>,
}

pub fn sign_in_page(view: &SignInView<'_>) -> Html<String> {
    let body = format!(
        r#"<main class="auth">
  <section class="card">
    <h1>Sign in</h1>
    {toast}
    <form method="post" action="/sign-in" data-disable-on-submit>
      <label for="email">Email</label>
      <input id="email" name="email" type="email" value="{email}" autocomplete="email" required>
      <label for="password">Password</label>
      <input id="password" name="password" type="password" autocomplete="current-password" required>
      <button type="submit" data-pending="Signing in...">Sign in</button>
    </form>
    <div class="divider">or</div>
    {oauth}
    <p class="switch">Don't have an account? <a href="/sign-up">Sign up</a></p>
  </section>
</main>"#,
        toast = render_toast(view.toast.as_ref()),
        email = escape(view.email),
        oauth = oauth_button(OAuthProvider::Google),
    );
    Html(layout("Sign in", &body))
}

pub fn sign_up_page(view: &SignUpView<'_>) -> Html<String> {
    let body = format!(
        r#"<main class="auth">
  <section class="card">
    <h1>Sign up</h1>
    {toast}
    <form method="post" action="/sign-up" data-disable-on-submit>
      <label for="name">Name</label>
      <input id="name" name="name" type="text" value="{name}" autocomplete="name" required>
      <label for="email">Email</label>
      <input id="email" name="email" type="email" value="{email}" autocomplete="email" required>
      <label for="password">Password</label>
      <input id="password" name="password" type="password" autocomplete="new-password" minlength="{min}" required>
      <button type="submit" data-pending="Signing up...">Sign up</button>
    </form>
    <div class="divider">or</div>
    {oauth}
    <p class="switch">Already have an account? <a href="/sign-in">Sign in</a></p>
  </section>
</main>"#,
        toast = render_toast(view.toast.as_ref()),
        name = escape(view.name),
        email = escape(view.email),
        min = MIN_PASSWORD_LENGTH,
        oauth = oauth_button(OAuthProvider::Google),
    );
    Html(layout("Sign up", &body))
}

/// Placeholder shell for the protected sections
///
/// `user` is `None` only when the session could not be verified.
pub fn app_shell_page(
    section: &str,
    user: Option<&IdentityUser>,
    toast: Option<&Toast>,
) -> Html<String> {
    let status = match user {
        Some(user) => {
            let who = user
                .display_name
                .as_deref()
                .or(user.email.as_deref())
                .unwrap_or("there");
            format!("Signed in as {}.", escape(who))
        }
        None => "Your session could not be verified right now.".to_string(),
    };
    let body = format!(
        r#"<header class="topbar">
  <nav>
    <a href="/dashboard">Dashboard</a>
    <a href="/meals">Meals</a>
    <a href="/workouts">Workouts</a>
    <a href="/calendar">Calendar</a>
    <a href="/progress">Progress</a>
    <a href="/settings">Settings</a>
  </nav>
  <form method="post" action="/sign-out"><button type="submit">Sign out</button></form>
</header>
<main class="app">
  {toast}
  <h1>{section}</h1>
  <p class="session">{status}</p>
</main>"#,
        toast = render_toast(toast),
        section = escape(section),
    );
    Html(layout(section, &body))
}

fn oauth_button(provider: OAuthProvider) -> String {
    format!(
        r#"<a class="button outline" href="/auth/oauth/{}">Continue with {}</a>"#,
        provider.as_str(),
        provider.display_name()
    )
}

fn render_toast(toast: Option<&Toast>) -> String {
    let Some(toast) = toast else {
        return String::new();
    };
    let (class, role) = match toast.variant {
        ToastVariant::Default => ("toast", "status"),
        ToastVariant::Destructive => ("toast destructive", "alert"),
    };
    let description = toast
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", escape(d)))
        .unwrap_or_default();
    format!(
        r#"<div class="{class}" role="{role}"><strong>{title}</strong>{description}</div>"#,
        title = escape(&toast.title),
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Fitness Assistant</title>
<link rel="stylesheet" href="/assets/app.css">
</head>
<body>
{body}
<script>
document.querySelectorAll("form[data-disable-on-submit]").forEach(function (form) {{
  form.addEventListener("submit", function () {{
    var button = form.querySelector("button[type=submit]");
    if (button) {{ button.disabled = true; button.textContent = button.dataset.pending || button.textContent; }}
  }});
}});
</script>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Minimal HTML escaping for text and attribute values
fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
