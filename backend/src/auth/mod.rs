//! Route protection and session cookies
//!
//! The guard decides, per request, whether a page may be served. Sessions
//! themselves are owned by the identity provider; this module only moves
//! their tokens between cookies and the provider.

mod cookies;
mod middleware;
mod pkce;
mod policy;

pub use cookies::{sets_cookie, SessionCookies, FLASH_COOKIE, PKCE_COOKIE};
pub use middleware::{route_guard, CurrentSession};
pub use pkce::{challenge_for, PkcePair};
pub use policy::{GuardDecision, GuardPolicy};
