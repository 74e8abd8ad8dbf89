//! Fitness Assistant web authentication surface
//!
//! Sign-in and sign-up pages plus the route guard that keeps anonymous
//! users out of the app and signed-in users off the auth pages. This
//! library exposes the modules for use in tests and the binary.

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;
