//! Fitness Assistant auth shared library
//!
//! Form payloads, validation rules and error types shared between the
//! web backend and anything else that submits to the auth pages.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
pub use validation::MIN_PASSWORD_LENGTH;
