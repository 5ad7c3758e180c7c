//! Hostlock Common - shared types and utilities
//!
//! This crate provides:
//! - `HostlockError`: application-specific error enum
//! - `ErrorCode`: structured error codes for API responses
//! - Validation and secret-comparison helpers

pub mod error;
pub mod utils;

pub use error::{ErrorCode, HostlockError};
pub use utils::{is_valid_name, secure_equals};

/// Maximum accepted length for player names and credentials.
///
/// Longer values in a request are a validation error; a longer *configured*
/// secret is a setup error caught at startup.
pub const MAX_IDENTIFIER_LEN: usize = 20;
