//! Error types and error codes for hostlock
//!
//! This module defines:
//! - `HostlockError`: application-specific error enum
//! - `ErrorCode`: structured error codes for API responses
//!
//! Expected protocol outcomes (lock already held, no lock to release) are
//! deliberately *not* errors; they are modeled as outcome enums in
//! `hostlock-core`. The variants here are genuine failures.

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum HostlockError {
    #[error("provided password not valid")]
    Unauthorized,

    #[error("caused: {0}")]
    Validation(String),

    #[error("no valid save file found to download")]
    SaveNotInitialized,

    #[error("save file '{0}' not found in blob store")]
    BlobNotFound(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter validate error",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const SAVE_LOCKED: ErrorCode<'static> = ErrorCode {
    code: 20001,
    message: "save is locked",
};

pub const LOCK_NOT_HELD: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "lock not held",
};

pub const SAVE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20003,
    message: "save not found",
};

pub const STORAGE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "storage unavailable",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "server error",
};
