//! Utility functions for hostlock
//!
//! Identifier validation and credential comparison helpers.

use std::sync::LazyLock;

/// Regex pattern for validating identifiers (player names, blob file names)
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]+$").expect("Invalid regex pattern"));

/// Validate a string contains only allowed identifier characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen.
/// Rejects the empty string. Blob file names pass through this check before
/// they reach the file-backed store, so a name can never traverse paths.
///
/// # Examples
///
/// ```
/// use hostlock_common::is_valid_name;
///
/// assert!(is_valid_name("save-2024.zip"));
/// assert!(is_valid_name("player_one"));
/// assert!(!is_valid_name("../etc/passwd"));
/// assert!(!is_valid_name("with spaces"));
/// assert!(!is_valid_name(""));
/// ```
pub fn is_valid_name(str: &str) -> bool {
    VALID_PATTERN.is_match(str)
}

/// Compare a caller-supplied credential against the configured secret.
///
/// The comparison touches every byte of both inputs, so the runtime does not
/// depend on the length of a shared prefix.
pub fn secure_equals(provided: &str, expected: &str) -> bool {
    let a = provided.as_bytes();
    let b = expected.as_bytes();

    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= (x ^ y) as usize;
    }
    diff == 0
}
