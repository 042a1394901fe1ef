//! Classification of `op` failure output.
//!
//! The `op` CLI does not distinguish failure kinds by exit code; the only
//! signal is the text it prints. Every pattern this crate relies on lives
//! here.

use regex::Regex;
use std::sync::LazyLock;

static AUTH_REQUIRED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(not currently|Authentication)").expect("auth pattern is valid")
});

static DOES_NOT_EXIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(doesn't seem to be an item|no item found|not found)")
        .expect("not-found pattern is valid")
});

/// What a failed `op` invocation meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No active session, or the session token was rejected.
    AuthRequired,
    /// The referenced item does not exist.
    NotFound,
    /// Anything else.
    Generic,
}

/// True when the output says the session is missing or stale.
pub fn is_auth_required(output: &str) -> bool {
    AUTH_REQUIRED.is_match(output)
}

/// True when the output says the referenced item does not exist.
pub fn is_not_found(output: &str) -> bool {
    DOES_NOT_EXIST.is_match(output)
}

/// Classifies raw `op` output.
///
/// Authentication failures take priority: an output mentioning both is
/// reported as [`Classification::AuthRequired`].
///
/// # Example
///
/// ```
/// use opsession::classify::{classify, Classification};
///
/// assert_eq!(
///     classify("[ERROR] You are not currently signed in."),
///     Classification::AuthRequired
/// );
/// assert_eq!(
///     classify(r#""github" doesn't seem to be an item in any vault"#),
///     Classification::NotFound
/// );
/// assert_eq!(classify("connection reset"), Classification::Generic);
/// ```
pub fn classify(output: &str) -> Classification {
    if is_auth_required(output) {
        Classification::AuthRequired
    } else if is_not_found(output) {
        Classification::NotFound
    } else {
        Classification::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_required_signatures() {
        for output in [
            "[LOG] 2020/01/01 (ERROR) You are not currently signed in. Please run `op signin --help` for instructions",
            "[ERROR] 401: Authentication required.",
        ] {
            assert_eq!(classify(output), Classification::AuthRequired, "{output}");
        }
    }

    #[test]
    fn test_not_found_signatures() {
        for output in [
            "[ERROR] \"github\" doesn't seem to be an item. Specify the item with its UUID, name, or domain.",
            "[ERROR] no item found",
            "[ERROR] item not found",
        ] {
            assert_eq!(classify(output), Classification::NotFound, "{output}");
        }
    }

    #[test]
    fn test_generic() {
        assert_eq!(classify(""), Classification::Generic);
        assert_eq!(classify("[ERROR] 500: Internal Server Error"), Classification::Generic);
        // Matching is case sensitive.
        assert_eq!(classify("Not Found"), Classification::Generic);
    }

    #[test]
    fn test_auth_wins_over_not_found() {
        let output = "Authentication required: session not found";
        assert!(is_not_found(output));
        assert_eq!(classify(output), Classification::AuthRequired);
    }
}
