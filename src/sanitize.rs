//! Input sanitization for string-interpolated SQL.
//!
//! The Statement Execution API used here takes plain SQL text, so every
//! caller-supplied string passes through [`sanitize`] before it is embedded
//! in a literal or a `LIKE` pattern.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LogSearchError, Result};

/// Characters allowed in an interpolated value after quote doubling.
static SAFE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_./ -]*$").expect("allow-set pattern compiles"));

/// Doubles embedded single quotes and rejects anything outside `[A-Za-z0-9_./ -]`.
///
/// A doubled quote is itself outside the allow-set, so in practice any value
/// containing `'` is rejected. Apply this exactly once per value: doubling is
/// not idempotent.
pub fn sanitize(value: &str) -> Result<String> {
    let cleaned = value.replace('\'', "''");
    if !SAFE_PATTERN.is_match(&cleaned) {
        return Err(LogSearchError::invalid_input(format!(
            "Invalid characters in query parameter: {value}"
        )));
    }
    Ok(cleaned)
}

/// Validates a catalog or schema name before it becomes part of a table reference.
///
/// Identifiers are not quoted, so only `[A-Za-z0-9_]` is accepted.
pub fn sanitize_identifier(value: &str) -> Result<&str> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(LogSearchError::invalid_input(format!(
            "Invalid catalog or schema name: {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_pass_unchanged() {
        assert_eq!(sanitize("CC-1001").unwrap(), "CC-1001");
        assert_eq!(sanitize("app/src/main.py").unwrap(), "app/src/main.py");
        assert_eq!(
            sanitize("connection timeout_after 30.5 s").unwrap(),
            "connection timeout_after 30.5 s"
        );
    }

    #[test]
    fn test_empty_string_is_valid() {
        assert_eq!(sanitize("").unwrap(), "");
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for value in [
            "drop table; --",
            "x' OR '1'='1",
            "it's",
            "a%b",
            "line\nbreak",
            "tab\there",
            "semi;colon",
            "back\\slash",
            "(paren)",
            "\"quoted\"",
            "Fehler: ümlaut",
        ] {
            let err = sanitize(value).unwrap_err();
            assert!(err.is_caller_fault(), "{value:?} should be rejected");
            assert!(err.to_string().contains("Invalid characters"));
        }
    }

    #[test]
    fn test_every_char_outside_allow_set_is_rejected() {
        for c in (0u8..128).map(char::from) {
            let allowed = c.is_ascii_alphanumeric() || "_./ -".contains(c);
            let value = format!("ab{c}cd");
            assert_eq!(sanitize(&value).is_ok(), allowed, "char {c:?}");
        }
    }

    #[test]
    fn test_quote_free_values_are_stable_under_reapplication() {
        // Quotes never survive the first pass, so a second pass sees the same text.
        let once = sanitize("Null pointer in ui/view.rs").unwrap();
        assert_eq!(sanitize(&once).unwrap(), once);
        assert!(sanitize("O'Brien").is_err());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("dbx_1").unwrap(), "dbx_1");
        assert_eq!(sanitize_identifier("Prod_Logs2").unwrap(), "Prod_Logs2");
        assert!(sanitize_identifier("prod-logs").is_err());
        assert!(sanitize_identifier("").is_err());
        assert!(sanitize_identifier("a.b").is_err());
        assert!(sanitize_identifier("x UNION SELECT").is_err());
    }
}
