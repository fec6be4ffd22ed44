//! Error types for seed parsing and URL handling.

use thiserror::Error;

/// Maximum URL length to accept (standard browser limit).
/// URLs longer than this are rejected to prevent memory issues.
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors that can occur while parsing seeds or resolving entries.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// URL is malformed or uses unsupported scheme
    #[error("invalid URL '{url}': {reason}\n  Suggestion: {suggestion}")]
    InvalidUrl {
        /// The URL that failed validation
        url: String,
        /// Why the URL is invalid
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// URL exceeds maximum allowed length
    #[error(
        "URL too long ({length} chars, max {max}): {url_preview}...\n  Suggestion: Check the input for extraneous content"
    )]
    UrlTooLong {
        /// Truncated URL for display
        url_preview: String,
        /// Actual length
        length: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Entry name recorded in a metadata file cannot be resolved to a child URL.
    #[error("unusable entry name '{name}' under {base}")]
    InvalidEntry {
        /// The metadata URL the entry was found in
        base: String,
        /// The raw entry name
        name: String,
    },
}

impl ParseError {
    /// Creates an `InvalidUrl` error for a non-web URL scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str, scheme: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: format!("scheme '{scheme}' is not supported"),
            suggestion: "Use http:// or https:// addresses".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a malformed URL.
    #[must_use]
    pub fn malformed(url: &str, parse_error: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: parse_error.to_string(),
            suggestion: "Check the address format and try again".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL without a host.
    #[must_use]
    pub fn no_host(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
            suggestion: "Ensure the address includes a host (e.g., example.com)".to_string(),
        }
    }

    /// Creates a `UrlTooLong` error for URLs exceeding the maximum length.
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::UrlTooLong {
            url_preview: url.chars().take(50).collect(),
            length: url.len(),
            max: MAX_URL_LENGTH,
        }
    }

    /// Creates an `InvalidEntry` error.
    #[must_use]
    pub fn invalid_entry(base: &str, name: &str) -> Self {
        Self::InvalidEntry {
            base: base.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_unsupported_scheme_message() {
        let err = ParseError::unsupported_scheme("ftp://example.com", "ftp");
        let msg = err.to_string();
        assert!(msg.contains("ftp://example.com"), "should contain URL");
        assert!(msg.contains("ftp"), "should contain scheme");
        assert!(msg.contains("http://"), "suggestion should mention http");
    }

    #[test]
    fn test_parse_error_malformed_message() {
        let err = ParseError::malformed("http://[::1", "invalid IPv6 address");
        let msg = err.to_string();
        assert!(msg.contains("http://[::1"), "should contain URL");
        assert!(msg.contains("IPv6"), "should contain reason");
    }

    #[test]
    fn test_parse_error_too_long_message() {
        let long_url = "https://example.com/".to_string() + &"a".repeat(2500);
        let err = ParseError::too_long(&long_url);
        let msg = err.to_string();
        assert!(msg.contains("too long"), "should mention too long");
        assert!(msg.contains("2000"), "should mention max length");
    }

    #[test]
    fn test_parse_error_invalid_entry_names_base_and_entry() {
        let err = ParseError::invalid_entry("http://example.com/.DS_Store", "..");
        let msg = err.to_string();
        assert!(msg.contains("'..'"));
        assert!(msg.contains("http://example.com/.DS_Store"));
    }
}
