//! Metadata URL normalization, validation and entry resolution.

use tracing::trace;
use url::Url;

use super::error::{MAX_URL_LENGTH, ParseError};
use crate::dsstore::METADATA_FILENAME;

/// Converts an arbitrary address into the URL of the metadata file at that location.
///
/// Rules, in order:
/// 1. an address without `://` gets the `http://` scheme prepended
/// 2. an address that does not already end in `/.DS_Store` gets a single
///    trailing `/` (if missing) and then `.DS_Store` appended
///
/// Pure and idempotent.
///
/// # Examples
///
/// ```
/// use dsstore_dump::normalize_metadata_url;
///
/// assert_eq!(normalize_metadata_url("example.com"), "http://example.com/.DS_Store");
/// assert_eq!(normalize_metadata_url("example.com/a/"), "http://example.com/a/.DS_Store");
/// assert_eq!(
///     normalize_metadata_url("https://x.com/.DS_Store"),
///     "https://x.com/.DS_Store"
/// );
/// ```
#[must_use]
pub fn normalize_metadata_url(address: &str) -> String {
    let mut url = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    let suffix = format!("/{METADATA_FILENAME}");
    if !url.ends_with(&suffix) {
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(METADATA_FILENAME);
    }
    url
}

/// Resolves an entry name found inside the metadata file at `base`.
///
/// The name is escaped as a single path segment so characters such as `?`,
/// `#`, `/` or spaces inside a recorded filename cannot change the structure
/// of the resulting URL.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUrl`] if `base` does not parse, and
/// [`ParseError::InvalidEntry`] for names that would not address a child
/// (`""`, `"."`, `".."`).
pub fn resolve_entry(base: &str, name: &str) -> Result<String, ParseError> {
    if matches!(name, "" | "." | "..") {
        return Err(ParseError::invalid_entry(base, name));
    }

    let base_url = Url::parse(base).map_err(|e| ParseError::malformed(base, &e.to_string()))?;
    let escaped = urlencoding::encode(name);
    let joined = base_url
        .join(&escaped)
        .map_err(|_| ParseError::invalid_entry(base, name))?;

    trace!(base, name, resolved = %joined, "resolved entry");
    Ok(joined.to_string())
}

/// Returns true when the URL addresses a metadata file.
///
/// The decision is taken from the final percent-decoded path segment of the
/// URL, never from a local path, so it does not depend on how the file was
/// stored on disk.
#[must_use]
pub fn is_metadata_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| urlencoding::decode(last).ok())
        .is_some_and(|last| last == METADATA_FILENAME)
}

/// Validates a URL string and returns it parsed.
///
/// # Validation rules:
/// - Must not exceed `MAX_URL_LENGTH` (2000 chars)
/// - Must be parseable by the `url` crate
/// - Must use http or https scheme
/// - Must have a host
pub(crate) fn validate_url(raw: &str) -> Result<Url, ParseError> {
    if raw.len() > MAX_URL_LENGTH {
        return Err(ParseError::too_long(raw));
    }

    let parsed = Url::parse(raw).map_err(|e| ParseError::malformed(raw, &e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(ParseError::unsupported_scheme(raw, scheme)),
    }

    if parsed.host().is_none() {
        return Err(ParseError::no_host(raw));
    }

    Ok(parsed)
}
