//! Output path mapping.
//!
//! A remote URL maps to `output_dir/<host>[_<port>]/<decoded path segments>`.
//! The mapping depends on the URL only, so two workers never write the same
//! path unless they process the same URL.

use std::path::{Component, Path, PathBuf};

use url::Url;

use super::error::DownloadError;

/// Maps `url` to its mirror location under `output_dir`.
///
/// Segments are percent-decoded and sanitized so the result always stays
/// strictly inside `output_dir`.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] if the URL has no host or does not
/// end in a file segment (e.g. `http://example.com/dir/`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dsstore_dump::local_path_for;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/photos/.DS_Store").unwrap();
/// let path = local_path_for(Path::new("output"), &url).unwrap();
/// assert_eq!(path, Path::new("output/example.com/photos/.DS_Store"));
/// ```
pub fn local_path_for(output_dir: &Path, url: &Url) -> Result<PathBuf, DownloadError> {
    let host = url
        .host_str()
        .ok_or_else(|| DownloadError::invalid_url(url.as_str()))?;
    let authority = match url.port() {
        Some(port) => format!("{}_{port}", sanitize_segment(host)),
        None => sanitize_segment(host),
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(Iterator::collect)
        .unwrap_or_default();
    match segments.last() {
        Some(last) if !last.is_empty() => {}
        _ => return Err(DownloadError::invalid_url(url.as_str())),
    }

    let mut path = output_dir.join(authority);
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        let decoded = urlencoding::decode_binary(segment.as_bytes());
        path.push(sanitize_segment(&String::from_utf8_lossy(&decoded)));
    }
    Ok(path)
}

/// Makes one decoded segment safe to use as a single path component.
pub(crate) fn sanitize_segment(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_normal_component(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_normal_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
