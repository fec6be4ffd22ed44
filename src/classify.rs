//! Entry classification.
//!
//! Every filename decoded from a metadata file is mapped to exactly one
//! [`EntryClass`]. The rules are plain data (a suffix allow-list and a
//! "looks like a directory" predicate) so they can be tested in isolation.

use crate::dsstore::METADATA_FILENAME;

/// Suffixes (after the last `.`, compared case-insensitively) worth downloading.
pub const INTERESTING_SUFFIXES: &[&str] = &[
    // archives
    "tar", "gz", "tgz", "zip", "rar",
    // databases and environment
    "sql", "env",
    // configuration
    "yml", "yaml", "json", "conf", "cnf", "config", "ini", "inc",
    // scripts and sources
    "sh", "bash", "zsh", "py", "py3", "dockerfile",
    // documents
    "txt", "doc", "docx", "md",
    // backups and swap files
    "bak", "swp",
];

/// Longest extension (in ASCII letters) still treated as a file extension by
/// [`looks_like_directory`].
const MAX_EXTENSION_LETTERS: usize = 4;

/// What to do with a discovered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    /// Resolve relative to the current metadata URL and fetch as-is.
    DirectFetch,
    /// Resolve, then probe the result for its own metadata file.
    ProbeAsDirectory,
    /// Not interesting.
    Ignore,
}

/// Classifies an entry name. `DirectFetch` wins over `ProbeAsDirectory`.
///
/// # Examples
///
/// ```
/// use dsstore_dump::{EntryClass, classify_entry};
///
/// assert_eq!(classify_entry("backup.tar.gz"), EntryClass::DirectFetch);
/// assert_eq!(classify_entry("photos"), EntryClass::ProbeAsDirectory);
/// assert_eq!(classify_entry("image.png"), EntryClass::Ignore);
/// ```
#[must_use]
pub fn classify_entry(name: &str) -> EntryClass {
    if is_direct_fetch(name) {
        EntryClass::DirectFetch
    } else if looks_like_directory(name) {
        EntryClass::ProbeAsDirectory
    } else {
        EntryClass::Ignore
    }
}

/// Returns true for the metadata filename itself and allow-listed suffixes.
#[must_use]
pub fn is_direct_fetch(name: &str) -> bool {
    if name == METADATA_FILENAME {
        return true;
    }

    let Some((_, suffix)) = name.rsplit_once('.') else {
        return false;
    };
    let suffix = suffix.to_ascii_lowercase();
    INTERESTING_SUFFIXES.contains(&suffix.as_str()) || is_backup_suffix(&suffix)
}

/// Editor and admin leftovers: letters followed by `1` or `~` (`php1`, `php~`).
fn is_backup_suffix(suffix: &str) -> bool {
    let Some(stem) = suffix
        .strip_suffix('1')
        .or_else(|| suffix.strip_suffix('~'))
    else {
        return false;
    };
    !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Returns true if the name does not end in `.` + 1-4 letters + optional digit.
#[must_use]
pub fn looks_like_directory(name: &str) -> bool {
    let Some((_, suffix)) = name.rsplit_once('.') else {
        return true;
    };
    let letters = suffix
        .strip_suffix(|c: char| c.is_ascii_digit())
        .unwrap_or(suffix);
    let is_extension = (1..=MAX_EXTENSION_LETTERS).contains(&letters.len())
        && letters.bytes().all(|b| b.is_ascii_alphabetic());
    !is_extension
}
