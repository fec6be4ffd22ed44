//! Constants for the download module (timeouts).

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest accepted per-request timeout (1 hour).
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);
