use crate::checks::Check;
use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rendered result of one check, with where and when it was taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub check: Check,
    /// Identifier the check was requested with
    pub id: String,
    pub platform: Platform,
    pub generated_at: DateTime<Utc>,
    pub hostname: String,
    pub run_as_root: bool,
    /// Canonical text block
    pub body: String,
}

impl CheckReport {
    pub fn new(check: Check, id: impl Into<String>, platform: Platform, body: String) -> Self {
        Self {
            check,
            id: id.into(),
            platform,
            generated_at: Utc::now(),
            hostname: hostname(),
            run_as_root: is_root(),
            body,
        }
    }
}

#[cfg(unix)]
fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(not(unix))]
fn hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "unknown".to_string())
}

/// Whether the process runs with superuser rights
#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}
