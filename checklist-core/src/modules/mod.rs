pub mod accounts;
pub mod checksum;
pub mod files;
pub mod firewall;
pub mod log_config;
pub mod password_policy;
pub mod patching;
pub mod ports;
pub mod ssh;
pub mod sudoers;
pub mod usergroup;

use crate::error::{CollectError, Result};
use crate::platform::{Platform, PlatformLayout};
use crate::source::{FactSource, SourceRef};

/// The host being audited, as seen through a fact source
pub struct Host<'a> {
    pub source: &'a dyn FactSource,
    pub platform: Platform,
    pub layout: PlatformLayout,
}

impl<'a> Host<'a> {
    pub fn new(source: &'a dyn FactSource, platform: Platform, layout: PlatformLayout) -> Self {
        Self {
            source,
            platform,
            layout,
        }
    }

    /// Read a source that the check cannot do without
    pub fn required(&self, source: &SourceRef) -> Result<Vec<String>> {
        self.source
            .read_lines(source)
            .map_err(|cause| CollectError::source_unavailable(source, cause))
    }
}

/// Trait that all synchronous collectors implement
pub trait Collector: Send + Sync {
    /// Gather the fact and render it as its canonical text block
    fn collect(&self, host: &Host<'_>) -> Result<String>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
