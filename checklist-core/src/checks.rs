//! Check identifiers and the dispatcher that runs them

use crate::config::ChecklistConfig;
use crate::error::{CollectError, Result};
use crate::modules::accounts::AccountsCollector;
use crate::modules::checksum::ChecksumCollector;
use crate::modules::files::FilesCollector;
use crate::modules::firewall::FirewallCollector;
use crate::modules::log_config::LogConfigCollector;
use crate::modules::password_policy::PasswordPolicyCollector;
use crate::modules::patching::PatchingCollector;
use crate::modules::ports::PortsCollector;
use crate::modules::ssh::SshKeyCollector;
use crate::modules::usergroup::UserGroupCollector;
use crate::modules::{Collector, Host};
use crate::platform::Platform;
use crate::source::FactSource;
use crate::types::CheckReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// A family of host facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    SshKeys,
    Accounts,
    UserGroups,
    PasswordPolicy,
    Patching,
    FileChecksums,
    Files,
    Ports,
    Firewall,
    LogConfig,
}

impl Check {
    pub const ALL: [Check; 10] = [
        Check::SshKeys,
        Check::Accounts,
        Check::UserGroups,
        Check::PasswordPolicy,
        Check::Patching,
        Check::FileChecksums,
        Check::Files,
        Check::Ports,
        Check::Firewall,
        Check::LogConfig,
    ];

    /// Every identifier this check answers to
    pub fn ids(self) -> &'static [&'static str] {
        match self {
            Check::SshKeys => &["1091", "11091", "3092", "5092", "2092", "291", "1", "4027"],
            Check::Accounts => &["1092", "11092", "3093", "5093", "2093", "292", "2", "4028"],
            Check::UserGroups => &["1093", "11093", "3094", "5094", "2094", "293", "3", "4029"],
            Check::PasswordPolicy => &["1094", "11094", "3095", "5095", "2095", "294", "4", "4030"],
            Check::Patching => &["1095", "11095", "3096", "5096", "2096", "295", "5", "4031"],
            Check::FileChecksums => &["1096", "11096", "3097", "5097", "2097", "296", "6", "4032"],
            Check::Files => &["1097", "11097", "3098", "5098", "2098", "297", "7", "4033"],
            Check::Ports => &["1098", "11098", "3099", "5099", "2099", "298", "8", "4034"],
            Check::Firewall => &["1099", "11099", "3100", "5100", "2100", "299", "9", "4035"],
            Check::LogConfig => &["1100", "11100", "3101", "5101", "2101", "300", "10", "4036"],
        }
    }

    pub fn from_id(id: &str) -> Result<Check> {
        let id = id.trim();
        Check::ALL
            .into_iter()
            .find(|check| check.ids().iter().any(|known| *known == id))
            .ok_or_else(|| CollectError::UnknownCheck(id.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Check::SshKeys => "ssh_keys",
            Check::Accounts => "accounts",
            Check::UserGroups => "user_groups",
            Check::PasswordPolicy => "password_policy",
            Check::Patching => "patching",
            Check::FileChecksums => "file_checksums",
            Check::Files => "files",
            Check::Ports => "ports",
            Check::Firewall => "firewall",
            Check::LogConfig => "log_config",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Caller-supplied inputs for the file checks
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Paths hashed by the checksum check
    pub files: Vec<String>,
    /// Folders listed by the files check
    pub folders: Vec<String>,
}

/// Runs checks against one host
pub struct Checklist {
    config: ChecklistConfig,
    platform: Platform,
    source: Box<dyn FactSource>,
}

impl Checklist {
    pub fn new(config: ChecklistConfig, platform: Platform, source: Box<dyn FactSource>) -> Self {
        Self {
            config,
            platform,
            source,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn host(&self) -> Host<'_> {
        Host::new(
            self.source.as_ref(),
            self.platform,
            self.config.layout_for(self.platform),
        )
    }

    /// Collector for every check that does not need the async runtime
    fn sync_collector(&self, check: Check, args: &CheckArgs) -> Option<Box<dyn Collector>> {
        let config = &self.config;
        let collector: Box<dyn Collector> = match check {
            Check::SshKeys => return None,
            Check::Accounts => Box::new(AccountsCollector::new()),
            Check::UserGroups => Box::new(UserGroupCollector::new(config.elevated_marker.clone())),
            Check::PasswordPolicy => {
                Box::new(PasswordPolicyCollector::new(config.password_policy_keys.clone()))
            }
            Check::Patching => Box::new(PatchingCollector::new()),
            Check::FileChecksums => Box::new(ChecksumCollector::new(&args.files)),
            Check::Files => Box::new(FilesCollector::new(&args.folders)),
            Check::Ports => Box::new(PortsCollector::new()),
            Check::Firewall => Box::new(FirewallCollector::new(config.firewall_tables.clone())),
            Check::LogConfig => Box::new(LogConfigCollector::new(
                config.history_markers.clone(),
                config.rsyslog_markers.clone(),
            )),
        };
        Some(collector)
    }

    /// Render the canonical text block of one check
    pub async fn collect(&self, check: Check, args: &CheckArgs) -> Result<String> {
        let host = self.host();

        match self.sync_collector(check, args) {
            Some(collector) => {
                debug!(collector = collector.name(), "collecting");
                collector.collect(&host)
            }
            None => SshKeyCollector::new().collect_host(&host).await,
        }
    }

    /// Resolve `id` and run the matching check
    pub async fn run(&self, id: &str, args: &CheckArgs) -> Result<CheckReport> {
        let check = Check::from_id(id)?;
        info!(id = %id, check = %check, platform = %self.platform, "running check");

        let body = self.collect(check, args).await?;
        Ok(CheckReport::new(check, id, self.platform, body))
    }
}
