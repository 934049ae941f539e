//! Configuration for a collection pass

use crate::error::{CollectError, Result};
use crate::platform::{Platform, PlatformLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistConfig {
    /// Synthetic group name given to accounts in a sudo-privileged group.
    /// A value equal to a real group name (e.g. `sudo`) merges with it.
    pub elevated_marker: String,

    /// Override of the platform home-directory root
    pub home_root: Option<PathBuf>,

    /// Override of the well-known superuser trust files, account -> path
    pub privileged_key_files: Option<Vec<PrivilegedKeyFile>>,

    /// login.defs keys reported by the password policy check
    pub password_policy_keys: Vec<String>,

    /// Lines expected in the system shell profiles
    pub history_markers: Vec<String>,

    /// Lines expected in rsyslog.conf
    pub rsyslog_markers: Vec<String>,

    /// iptables tables dumped by the firewall check
    pub firewall_tables: Vec<String>,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegedKeyFile {
    pub account: String,
    pub path: PathBuf,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (compact, pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            elevated_marker: "elevated".to_string(),
            home_root: None,
            privileged_key_files: None,
            password_policy_keys: vec![
                "PASS_MIN_LEN".to_string(),
                "PASS_MAX_DAYS".to_string(),
                "PASS_WARN_AGE".to_string(),
            ],
            history_markers: vec![
                "export HISTSIZE=50000".to_string(),
                "export HISTORY=50000".to_string(),
                r#"export HISTTIMEFORMAT="%d/%m/%y %T ""#.to_string(),
                r#"export PROMPT_COMMAND='RETRN_VAL=0;logger -p local6.debug"[CMDLOG] [$USER:$PWD] [$(echo $SSH_CLIENT | cut -d" " -f1)]# $(history 1 )"'"#.to_string(),
            ],
            rsyslog_markers: vec!["local6.* /var/log/cmdlog.log".to_string()],
            firewall_tables: ["filter", "nat", "mangle", "raw", "security"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ChecklistConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CollectError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CollectError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Merge with environment variables (CHECKLIST_ prefix)
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = var("CHECKLIST_HOME_ROOT") {
            self.home_root = Some(PathBuf::from(val));
        }
        if let Some(val) = var("CHECKLIST_ELEVATED_MARKER") {
            self.elevated_marker = val;
        }
        if let Some(val) = var("CHECKLIST_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("CHECKLIST_LOG_FORMAT") {
            self.logging.format = val;
        }
        self
    }

    /// Platform layout with this configuration's overrides applied
    pub fn layout_for(&self, platform: Platform) -> PlatformLayout {
        let mut layout = platform.layout();
        if let Some(ref root) = self.home_root {
            layout.home_root = root.clone();
        }
        if let Some(ref files) = self.privileged_key_files {
            layout.privileged_key_files = files
                .iter()
                .map(|f| (f.account.clone(), f.path.clone()))
                .collect();
        }
        layout
    }
}
