use super::Host;
use crate::error::Result;
use crate::source::SourceRef;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Reads the sudo policy and derives the groups holding blanket privilege
///
/// Examines /etc/sudoers and every readable file in /etc/sudoers.d
pub struct SudoersReader;

impl SudoersReader {
    pub fn new() -> Self {
        Self
    }

    /// Groups granted `ALL` through a `%group` rule.
    ///
    /// The main sudoers file is required; unreadable drop-in files are skipped.
    pub fn privileged_groups(&self, host: &Host<'_>) -> Result<HashSet<String>> {
        let mut policy = host.required(&SourceRef::file(&host.layout.sudoers))?;

        match host.source.list_dir(&host.layout.sudoers_dir) {
            Ok(mut entries) => {
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                for entry in entries.into_iter().filter(|e| !e.is_dir) {
                    let path = host.layout.sudoers_dir.join(&entry.name);
                    match host.source.read_lines(&SourceRef::file(&path)) {
                        Ok(lines) => policy.extend(lines),
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable sudoers drop-in"),
                    }
                }
            }
            Err(e) => debug!(path = %host.layout.sudoers_dir.display(), error = %e, "no sudoers drop-in directory"),
        }

        let groups = parse_privileged_groups(&policy);
        debug!(count = groups.len(), "resolved privileged groups");
        Ok(groups)
    }
}

impl Default for SudoersReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the privilege specifications of a sudoers file
pub fn extract_rules(lines: &[String]) -> Vec<SudoRule> {
    lines.iter().filter_map(|l| SudoRule::from_line(l)).collect()
}

/// Parse privileged group names out of sudoers lines
pub fn parse_privileged_groups(lines: &[String]) -> HashSet<String> {
    extract_rules(lines)
        .iter()
        .filter_map(SudoRule::privileged_group)
        .map(String::from)
        .collect()
}

/// One user privilege specification
///
/// Format: `user HOST=(RUNAS) COMMANDS`, e.g. `%sudo ALL=(ALL:ALL) ALL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SudoRule {
    pub user_or_group: String,
    pub host_spec: String,
}

impl SudoRule {
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        if trimmed.starts_with("Defaults")
            || trimmed.starts_with("User_Alias")
            || trimmed.starts_with("Runas_Alias")
            || trimmed.starts_with("Host_Alias")
            || trimmed.starts_with("Cmnd_Alias")
        {
            return None;
        }

        let mut fields = trimmed.split_whitespace();
        let user_or_group = fields.next()?.to_string();
        let host_spec = fields.next()?.to_string();

        Some(Self {
            user_or_group,
            host_spec,
        })
    }

    /// Group name when this is a `%group` rule whose host spec grants ALL
    pub fn privileged_group(&self) -> Option<&str> {
        let group = self.user_or_group.strip_prefix('%')?;
        if group.is_empty() || !self.host_spec.contains("ALL") {
            return None;
        }
        Some(group)
    }
}
