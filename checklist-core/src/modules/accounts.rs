use super::{Collector, Host};
use crate::error::Result;
use crate::source::SourceRef;
use std::collections::BTreeSet;

/// Local account listing
///
/// Reads /etc/passwd on Unix hosts and `net user` on Windows
pub struct AccountsCollector;

impl AccountsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Account names from /etc/passwd (first field of every record)
    fn get_users_unix(&self, host: &Host<'_>) -> Result<Vec<String>> {
        let lines = host.required(&SourceRef::file(&host.layout.passwd))?;
        Ok(parse_passwd_names(&lines))
    }

    fn get_users_windows(&self, host: &Host<'_>) -> Result<Vec<String>> {
        let lines = host.required(&SourceRef::command("net", ["user"]))?;
        Ok(parse_net_user(&lines))
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        let users = if host.platform.is_unix() {
            self.get_users_unix(host)?
        } else {
            self.get_users_windows(host)?
        };

        let sorted: BTreeSet<String> = users.into_iter().collect();
        Ok(sorted.into_iter().collect::<Vec<_>>().join(", "))
    }
}

impl Default for AccountsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for AccountsCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "accounts"
    }
}

pub fn parse_passwd_names(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.split(':').next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with('#'))
        .map(String::from)
        .collect()
}

/// `net user` prints names in columns after a dashed separator
pub fn parse_net_user(lines: &[String]) -> Vec<String> {
    let mut users = Vec::new();
    let mut parsing = false;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("-----") {
            parsing = true;
            continue;
        }
        if line.contains("The command completed successfully.") {
            break;
        }
        if parsing {
            users.extend(line.split_whitespace().map(String::from));
        }
    }

    users
}
