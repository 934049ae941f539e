//! User → group → privilege resolution
//!
//! Joins the account database with the group database and the sudo policy.
//! Each account ends up with the names of every group it belongs to, either
//! implicitly through its primary group id or as an explicit member, plus a
//! single synthetic elevated marker when any of those groups is privileged.

use super::sudoers::SudoersReader;
use super::{Collector, Host};
use crate::error::Result;
use crate::source::SourceRef;
use crate::types::{Account, Group};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Resolve every account's effective group set.
///
/// Pure over its inputs: member names with no matching account are ignored and
/// the marker is added at most once per account, however many privileged
/// groups grant it.
pub fn resolve(
    mut accounts: HashMap<String, Account>,
    groups: &[Group],
    privileged: &HashSet<String>,
    elevated_marker: &str,
) -> HashMap<String, Account> {
    for group in groups {
        let is_privileged = privileged.contains(&group.name);

        let grant = |account: &mut Account| {
            account.groups.insert(group.name.clone());
            if is_privileged {
                account.groups.insert(elevated_marker.to_string());
            }
        };

        accounts
            .values_mut()
            .filter(|a| a.primary_gid == group.gid)
            .for_each(|account| grant(account));

        for member in &group.members {
            if let Some(account) = accounts.get_mut(member) {
                grant(account);
            }
        }
    }

    accounts
}

/// Render one line per account, `"<account>": <groups joined by ", ">`
pub fn render(accounts: &HashMap<String, Account>) -> String {
    let sorted: BTreeMap<&str, &Account> = accounts.iter().map(|(k, v)| (k.as_str(), v)).collect();

    let mut output = String::new();
    for (name, account) in sorted {
        output.push_str(&format!("\"{}\": {}\n", name, account.sorted_groups().join(", ")));
    }
    output
}

/// Account → groups collector
pub struct UserGroupCollector {
    elevated_marker: String,
}

impl UserGroupCollector {
    pub fn new(elevated_marker: impl Into<String>) -> Self {
        Self {
            elevated_marker: elevated_marker.into(),
        }
    }

    /// Parse /etc/passwd into accounts keyed by name
    fn get_accounts(&self, host: &Host<'_>) -> Result<HashMap<String, Account>> {
        let lines = host.required(&SourceRef::file(&host.layout.passwd))?;

        Ok(lines
            .iter()
            .filter_map(|l| Account::from_passwd_line(l))
            .map(|a| (a.name.clone(), a))
            .collect())
    }

    /// Parse /etc/group
    fn get_groups(&self, host: &Host<'_>) -> Result<Vec<Group>> {
        let lines = host.required(&SourceRef::file(&host.layout.group))?;
        Ok(lines.iter().filter_map(|l| Group::from_group_line(l)).collect())
    }

    fn collect_unix(&self, host: &Host<'_>) -> Result<HashMap<String, Account>> {
        let accounts = self.get_accounts(host)?;
        let privileged = SudoersReader::new().privileged_groups(host)?;
        let groups = self.get_groups(host)?;

        debug!(
            accounts = accounts.len(),
            groups = groups.len(),
            privileged = privileged.len(),
            "resolving group membership"
        );

        Ok(resolve(accounts, &groups, &privileged, &self.elevated_marker))
    }

    /// Windows has no primary-group join: membership comes from `net localgroup`
    fn collect_windows(&self, host: &Host<'_>) -> Result<HashMap<String, Account>> {
        let listing = host.required(&SourceRef::command("net", ["localgroup"]))?;

        let mut accounts: HashMap<String, Account> = HashMap::new();
        for group in parse_net_listing(&listing) {
            let group_name = group.trim_start_matches('*').to_string();
            let members = match host
                .source
                .read_lines(&SourceRef::command("net", ["localgroup", group_name.as_str()]))
            {
                Ok(lines) => parse_net_listing(&lines),
                Err(e) => {
                    debug!(group = %group_name, error = %e, "skipping group without readable members");
                    continue;
                }
            };

            for member in members {
                accounts
                    .entry(member.clone())
                    .or_insert_with(|| Account::new(member, ""))
                    .groups
                    .insert(group_name.clone());
            }
        }

        Ok(accounts)
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        let accounts = if host.platform.is_unix() {
            self.collect_unix(host)?
        } else {
            self.collect_windows(host)?
        };
        Ok(render(&accounts))
    }
}

impl Collector for UserGroupCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "usergroup"
    }
}

/// Entries of a `net` listing: the lines between the dashed separator and the
/// first blank line or completion notice
pub fn parse_net_listing(lines: &[String]) -> Vec<String> {
    let mut entries = Vec::new();
    let mut started = false;

    for line in lines {
        let line = line.trim();
        if line.contains("-------") {
            started = true;
            continue;
        }
        if !started {
            continue;
        }
        if line.is_empty() || line.starts_with("The command completed") {
            break;
        }
        entries.push(line.to_string());
    }

    entries
}
