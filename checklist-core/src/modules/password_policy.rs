use super::{Collector, Host};
use crate::error::{CollectError, Result, SourceError};
use crate::source::SourceRef;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

const LOGIN_DEFS: &str = "/etc/login.defs";

/// PAM password stacks, Debian-style first
const PAM_CANDIDATES: &[&str] = &["/etc/pam.d/common-password", "/etc/pam.d/system-auth"];

/// Password aging and complexity policy
pub struct PasswordPolicyCollector {
    policy_keys: HashSet<String>,
}

impl PasswordPolicyCollector {
    pub fn new<I, S>(policy_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            policy_keys: policy_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Tracked login.defs settings, sorted
    fn get_login_policy(&self, host: &Host<'_>) -> Result<Vec<String>> {
        let lines = host.required(&SourceRef::file(LOGIN_DEFS))?;
        let mut policy = filter_login_defs(&lines, &self.policy_keys);
        policy.sort();
        Ok(policy)
    }

    /// Active lines of the first PAM password stack present, sorted
    fn get_pam_policy(&self, host: &Host<'_>) -> Result<Vec<String>> {
        let path = PAM_CANDIDATES
            .iter()
            .map(|p| PathBuf::from(*p))
            .find(|p| host.source.is_file(p))
            .ok_or_else(|| {
                CollectError::source_unavailable(PAM_CANDIDATES.join(", "), SourceError::NotFound)
            })?;

        debug!(path = %path.display(), "reading PAM password stack");
        let lines = host.required(&SourceRef::file(path))?;
        let mut policy = active_lines(&lines);
        policy.sort();
        Ok(policy)
    }

    fn collect_windows(&self, host: &Host<'_>) -> Result<String> {
        let lines = host.required(&SourceRef::command("net", ["accounts"]))?;
        let mut policies: Vec<String> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && l.contains(':'))
            .map(String::from)
            .collect();
        policies.sort();
        Ok(policies.join("\n"))
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        if !host.platform.is_unix() {
            return self.collect_windows(host);
        }

        let mut policies = self.get_login_policy(host)?;
        policies.extend(self.get_pam_policy(host)?);
        Ok(policies.join("\n"))
    }
}

impl Collector for PasswordPolicyCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "password_policy"
    }
}

/// login.defs lines whose key is tracked; other settings are dropped
pub fn filter_login_defs(lines: &[String], keys: &HashSet<String>) -> Vec<String> {
    active_lines(lines)
        .into_iter()
        .filter(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(key), Some(_)) => keys.contains(key),
                _ => false,
            }
        })
        .collect()
}

/// Lines that are neither comments nor blank, verbatim
fn active_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .cloned()
        .collect()
}
