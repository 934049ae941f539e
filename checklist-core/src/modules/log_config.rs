use super::{Collector, Host};
use crate::error::Result;
use crate::source::SourceRef;
use std::collections::HashSet;
use tracing::debug;

/// Shell profiles expected to carry the command-history settings
const PROFILE_FILES: &[&str] = &["/etc/bashrc", "/etc/bash.bashrc", "/etc/profile"];

const RSYSLOG_CONF: &str = "/etc/rsyslog.conf";

/// Command logging and endpoint agent configuration
pub struct LogConfigCollector {
    history_markers: Vec<String>,
    rsyslog_markers: Vec<String>,
}

impl LogConfigCollector {
    pub fn new(history_markers: Vec<String>, rsyslog_markers: Vec<String>) -> Self {
        Self {
            history_markers,
            rsyslog_markers,
        }
    }

    /// One `****<file>****` block per readable profile
    fn check_profiles(&self, host: &Host<'_>) -> String {
        let mut output = String::new();
        for file in PROFILE_FILES {
            match host.source.read_lines(&SourceRef::file(file)) {
                Ok(lines) => {
                    output.push_str(&format!("****{}****\n", file));
                    output.push_str(&mark_lines(&lines, &self.history_markers));
                }
                Err(e) => debug!(path = %file, error = %e, "profile not readable"),
            }
        }
        output
    }

    /// The rsyslog header is always printed; markers only if the file is readable
    fn check_rsyslog(&self, host: &Host<'_>) -> String {
        let mut output = format!("****{}****\n", RSYSLOG_CONF);
        if let Ok(lines) = host.source.read_lines(&SourceRef::file(RSYSLOG_CONF)) {
            output.push_str(&mark_lines(&lines, &self.rsyslog_markers));
        }
        output
    }

    /// Output of a status command under a `****<command>****` header
    fn status_block(host: &Host<'_>, title: Option<&str>, source: SourceRef) -> String {
        let body = host
            .source
            .read_lines(&source)
            .map(|lines| lines.join("\n"))
            .unwrap_or_default();

        match title {
            Some(title) => format!("****{}****\n{}\n", title, body),
            None => format!("{}\n", body),
        }
    }

    fn collect_linux(&self, host: &Host<'_>) -> String {
        let mut output = String::from("----------SIEM----------\n");
        output.push_str(&self.check_profiles(host));
        output.push_str(&self.check_rsyslog(host));
        output.push_str(&Self::status_block(
            host,
            Some("systemctl status rsyslog"),
            SourceRef::command("systemctl", ["status", "rsyslog"]).allow_failure(),
        ));
        output.push_str("\n----------Kaspersky----------\n");
        output.push_str(&Self::status_block(
            host,
            None,
            SourceRef::command("systemctl", ["status", "kesl.service"]).allow_failure(),
        ));
        output
    }

    fn collect_windows(&self, host: &Host<'_>) -> String {
        let mut output = String::from("----------SIEM----------\n");
        output.push_str(&Self::status_block(
            host,
            Some("Get-Service -Name scsm"),
            SourceRef::command("powershell", ["-Command", "Get-Service -Name scsm"]).allow_failure(),
        ));
        output.push_str(&Self::status_block(
            host,
            Some("Get-Service -Name avp"),
            SourceRef::command(
                "powershell",
                ["-Command", r#"Get-Service -Name "AVP*" | Select-Object Status, Name, DisplayName"#],
            )
            .allow_failure(),
        ));
        output
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        Ok(if host.platform.is_unix() {
            self.collect_linux(host)
        } else {
            self.collect_windows(host)
        })
    }
}

impl Collector for LogConfigCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "log_config"
    }
}

/// `+marker` when a line equals it exactly, `-marker` otherwise
pub fn mark_lines(lines: &[String], markers: &[String]) -> String {
    let present: HashSet<&str> = lines.iter().map(String::as_str).collect();

    let mut output = String::new();
    for marker in markers {
        let sign = if present.contains(marker.as_str()) { '+' } else { '-' };
        output.push_str(&format!("{}{}\n", sign, marker));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChecklistConfig;
    use crate::platform::Platform;
    use crate::source::MemorySource;

    fn collector() -> LogConfigCollector {
        LogConfigCollector::new(
            vec!["export HISTSIZE=50000".to_string(), "export HISTORY=50000".to_string()],
            vec!["local6.* /var/log/cmdlog.log".to_string()],
        )
    }

    #[test]
    fn test_mark_lines_exact_match() {
        let lines = vec!["export HISTSIZE=50000".to_string(), " export HISTORY=50000".to_string()];
        let markers = vec!["export HISTSIZE=50000".to_string(), "export HISTORY=50000".to_string()];
        assert_eq!(
            mark_lines(&lines, &markers),
            "+export HISTSIZE=50000\n-export HISTORY=50000\n"
        );
    }

    #[test]
    fn test_collect_linux() {
        let source = MemorySource::new()
            .with_file("/etc/bash.bashrc", "# system bashrc\nexport HISTSIZE=50000\n")
            .with_file("/etc/rsyslog.conf", "local6.* /var/log/cmdlog.log\n")
            .with_output(
                SourceRef::command("systemctl", ["status", "rsyslog"]).allow_failure(),
                "● rsyslog.service - System Logging Service\n     Active: active (running)\n",
            );
        let host = Host::new(&source, Platform::Linux, Platform::Linux.layout());

        let output = collector().collect(&host).unwrap();
        assert_eq!(
            output,
            "----------SIEM----------\n\
             ****/etc/bash.bashrc****\n\
             +export HISTSIZE=50000\n\
             -export HISTORY=50000\n\
             ****/etc/rsyslog.conf****\n\
             +local6.* /var/log/cmdlog.log\n\
             ****systemctl status rsyslog****\n\
             ● rsyslog.service - System Logging Service\n     Active: active (running)\n\
             \n----------Kaspersky----------\n\
             \n"
        );
    }

    #[test]
    fn test_default_markers_in_order() {
        let config = ChecklistConfig::default();
        let collector = LogConfigCollector::new(config.history_markers.clone(), config.rsyslog_markers);
        let source = MemorySource::new().with_file("/etc/profile", "");
        let host = Host::new(&source, Platform::Linux, Platform::Linux.layout());

        let output = collector.collect(&host).unwrap();
        let marks: Vec<&str> = output
            .lines()
            .filter(|l| l.starts_with('-') && !l.starts_with("--"))
            .collect();
        // rsyslog.conf is unreadable so only the profile markers show up
        assert_eq!(marks.len(), config.history_markers.len());
        assert_eq!(marks[0], "-export HISTSIZE=50000");
        assert!(output.contains("****/etc/rsyslog.conf****\n****systemctl status rsyslog****\n"));
    }
}
