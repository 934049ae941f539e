use super::{Collector, Host};
use crate::error::Result;
use crate::platform::Platform;
use crate::source::SourceRef;
use tracing::warn;

/// Firewall rule dump
///
/// Dumps every iptables/ip6tables table on Linux, the advfirewall rule set on
/// Windows, and the pf rule set on macOS
pub struct FirewallCollector {
    tables: Vec<String>,
}

impl FirewallCollector {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    fn table_source(program: &str, table: &str) -> SourceRef {
        SourceRef::command(program, ["-t", table, "-vL", "-n", "--line-numbers"])
    }

    /// One section per address family, one block per readable table
    fn collect_iptables(&self, host: &Host<'_>) -> String {
        let mut output = String::new();

        for (program, family) in [("iptables", "v4"), ("ip6tables", "v6")] {
            output.push_str(&format!("----------{}----------\n", family));

            for table in &self.tables {
                let source = Self::table_source(program, table);
                match host.source.read_lines(&source) {
                    Ok(lines) => {
                        output.push_str(&format!("****{}****\n{}\n\n", table, lines.join("\n")));
                    }
                    Err(e) => warn!(command = %source, error = %e, "failed to get rule"),
                }
            }

            output.push('\n');
        }

        output
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        match host.platform {
            Platform::Linux => Ok(self.collect_iptables(host)),
            Platform::Windows => {
                let lines = host.required(&SourceRef::command(
                    "netsh",
                    ["advfirewall", "firewall", "show", "rule", "name=all"],
                ))?;
                Ok(lines.join("\n"))
            }
            Platform::MacOs => {
                let lines = host.required(&SourceRef::command("pfctl", ["-sr"]))?;
                Ok(lines.join("\n"))
            }
        }
    }
}

impl Collector for FirewallCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "firewall"
    }
}
