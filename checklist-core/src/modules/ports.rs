use super::{Collector, Host};
use crate::error::Result;
use crate::platform::Platform;
use crate::source::SourceRef;
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Listening TCP ports reachable from outside the host
///
/// Uses `ss` on Linux and `netstat` elsewhere
pub struct PortsCollector;

impl PortsCollector {
    pub fn new() -> Self {
        Self
    }

    fn source_for(platform: Platform) -> SourceRef {
        match platform {
            Platform::Linux => SourceRef::command("ss", ["-Htln"]),
            Platform::MacOs => SourceRef::command("netstat", ["-an", "-p", "tcp"]),
            Platform::Windows => SourceRef::command("netstat", ["-an", "-p", "TCP"]),
        }
    }

    fn get_listening_ports(&self, host: &Host<'_>) -> Result<Vec<ListeningPort>> {
        let lines = host.required(&Self::source_for(host.platform))?;
        Ok(match host.platform {
            Platform::Linux => parse_ss_output(&lines),
            Platform::MacOs | Platform::Windows => parse_netstat_output(&lines),
        })
    }

    pub fn collect(&self, host: &Host<'_>) -> Result<String> {
        let ports: BTreeSet<u16> = self
            .get_listening_ports(host)?
            .into_iter()
            .filter(|p| !p.is_loopback())
            .map(|p| p.port)
            .collect();

        Ok(ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", "))
    }
}

impl Default for PortsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for PortsCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        self.collect(host)
    }

    fn name(&self) -> &'static str {
        "ports"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningPort {
    pub address: String,
    pub port: u16,
}

impl ListeningPort {
    pub fn is_loopback(&self) -> bool {
        if self.address == "localhost" {
            return true;
        }
        // Drop a zone suffix such as `%lo`
        let ip = self.address.split('%').next().unwrap_or_default();
        ip.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
    }
}

/// `ss -Htln`: State Recv-Q Send-Q Local:Port Peer:Port
pub fn parse_ss_output(lines: &[String]) -> Vec<ListeningPort> {
    lines
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 && parts[0] == "LISTEN" {
                parse_address(parts[3])
            } else {
                None
            }
        })
        .collect()
}

/// `netstat -an`: Proto Local Foreign State (Windows) or
/// Proto Recv-Q Send-Q Local Foreign State (macOS)
pub fn parse_netstat_output(lines: &[String]) -> Vec<ListeningPort> {
    lines
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let state = parts.last()?;
            if *state != "LISTEN" && *state != "LISTENING" {
                return None;
            }
            if !parts.first()?.to_lowercase().starts_with("tcp") {
                return None;
            }
            let local = if parts.len() >= 6 { parts[3] } else { *parts.get(1)? };
            parse_address(local)
        })
        .collect()
}

/// Split `addr:port`, `[v6]:port` or BSD-style `addr.port`
fn parse_address(addr: &str) -> Option<ListeningPort> {
    let (ip, port_str) = if let Some(rest) = addr.strip_prefix('[') {
        // IPv6: [::]:22 or [::1]:22
        let (ip, port) = rest.rsplit_once("]:")?;
        (ip, port)
    } else if let Some((ip, port)) = addr.rsplit_once(':') {
        // IPv4: 0.0.0.0:22 or 127.0.0.1:22, and bare `*:22`
        (ip, port)
    } else {
        // BSD netstat: 127.0.0.1.631 or *.22
        addr.rsplit_once('.')?
    };

    Some(ListeningPort {
        address: ip.to_string(),
        port: port_str.parse().ok()?,
    })
}
