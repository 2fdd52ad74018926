//! # Scan Result Model
//!
//! The in-memory shapes produced by a scan: one [`HostResult`] per host
//! that answered the liveness sweep, holding one [`PortProbeResult`] per
//! probe that was worth recording.

use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::service;

/// Transport used for a single port probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Udp => write!(f, "udp"),
        }
    }
}

/// Outcome of a single port probe.
///
/// TCP probes never report `Filtered`: refused, timed out and unreachable
/// all collapse into `Closed`, because a bare connect cannot tell them
/// apart. The variant exists for consumers that render UDP results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl PortState {
    pub fn is_open(self) -> bool {
        self == PortState::Open
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
        }
    }
}

/// Result of probing one port on one host. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortProbeResult {
    pub port: u16,
    pub transport: Transport,
    pub state: PortState,
    /// Well-known service name for the port, or `"Unknown"`.
    pub service: &'static str,
}

/// Everything learned about a single live host.
///
/// Built incrementally while the per-host fan-out runs, then frozen and
/// appended to the job's result collection in one atomic step. `ports`
/// reflects probe-completion order, not numeric order; `protocols` keeps
/// first-seen order and never holds duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct HostResult {
    pub ip: Ipv4Addr,
    pub mac: Option<MacAddr>,
    pub hostname: Option<String>,
    pub ports: Vec<PortProbeResult>,
    pub protocols: Vec<String>,
    pub device_type: String,
    pub vendor: String,
    pub is_alive: bool,
}

impl HostResult {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            mac: None,
            hostname: None,
            ports: Vec::new(),
            protocols: Vec::new(),
            device_type: String::new(),
            vendor: String::from("Unknown"),
            is_alive: true,
        }
    }

    /// Records one probe outcome. Open ports with a mapped application
    /// protocol also extend the deduplicated protocol list.
    pub fn record_port(&mut self, probe: PortProbeResult) {
        if probe.state.is_open() {
            if let Some(protocol) = service::protocol_for_port(probe.port) {
                if !self.protocols.iter().any(|known| known == protocol) {
                    self.protocols.push(protocol.to_string());
                }
            }
        }
        self.ports.push(probe);
    }

    pub fn open_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports
            .iter()
            .filter(|probe| probe.state.is_open())
            .map(|probe| probe.port)
    }

    pub fn has_open(&self, port: u16) -> bool {
        self.open_ports().any(|open| open == port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_probe(port: u16) -> PortProbeResult {
        PortProbeResult {
            port,
            transport: Transport::Tcp,
            state: PortState::Open,
            service: service::service_name(port),
        }
    }

    #[test]
    fn record_port_deduplicates_protocols_in_first_seen_order() {
        let mut host = HostResult::new(Ipv4Addr::new(192, 168, 1, 10));
        host.record_port(open_probe(443));
        host.record_port(open_probe(80));
        host.record_port(open_probe(8080)); // maps to HTTP, already seen
        assert_eq!(host.protocols, vec!["HTTPS", "HTTP"]);
        assert_eq!(host.ports.len(), 3);
    }

    #[test]
    fn closed_ports_do_not_contribute_protocols() {
        let mut host = HostResult::new(Ipv4Addr::new(192, 168, 1, 10));
        host.record_port(PortProbeResult {
            port: 22,
            transport: Transport::Tcp,
            state: PortState::Closed,
            service: "SSH",
        });
        assert!(host.protocols.is_empty());
        assert!(!host.has_open(22));
    }

    #[test]
    fn display_forms_are_lowercase() {
        assert_eq!(Transport::Tcp.to_string(), "tcp");
        assert_eq!(Transport::Udp.to_string(), "udp");
        assert_eq!(PortState::Open.to_string(), "open");
        assert_eq!(PortState::Filtered.to_string(), "filtered");
    }
}
