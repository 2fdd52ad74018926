//! Hardware (MAC) address resolution.
//!
//! Per lookup, a two-step state machine that terminates on the first
//! success: read the operating system's neighbor table through a
//! platform-selected strategy, then fall back to an active ARP request
//! over a raw datalink channel. The fallback usually needs elevated
//! privileges; failing to acquire them is an ordinary miss, never fatal.
//! Every blocking wait races the job's cancellation token.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pnet::datalink::{self, Channel, Config, NetworkInterface};
use pnet::util::MacAddr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use lansweep_protocols::arp;

/// Deadline for one neighbor-table query, independent of the scan timeout.
const NEIGHBOR_DEADLINE: Duration = Duration::from_secs(3);
/// Fixed wait window for an ARP reply on the active path.
const ARP_REPLY_WAIT: Duration = Duration::from_secs(2);
/// Capture read timeout so the blocking receiver can observe cancellation.
const CAPTURE_POLL: Duration = Duration::from_millis(250);

pub struct HardwareResolver {
    neighbors: Box<dyn NeighborTable>,
}

impl HardwareResolver {
    pub fn new() -> Self {
        Self {
            neighbors: platform_neighbor_table(),
        }
    }

    /// Resolves the MAC of `ip`, or `None` when neither strategy finds one.
    pub async fn resolve(&self, ip: Ipv4Addr, cancel: &CancellationToken) -> Option<MacAddr> {
        let passive = tokio::select! {
            _ = cancel.cancelled() => return None,
            found = self.neighbors.lookup(ip) => found,
        };
        if let Some(mac) = passive {
            trace!(%ip, %mac, "neighbor table hit");
            return Some(mac);
        }
        active_arp_probe(ip, cancel).await
    }
}

impl Default for HardwareResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform strategy for the passive neighbor-table read.
#[async_trait]
trait NeighborTable: Send + Sync {
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr>;
}

fn platform_neighbor_table() -> Box<dyn NeighborTable> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ProcNetArp)
    }
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsArpCommand)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(DarwinArpCommand)
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        Box::new(NoNeighborTable)
    }
}

/// Linux: the kernel exposes the IPv4 neighbor table as text.
#[cfg(target_os = "linux")]
struct ProcNetArp;

#[cfg(target_os = "linux")]
#[async_trait]
impl NeighborTable for ProcNetArp {
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let table = tokio::fs::read_to_string("/proc/net/arp").await.ok()?;
        parse_proc_net_arp(&table, ip)
    }
}

/// Windows: shell out to `arp -a <ip>` under a short deadline.
#[cfg(target_os = "windows")]
struct WindowsArpCommand;

#[cfg(target_os = "windows")]
#[async_trait]
impl NeighborTable for WindowsArpCommand {
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let output = run_neighbor_query("arp", &["-a", &ip.to_string()]).await?;
        parse_arp_command_output(&output, ip)
    }
}

/// macOS: `arp -n <ip>` first, then the full `arp -a` table.
#[cfg(target_os = "macos")]
struct DarwinArpCommand;

#[cfg(target_os = "macos")]
#[async_trait]
impl NeighborTable for DarwinArpCommand {
    async fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        if let Some(output) = run_neighbor_query("arp", &["-n", &ip.to_string()]).await {
            if let Some(mac) = parse_arp_command_output(&output, ip) {
                return Some(mac);
            }
        }
        let output = run_neighbor_query("arp", &["-a"]).await?;
        parse_arp_command_output(&output, ip)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
struct NoNeighborTable;

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
#[async_trait]
impl NeighborTable for NoNeighborTable {
    async fn lookup(&self, _ip: Ipv4Addr) -> Option<MacAddr> {
        None
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
async fn run_neighbor_query(program: &str, args: &[&str]) -> Option<String> {
    let mut command = tokio::process::Command::new(program);
    command.args(args);
    match tokio::time::timeout(NEIGHBOR_DEADLINE, command.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        _ => None,
    }
}

/// Parses `/proc/net/arp`, rejecting incomplete and all-zero entries.
///
/// Row shape: `IP address  HW type  Flags  HW address  Mask  Device`.
fn parse_proc_net_arp(table: &str, ip: Ipv4Addr) -> Option<MacAddr> {
    let ip_text = ip.to_string();
    for line in table.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 || fields[0] != ip_text {
            continue;
        }
        if let Some(mac) = parse_mac_token(fields[3]) {
            if mac != MacAddr::zero() {
                return Some(mac);
            }
        }
    }
    None
}

/// Best-effort parse of `arp` command output, tolerant of both the
/// Windows tabular shape (`192.168.1.1  00-11-22-33-44-55  dynamic`) and
/// the BSD shape (`? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0`).
#[cfg_attr(not(any(target_os = "windows", target_os = "macos")), allow(dead_code))]
fn parse_arp_command_output(output: &str, ip: Ipv4Addr) -> Option<MacAddr> {
    let ip_text = ip.to_string();
    for line in output.lines() {
        if !line.contains(&ip_text) {
            continue;
        }
        for field in line.split_whitespace() {
            if let Some(mac) = parse_mac_token(field) {
                if mac != MacAddr::zero() {
                    return Some(mac);
                }
            }
        }
    }
    None
}

/// Accepts hyphen- or colon-delimited MAC tokens; `<incomplete>` and
/// other noise fail the parse.
fn parse_mac_token(token: &str) -> Option<MacAddr> {
    if token.len() != 17 {
        return None;
    }
    token.replace('-', ":").parse::<MacAddr>().ok()
}

/// Sends a broadcast ARP request on the first usable interface and waits
/// for a matching reply.
async fn active_arp_probe(ip: Ipv4Addr, cancel: &CancellationToken) -> Option<MacAddr> {
    let interface = usable_interface()?;
    let src_mac = interface.mac?;
    let src_ip = interface.ips.iter().find_map(|net| match net.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    })?;

    debug!(%ip, interface = %interface.name, "sending active ARP request");
    let token = cancel.clone();
    let exchange =
        tokio::task::spawn_blocking(move || arp_exchange(&interface, src_mac, src_ip, ip, &token));

    tokio::select! {
        // the blocking receiver notices the token on its next poll and exits
        _ = cancel.cancelled() => None,
        joined = exchange => joined.ok().flatten(),
    }
}

fn arp_exchange(
    interface: &NetworkInterface,
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    target: Ipv4Addr,
    cancel: &CancellationToken,
) -> Option<MacAddr> {
    let config = Config {
        read_timeout: Some(CAPTURE_POLL),
        ..Config::default()
    };
    let (mut tx, mut rx) = match datalink::channel(interface, config) {
        Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
        // unsupported channel type or missing privileges: report no MAC
        _ => {
            trace!(interface = %interface.name, "could not open capture handle");
            return None;
        }
    };

    let request = arp::build_request(src_mac, src_ip, target).ok()?;
    match tx.send_to(&request, None) {
        Some(Ok(())) => {}
        _ => return None,
    }

    let deadline = Instant::now() + ARP_REPLY_WAIT;
    while Instant::now() < deadline {
        if cancel.is_cancelled() {
            return None;
        }
        match rx.next() {
            Ok(frame) => {
                if let Some(mac) = arp::parse_reply(frame, target) {
                    return Some(mac);
                }
            }
            // read timeout; loop to re-check the deadline and the token
            Err(_) => {}
        }
    }
    None
}

/// First up, non-loopback interface carrying an IPv4 address.
fn usable_interface() -> Option<NetworkInterface> {
    datalink::interfaces().into_iter().find(|intf| {
        intf.is_up() && !intf.is_loopback() && intf.ips.iter().any(|net| net.is_ipv4())
    })
}
