//! Vendor lookup and rule-based device classification.
//!
//! Both functions are pure, total and deterministic. The classifier's
//! rule order is part of the observable contract: the first matching
//! rule wins, so a host with a database port and SSH is still reported
//! as a database server because that rule runs earlier.

use lansweep_common::model::HostResult;

const WEB_PORTS: [u16; 4] = [80, 443, 8080, 8443];
const PRINTER_PORTS: [u16; 3] = [9100, 515, 631];
const DATABASE_PORTS: [u16; 5] = [3306, 5432, 1433, 27017, 6379];

const ROUTER_HOSTNAME_HINTS: [&str; 6] = [
    "router", "gateway", "modem", "openwrt", "mikrotik", "unifi",
];
const NETWORK_VENDORS: [&str; 6] = [
    "Cisco", "TP-Link", "Netgear", "Ubiquiti", "MikroTik", "D-Link",
];
const VIRTUALIZATION_VENDORS: [&str; 4] = ["VMware", "VirtualBox", "QEMU", "Parallels"];

/// OUI prefix table, lowercase colon-delimited first three octets.
static OUI_VENDORS: &[(&str, &str)] = &[
    ("00:50:56", "VMware"),
    ("00:0c:29", "VMware"),
    ("00:1c:42", "Parallels"),
    ("08:00:27", "VirtualBox"),
    ("52:54:00", "QEMU"),
    ("00:1b:21", "Apple"),
    ("00:23:12", "Apple"),
    ("ac:de:48", "Apple"),
    ("b8:27:eb", "Raspberry Pi"),
    ("dc:a6:32", "Raspberry Pi"),
    ("e4:5f:01", "Raspberry Pi"),
    ("00:40:96", "Cisco"),
    ("70:db:98", "Cisco"),
    ("50:c7:bf", "TP-Link"),
    ("f4:f2:6d", "TP-Link"),
    ("20:4e:7f", "Netgear"),
    ("24:a4:3c", "Ubiquiti"),
    ("f0:9f:c2", "Ubiquiti"),
    ("4c:5e:0c", "MikroTik"),
    ("d4:ca:6d", "MikroTik"),
    ("00:1b:11", "D-Link"),
];

/// Maps a MAC's 3-octet prefix to a vendor label.
///
/// Total over every input string: short, malformed or unknown MACs all
/// yield `"Unknown"`.
pub fn vendor_of(mac: &str) -> &'static str {
    let Some(prefix) = mac.get(..8) else {
        return "Unknown";
    };
    let prefix = prefix.to_ascii_lowercase();
    OUI_VENDORS
        .iter()
        .find(|(oui, _)| *oui == prefix)
        .map(|(_, vendor)| *vendor)
        .unwrap_or("Unknown")
}

/// Classifies a host's likely device role from its open ports, vendor
/// and hostname. First matching rule wins; only open ports count.
pub fn classify_device(host: &HostResult) -> &'static str {
    let open: Vec<u16> = host.open_ports().collect();
    let has = |port: u16| open.contains(&port);
    let has_any = |set: &[u16]| set.iter().any(|port| open.contains(port));
    let hostname = host
        .hostname
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();

    if has_any(&PRINTER_PORTS) {
        return "Printer";
    }
    if has_any(&DATABASE_PORTS) {
        return "Database Server";
    }

    let web = has_any(&WEB_PORTS);
    let network_vendor = NETWORK_VENDORS.contains(&host.vendor.as_str());
    let router_name = ROUTER_HOSTNAME_HINTS
        .iter()
        .any(|hint| hostname.contains(hint));
    if (web && has(22)) || network_vendor || router_name {
        return "Router/Network Device";
    }

    if VIRTUALIZATION_VENDORS.contains(&host.vendor.as_str()) {
        return "Virtual Machine";
    }
    if host.vendor == "Raspberry Pi" {
        return "Raspberry Pi";
    }

    if has(3389) || (has(445) && has(139)) {
        return "Windows Computer";
    }
    if has(22) {
        return "Linux/Unix Server";
    }
    if web {
        return "Web Server";
    }
    if !open.is_empty() && open.len() < 3 {
        return "IoT Device";
    }
    "Unknown Device"
}

#[cfg(test)]
mod tests {
    use super::*;
    use lansweep_common::model::{PortProbeResult, PortState, Transport};
    use lansweep_common::service;
    use std::net::Ipv4Addr;

    fn host_with_open_ports(ports: &[u16]) -> HostResult {
        let mut host = HostResult::new(Ipv4Addr::new(192, 168, 1, 20));
        for &port in ports {
            host.record_port(PortProbeResult {
                port,
                transport: Transport::Tcp,
                state: PortState::Open,
                service: service::service_name(port),
            });
        }
        host
    }

    #[test]
    fn vendor_lookup_is_total() {
        assert_eq!(vendor_of("00:50:56:ab:cd:ef"), "VMware");
        assert_eq!(vendor_of("B8:27:EB:00:00:01"), "Raspberry Pi");
        assert_eq!(vendor_of(""), "Unknown");
        assert_eq!(vendor_of("zz"), "Unknown");
        assert_eq!(vendor_of("ff:ff:ff:ff:ff:ff"), "Unknown");
        // non-ascii input must not panic on slicing
        assert_eq!(vendor_of("криптоадрес"), "Unknown");
    }

    #[test]
    fn web_only_host_is_a_web_server() {
        assert_eq!(classify_device(&host_with_open_ports(&[80, 443])), "Web Server");
    }

    #[test]
    fn web_plus_ssh_is_a_network_device() {
        assert_eq!(
            classify_device(&host_with_open_ports(&[80, 22])),
            "Router/Network Device"
        );
    }

    #[test]
    fn rdp_and_smb_is_a_windows_machine() {
        assert_eq!(
            classify_device(&host_with_open_ports(&[3389, 445])),
            "Windows Computer"
        );
    }

    #[test]
    fn no_open_ports_is_unknown() {
        assert_eq!(classify_device(&host_with_open_ports(&[])), "Unknown Device");
    }

    #[test]
    fn printer_ports_beat_everything() {
        assert_eq!(
            classify_device(&host_with_open_ports(&[9100, 3306, 22, 80])),
            "Printer"
        );
    }

    #[test]
    fn database_rule_outranks_ssh() {
        // intentional bias: the database rule runs before the SSH rule
        assert_eq!(
            classify_device(&host_with_open_ports(&[3306, 22])),
            "Database Server"
        );
    }

    #[test]
    fn network_vendor_wins_without_matching_ports() {
        let mut host = host_with_open_ports(&[]);
        host.vendor = "Ubiquiti".to_string();
        assert_eq!(classify_device(&host), "Router/Network Device");
    }

    #[test]
    fn router_hostname_hint_matches_case_insensitively() {
        let mut host = host_with_open_ports(&[]);
        host.hostname = Some("OpenWRT-Gateway.lan".to_string());
        assert_eq!(classify_device(&host), "Router/Network Device");
    }

    #[test]
    fn virtualization_vendor_refines_the_label() {
        let mut host = host_with_open_ports(&[]);
        host.vendor = "VMware".to_string();
        assert_eq!(classify_device(&host), "Virtual Machine");

        host.vendor = "Raspberry Pi".to_string();
        assert_eq!(classify_device(&host), "Raspberry Pi");
    }

    #[test]
    fn lone_ssh_is_a_linux_server() {
        assert_eq!(
            classify_device(&host_with_open_ports(&[22])),
            "Linux/Unix Server"
        );
    }

    #[test]
    fn few_odd_open_ports_fall_back_to_iot() {
        assert_eq!(classify_device(&host_with_open_ports(&[1883])), "IoT Device");
        assert_eq!(
            classify_device(&host_with_open_ports(&[1883, 8883])),
            "IoT Device"
        );
    }

    #[test]
    fn closed_ports_never_influence_the_label() {
        let mut host = host_with_open_ports(&[]);
        host.record_port(PortProbeResult {
            port: 9100,
            transport: Transport::Tcp,
            state: PortState::Closed,
            service: "JetDirect",
        });
        assert_eq!(classify_device(&host), "Unknown Device");
    }
}
