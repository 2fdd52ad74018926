//! Local network autodetection.
//!
//! Lets a front-end default the scan target when none is given: the
//! first up, non-loopback interface carrying an IPv4 address wins.

use anyhow::bail;
use pnet::datalink;
use pnet::ipnetwork::IpNetwork;

/// Returns the local network in CIDR form, e.g. `"192.168.1.0/24"`.
pub fn detect_local_network() -> anyhow::Result<String> {
    for intf in datalink::interfaces() {
        if !intf.is_up() || intf.is_loopback() {
            continue;
        }
        for net in &intf.ips {
            if let IpNetwork::V4(v4) = net {
                return Ok(format!("{}/{}", v4.network(), v4.prefix()));
            }
        }
    }
    bail!("no active IPv4 interface found; specify the network explicitly")
}
