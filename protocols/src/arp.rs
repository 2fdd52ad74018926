//! Standards-form ARP over Ethernet.
//!
//! Used by the hardware resolver's active fallback: one broadcast request
//! for the target, then reply frames are filtered until one carries the
//! target's protocol address.

use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;

const ETH_HDR_LEN: usize = 14;
const ARP_PKT_LEN: usize = 28;

const BROADCAST: MacAddr = MacAddr(0xff, 0xff, 0xff, 0xff, 0xff, 0xff);

/// Builds a broadcast ARP request asking who holds `target_ip`.
pub fn build_request(
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> anyhow::Result<Vec<u8>> {
    let mut buffer = vec![0u8; ETH_HDR_LEN + ARP_PKT_LEN];

    {
        let mut ethernet = MutableEthernetPacket::new(&mut buffer[..ETH_HDR_LEN])
            .context("ethernet header buffer too small")?;
        ethernet.set_destination(BROADCAST);
        ethernet.set_source(src_mac);
        ethernet.set_ethertype(EtherTypes::Arp);
    }

    {
        let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..])
            .context("arp payload buffer too small")?;
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(6);
        arp.set_proto_addr_len(4);
        arp.set_operation(ArpOperations::Request);
        arp.set_sender_hw_addr(src_mac);
        arp.set_sender_proto_addr(src_ip);
        arp.set_target_hw_addr(MacAddr::zero());
        arp.set_target_proto_addr(target_ip);
    }

    Ok(buffer)
}

/// Extracts the sender MAC from an ARP reply for `target_ip`.
///
/// Frames that are not ARP, not replies, or answer for a different
/// address yield `None`.
pub fn parse_reply(frame: &[u8], target_ip: Ipv4Addr) -> Option<MacAddr> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }
    if arp.get_sender_proto_addr() != target_ip {
        return None;
    }
    Some(arp.get_sender_hw_addr())
}
