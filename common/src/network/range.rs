use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::ParseError;

/// Expands a CIDR expression into its usable host addresses.
///
/// The network and broadcast addresses are excluded by a single
/// strictly-between rule, which makes `/31` and `/32` expand to nothing
/// without any special-casing.
pub fn expand_network(cidr: &str) -> Result<Vec<Ipv4Addr>, ParseError> {
    let network = Ipv4Network::from_str(cidr.trim())
        .map_err(|err| ParseError::InvalidCidr(format!("{cidr}: {err}")))?;

    let first = u32::from(network.network()).saturating_add(1);
    let last = u32::from(network.broadcast());

    Ok((first..last).map(Ipv4Addr::from).collect())
}
