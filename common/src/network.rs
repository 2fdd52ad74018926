//! Address-space expansion: CIDR blocks into host addresses, port-range
//! expressions into concrete port lists.

pub mod ports;
pub mod range;
