//! Raw packet construction and parsing for the active resolution path.

pub mod arp;
