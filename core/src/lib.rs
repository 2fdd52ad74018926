//! The lansweep scan engine.
//!
//! Discovers hosts on a local IPv4 subnet with a two-phase bounded
//! fan-out (liveness sweep, then port sweep), resolves hardware
//! addresses through the OS neighbor table with a raw-ARP fallback, and
//! classifies each host's likely device role. Front-ends consume the
//! engine only through [`ScanJob`]: `scan`, `stop`, `get_results` and
//! the progress callback.

pub mod classify;
pub mod scanner;

pub use scanner::ScanJob;
