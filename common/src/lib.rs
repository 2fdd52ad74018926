//! Shared building blocks for the lansweep workspace.
//!
//! Holds the result data model, the address-space expansion helpers and
//! the error taxonomy. Everything here is synchronous and allocation-light;
//! the concurrency lives in `lansweep-core`.

pub mod error;
pub mod model;
pub mod network;
pub mod service;
