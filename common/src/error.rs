use thiserror::Error;

/// Input errors raised while constructing a scan job.
///
/// These are the only fatal errors in the system: a job that fails to
/// parse never starts scanning. Everything that goes wrong later (dial
/// failures, missing privileges, lookup misses) is folded into the
/// per-host results instead of being propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid CIDR expression: {0}")]
    InvalidCidr(String),
    #[error("invalid port specification: {0}")]
    InvalidPortSpec(String),
}
