//! Status taxonomy for evidence probes.
//!
//! Every failure an analyzer can run into is expressed as a [`ProbeError`]
//! value rather than escaping as a panic or a library-specific error type.
//! Each variant carries a stable integer [`code`](ProbeError::code) that ends
//! up in the domain's status trail.

use std::net::IpAddr;

use thiserror::Error;

/// Code reserved for "this domain definitively does not exist".
pub const DOMAIN_NOT_FOUND_CODE: i32 = -1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no answer for {0}")]
    NoAnswer(String),

    #[error("no nameservers reachable for {0}")]
    NoNameservers(String),

    #[error("{0} does not exist (NXDOMAIN)")]
    NxDomain(String),

    #[error("probe timed out")]
    Timeout,

    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("{0} is not a publicly routable address")]
    ReservedAddress(IpAddr),

    #[error("ASN registry lookup failed for {0}")]
    AsnRegistry(IpAddr),

    #[error("rate limited by {0}")]
    RateLimited(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("redirect from {from} leaves the domain for {to}")]
    CrossDomainRedirect { from: String, to: String },

    #[error("no resolved IP addresses to probe")]
    NoIpAddress,

    #[error("unexpected data: {0}")]
    Malformed(String),

    #[error("domain {0} does not exist")]
    DomainNotFound(String),
}

impl ProbeError {
    pub fn code(&self) -> i32 {
        match self {
            ProbeError::NoAnswer(_) => 1,
            ProbeError::NoNameservers(_) => 2,
            ProbeError::NxDomain(_) => 3,
            ProbeError::Timeout => 4,
            ProbeError::Lookup(_) => 5,
            ProbeError::ReservedAddress(_) => 6,
            ProbeError::AsnRegistry(_) => 7,
            ProbeError::RateLimited(_) => 8,
            ProbeError::Connection(_) => 9,
            ProbeError::Tls(_) => 10,
            ProbeError::CrossDomainRedirect { .. } => 11,
            ProbeError::NoIpAddress => 12,
            ProbeError::Malformed(_) => 13,
            ProbeError::DomainNotFound(_) => DOMAIN_NOT_FOUND_CODE,
        }
    }

    /// Only a nonexistent domain aborts the rest of a pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProbeError::DomainNotFound(_))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_domain_not_found_is_fatal() {
        assert!(ProbeError::DomainNotFound("x.example".into()).is_fatal());
        assert!(!ProbeError::NxDomain("x.example".into()).is_fatal());
        assert!(!ProbeError::Timeout.is_fatal());
    }

    #[test]
    fn codes_are_distinct_and_positive_except_fatal() {
        let errors = [
            ProbeError::NoAnswer(String::new()),
            ProbeError::NoNameservers(String::new()),
            ProbeError::NxDomain(String::new()),
            ProbeError::Timeout,
            ProbeError::Lookup(String::new()),
            ProbeError::ReservedAddress("10.0.0.1".parse().unwrap()),
            ProbeError::AsnRegistry("1.1.1.1".parse().unwrap()),
            ProbeError::RateLimited(String::new()),
            ProbeError::Connection(String::new()),
            ProbeError::Tls(String::new()),
            ProbeError::CrossDomainRedirect { from: String::new(), to: String::new() },
            ProbeError::NoIpAddress,
            ProbeError::Malformed(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(ProbeError::code).collect();
        assert!(codes.iter().all(|c| *c > 0));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(ProbeError::DomainNotFound(String::new()).code(), DOMAIN_NOT_FOUND_CODE);
    }
}
