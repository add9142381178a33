//! Network plumbing shared by the analyzers.
//!
//! Analyzers never talk to a resolver or an HTTP stack directly; they go
//! through the [`DnsLookup`] and [`WebClient`] ports so that every
//! library-specific failure is mapped onto a [`ProbeError`](cdnmap_common::error::ProbeError)
//! in exactly one place.

pub mod dns;
pub mod http;

use std::net::IpAddr;

pub use dns::{DnsLookup, HickoryDns};
pub use http::{HeaderList, ReqwestClient, WebClient};

/// Second-level labels that sit under a two-letter country code and form
/// part of the public suffix (`example.co.uk`, `example.com.br`).
const CC_SECOND_LEVEL: [&str; 7] = ["co", "com", "net", "org", "gov", "edu", "ac"];

/// Returns `true` for addresses that a registry could plausibly own.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.is_multicast()
                || a == 0
                || a >= 240
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || (first == 0x2001 && v6.segments()[1] == 0x0db8))
        }
    }
}

/// Best-effort registrable domain (`www.shop.example.co.uk` -> `example.co.uk`).
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let keep = match labels.as_slice() {
        [.., second, tld] if tld.len() == 2 && CC_SECOND_LEVEL.contains(second) => 3,
        _ => 2,
    };
    let start = labels.len().saturating_sub(keep);
    labels[start..].join(".")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
