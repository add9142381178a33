//! Registry ownership of the resolved addresses.
//!
//! Two sources are consulted per address:
//! * the Team Cymru IP-to-ASN DNS service, for the ASN description,
//! * RDAP (via the `rdap.org` bootstrap redirector), for the network name.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdnmap_common::config::CheckKind;
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::{DomainRecord, EvidenceKind};
use cdnmap_common::debug;

use super::{Analyzer, ProbeBudget, settle};
use crate::network::{DnsLookup, WebClient, is_public};

const RDAP_BOOTSTRAP: &str = "https://rdap.org/ip";
const RDAP_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(250);
/// Placeholder organisation some resolvers return for hijacked NXDOMAINs.
const SINKHOLE_ORG: &str = "BAREFRUIT-ERRORHANDLING";
/// Addresses looked up per domain, lowest first.
const MAX_ADDRESSES: usize = 4;

pub struct WhoisAnalyzer {
    dns: Arc<dyn DnsLookup>,
    web: Arc<dyn WebClient>,
}

impl WhoisAnalyzer {
    pub fn new(dns: Arc<dyn DnsLookup>, web: Arc<dyn WebClient>) -> Self {
        Self { dns, web }
    }

    async fn lookup_address(&self, ip: IpAddr, budget: &ProbeBudget) -> Result<Vec<String>, ProbeError> {
        if !is_public(ip) {
            return Err(ProbeError::ReservedAddress(ip));
        }

        let asn = self.asn_description(ip, budget).await;
        let rdap = self.rdap_network_name(ip, budget).await;

        match (asn, rdap) {
            (Err(e), Err(_)) => Err(e),
            (asn, rdap) => Ok([asn.ok(), rdap.ok()]
                .into_iter()
                .flatten()
                .filter(|org| !org.is_empty() && org != SINKHOLE_ORG)
                .collect()),
        }
    }

    async fn asn_description(&self, ip: IpAddr, budget: &ProbeBudget) -> Result<String, ProbeError> {
        let limit = budget.per_probe();
        let origin = self
            .dns
            .lookup_txt(&cymru_origin_name(ip), limit)
            .await
            .map_err(|_| ProbeError::AsnRegistry(ip))?;
        let asn = origin
            .iter()
            .find_map(|txt| parse_origin_asn(txt))
            .ok_or(ProbeError::AsnRegistry(ip))?;

        let described = self
            .dns
            .lookup_txt(&format!("AS{asn}.asn.cymru.com"), limit)
            .await
            .map_err(|_| ProbeError::AsnRegistry(ip))?;
        described
            .iter()
            .find_map(|txt| parse_asn_description(txt))
            .ok_or(ProbeError::AsnRegistry(ip))
    }

    /// RDAP network name, retrying rate-limited answers with exponential
    /// backoff and jitter.
    async fn rdap_network_name(&self, ip: IpAddr, budget: &ProbeBudget) -> Result<String, ProbeError> {
        let url = format!("{RDAP_BOOTSTRAP}/{ip}");
        let mut attempt = 0;
        loop {
            match self.web.fetch_json(&url, budget.per_probe()).await {
                Ok(body) => {
                    return body
                        .get("name")
                        .and_then(|v| v.as_str())
                        .map(|name| name.trim().to_string())
                        .ok_or_else(|| ProbeError::Malformed(format!("RDAP answer for {ip} has no name")));
                }
                Err(ProbeError::RateLimited(host)) if attempt + 1 < RDAP_ATTEMPTS => {
                    let jitter = Duration::from_millis(rand::random_range(0..100));
                    let wait = (BACKOFF_BASE * 2u32.pow(attempt) + jitter).min(budget.per_probe());
                    debug!("RDAP rate limited by {host}, retrying {ip} in {wait:?}");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Analyzer for WhoisAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Whois
    }

    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        if record.ips().is_empty() {
            return Err(ProbeError::NoIpAddress);
        }

        let ips: Vec<IpAddr> = record.ips().iter().copied().take(MAX_ADDRESSES).collect();
        let mut outcomes = Vec::new();
        for ip in ips {
            let outcome = self.lookup_address(ip, budget).await;
            if let Ok(orgs) = &outcome {
                for org in orgs {
                    record.add_evidence(EvidenceKind::WhoisOrg, org.clone());
                }
            }
            outcomes.push(outcome);
        }
        settle(record, CheckKind::Whois, outcomes)
    }
}

/// `a.b.c.d` -> `d.c.b.a.origin.asn.cymru.com`, IPv6 in nibble form under `origin6`.
fn cymru_origin_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.origin.asn.cymru.com")
        }
        IpAddr::V6(v6) => {
            let nibbles: Vec<String> = v6
                .octets()
                .iter()
                .rev()
                .flat_map(|byte| [byte & 0x0f, byte >> 4])
                .map(|n| format!("{n:x}"))
                .collect();
            format!("{}.origin6.asn.cymru.com", nibbles.join("."))
        }
    }
}

/// `"13335 | 104.16.0.0/13 | US | arin | 2014-03-28"` -> `13335`.
fn parse_origin_asn(txt: &str) -> Option<u32> {
    txt.trim_matches('"')
        .split('|')
        .next()?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// `"13335 | US | arin | 2010-07-14 | CLOUDFLARENET, US"` -> `CLOUDFLARENET, US`.
fn parse_asn_description(txt: &str) -> Option<String> {
    let description = txt.trim_matches('"').rsplit('|').next()?.trim();
    (!description.is_empty()).then(|| description.to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
