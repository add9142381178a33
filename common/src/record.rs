//! # Domain Record
//!
//! The mutable accumulator of evidence and results for one input domain.
//!
//! Every container is allocated fresh by [`DomainRecord::new`], so two
//! records never share state. All evidence setters deduplicate on insert,
//! which makes running the same analyzer twice against one record safe: a
//! second pass can only add to what the first pass found.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::Serialize;

use crate::catalog::{CdnMatch, UNRECOGNIZED_CDN};
use crate::config::CheckKind;
use crate::error::ProbeError;

/// Which evidence list a string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Cname,
    Header,
    WhoisOrg,
    Nameserver,
}

impl EvidenceKind {
    pub const ALL: [EvidenceKind; 4] = [
        EvidenceKind::Cname,
        EvidenceKind::Header,
        EvidenceKind::Nameserver,
        EvidenceKind::WhoisOrg,
    ];
}

/// A single entry of a record's diagnostic status trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub check: CheckKind,
    pub code: i32,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainRecord {
    name: String,
    ips: BTreeSet<IpAddr>,
    cnames: Vec<String>,
    headers: Vec<String>,
    whois_orgs: Vec<String>,
    nameservers: Vec<String>,
    cdns: Vec<String>,
    cdn_names: Vec<String>,
    frontable: bool,
    errors: Vec<StatusEntry>,
}

impl DomainRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ips: BTreeSet::new(),
            cnames: Vec::new(),
            headers: Vec::new(),
            whois_orgs: Vec::new(),
            nameservers: Vec::new(),
            cdns: Vec::new(),
            cdn_names: Vec::new(),
            frontable: false,
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ips(&self) -> &BTreeSet<IpAddr> {
        &self.ips
    }

    pub fn add_ip(&mut self, ip: IpAddr) -> bool {
        self.ips.insert(ip)
    }

    pub fn evidence(&self, kind: EvidenceKind) -> &[String] {
        match kind {
            EvidenceKind::Cname => &self.cnames,
            EvidenceKind::Header => &self.headers,
            EvidenceKind::WhoisOrg => &self.whois_orgs,
            EvidenceKind::Nameserver => &self.nameservers,
        }
    }

    /// Appends `value` to the selected evidence list unless it is empty or
    /// already present. Returns whether the list grew.
    pub fn add_evidence(&mut self, kind: EvidenceKind, value: impl Into<String>) -> bool {
        let value: String = value.into();
        if value.trim().is_empty() {
            return false;
        }
        let list: &mut Vec<String> = match kind {
            EvidenceKind::Cname => &mut self.cnames,
            EvidenceKind::Header => &mut self.headers,
            EvidenceKind::WhoisOrg => &mut self.whois_orgs,
            EvidenceKind::Nameserver => &mut self.nameservers,
        };
        if list.contains(&value) {
            return false;
        }
        list.push(value);
        true
    }

    pub fn cnames(&self) -> &[String] {
        &self.cnames
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn whois_orgs(&self) -> &[String] {
        &self.whois_orgs
    }

    pub fn nameservers(&self) -> &[String] {
        &self.nameservers
    }

    pub fn cdns(&self) -> &[String] {
        &self.cdns
    }

    pub fn cdn_names(&self) -> &[String] {
        &self.cdn_names
    }

    /// Records a matched CDN, keyed by its canonical identifier. `cdns` and
    /// `cdn_names` stay index-aligned. The [`UNRECOGNIZED_CDN`] placeholder
    /// only stands in while no known CDN is recorded.
    pub fn add_cdn(&mut self, found: &CdnMatch) -> bool {
        if self.cdns.iter().any(|id| id == &found.id) {
            return false;
        }
        if found.id == UNRECOGNIZED_CDN {
            if self.has_cdn() {
                return false;
            }
        } else if let Some(at) = self.cdns.iter().position(|id| id == UNRECOGNIZED_CDN) {
            self.cdns.remove(at);
            self.cdn_names.remove(at);
        }
        self.cdns.push(found.id.clone());
        self.cdn_names.push(found.name.clone());
        true
    }

    pub fn has_cdn(&self) -> bool {
        !self.cdns.is_empty()
    }

    pub fn is_frontable(&self) -> bool {
        self.frontable
    }

    /// Re-derives the `frontable` flag from the current CDN list.
    pub fn finalize(&mut self) {
        self.frontable = self.has_cdn();
    }

    pub fn errors(&self) -> &[StatusEntry] {
        &self.errors
    }

    pub fn note_error(&mut self, check: CheckKind, err: &ProbeError) {
        self.errors.push(StatusEntry {
            check,
            code: err.code(),
            detail: err.to_string(),
        });
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

    fn cloudfront() -> CdnMatch {
        CdnMatch::new("Cloudfront", "Cloudfront")
    }

    #[test]
    fn records_do_not_share_containers() {
        let mut records: Vec<DomainRecord> = ["a.example", "b.example", "c.example"]
            .into_iter()
            .map(DomainRecord::new)
            .collect();

        records[0].add_evidence(EvidenceKind::Cname, "edge.cloudfront.net");
        records[0].add_ip("192.0.2.1".parse().unwrap());
        records[0].add_cdn(&cloudfront());

        for other in &records[1..] {
            assert!(other.cnames().is_empty());
            assert!(other.ips().is_empty());
            assert!(other.cdns().is_empty());
        }
    }

    #[test]
    fn known_cdn_replaces_unrecognized_placeholder() {
        let unknown = CdnMatch::new(UNRECOGNIZED_CDN, UNRECOGNIZED_CDN);
        let mut record = DomainRecord::new("a.example");

        assert!(record.add_cdn(&unknown));
        assert!(record.add_cdn(&cloudfront()));
        assert_eq!(record.cdns(), ["Cloudfront".to_string()]);
        assert_eq!(record.cdn_names(), ["Cloudfront".to_string()]);

        assert!(!record.add_cdn(&unknown));
        assert_eq!(record.cdns().len(), 1);
    }

    #[test]
    fn evidence_is_deduplicated_and_ignores_blanks() {
        let mut record = DomainRecord::new("a.example");
        assert!(record.add_evidence(EvidenceKind::Header, "cloudflare"));
        assert!(!record.add_evidence(EvidenceKind::Header, "cloudflare"));
        assert!(!record.add_evidence(EvidenceKind::Header, "   "));
        assert_eq!(record.headers(), ["cloudflare".to_string()]);
    }

    #[test]
    fn cdns_stay_aligned_with_names() {
        let mut record = DomainRecord::new("a.example");
        assert!(record.add_cdn(&CdnMatch::new("Cloudflare", "Cloudflare - https://www.cloudflare.com")));
        assert!(record.add_cdn(&cloudfront()));
        assert!(!record.add_cdn(&CdnMatch::new("Cloudflare", "another label")));
        assert_eq!(record.cdns(), ["Cloudflare".to_string(), "Cloudfront".to_string()]);
        assert_eq!(record.cdn_names().len(), record.cdns().len());
        assert_eq!(record.cdn_names()[0], "Cloudflare - https://www.cloudflare.com");
    }

    #[test]
    fn finalize_tracks_cdn_presence() {
        let mut record = DomainRecord::new("a.example");
        record.finalize();
        assert!(!record.is_frontable());
        record.add_cdn(&cloudfront());
        record.finalize();
        assert!(record.is_frontable());
    }

    #[test]
    fn errors_keep_codes() {
        let mut record = DomainRecord::new("a.example");
        record.note_error(CheckKind::Whois, &ProbeError::NoIpAddress);
        assert_eq!(record.errors()[0].code, ProbeError::NoIpAddress.code());
        assert_eq!(record.errors()[0].check, CheckKind::Whois);
    }
}
