use std::net::IpAddr;

use cdnmap_common::record::DomainRecord;
use colored::*;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn ips_to_details<'a>(ips: impl IntoIterator<Item = &'a IpAddr>) -> Vec<Detail> {
    ips.into_iter()
        .map(|ip| match ip {
            IpAddr::V4(v4) => ("IPv4".to_string(), v4.to_string().color(colors::IPV4_ADDR)),
            IpAddr::V6(v6) => ("IPv6".to_string(), v6.to_string().color(colors::IPV6_ADDR)),
        })
        .collect()
}

/// Tree rows of one domain. Raw evidence and the status trail are only
/// included when `verbose` is set.
pub fn record_details(record: &DomainRecord, verbose: bool) -> Vec<Detail> {
    let mut details: Vec<Detail> = record
        .cdn_names()
        .iter()
        .map(|name| ("CDN".to_string(), name.as_str().color(colors::CDN).bold()))
        .collect();

    details.extend(ips_to_details(record.ips()));

    if !verbose {
        return details;
    }

    let evidence = [
        ("CNAME", record.cnames()),
        ("Header", record.headers()),
        ("Whois", record.whois_orgs()),
        ("NS", record.nameservers()),
    ];
    for (key, values) in evidence {
        for value in values {
            details.push((key.to_string(), value.as_str().color(colors::EVIDENCE)));
        }
    }

    for entry in record.errors() {
        let value = format!("{} ({}): {}", entry.check, entry.code, entry.detail);
        details.push(("Status".to_string(), value.color(colors::FAILURE)));
    }

    details
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
    use cdnmap_common::catalog::CdnMatch;
    use cdnmap_common::config::CheckKind;
    use cdnmap_common::error::ProbeError;
    use cdnmap_common::record::EvidenceKind;

    fn record() -> DomainRecord {
        let mut record = DomainRecord::new("cdn.example.com");
        record.add_ip("192.0.2.1".parse().unwrap());
        record.add_ip("2001:db8::1".parse().unwrap());
        record.add_evidence(EvidenceKind::Header, "cloudflare");
        record.add_cdn(&CdnMatch::new("Cloudflare", "Cloudflare"));
        record.note_error(CheckKind::Whois, &ProbeError::Timeout);
        record
    }

    #[test]
    fn plain_details_show_cdns_then_addresses() {
        let keys: Vec<String> = record_details(&record(), false).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["CDN", "IPv4", "IPv6"]);
    }

    #[test]
    fn verbose_details_add_evidence_and_status() {
        let details = record_details(&record(), true);
        let keys: Vec<&str> = details.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["CDN", "IPv4", "IPv6", "Header", "Status"]);
        assert!(details[4].1.contains("whois"));
    }
}
