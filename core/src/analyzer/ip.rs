//! Address resolution. Always the first analyzer of a pipeline: later probes
//! need the addresses it finds.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use cdnmap_common::catalog::{Catalog, CdnMatch};
use cdnmap_common::config::CheckKind;
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::DomainRecord;

use super::{Analyzer, ProbeBudget, probe_names, settle};
use crate::network::DnsLookup;

pub struct IpAnalyzer {
    dns: Arc<dyn DnsLookup>,
}

impl IpAnalyzer {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl Analyzer for IpAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Ip
    }

    /// Resolves the domain and its `www.` variant. A domain that resolves to
    /// nothing and whose bare name is NXDOMAIN does not exist.
    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        let mut outcomes = Vec::new();
        for name in probe_names(record.name()) {
            let outcome = self.dns.lookup_ips(&name, budget.per_probe()).await.map(|ips| {
                ips.into_iter()
                    .map(|ip| {
                        record.add_ip(ip);
                        ip.to_string()
                    })
                    .collect::<Vec<String>>()
            });
            outcomes.push(outcome);
        }

        let bare_missing = matches!(outcomes.first(), Some(Err(ProbeError::NxDomain(_))));
        if record.ips().is_empty() && bare_missing {
            for outcome in outcomes.into_iter().skip(1) {
                if let Err(e) = outcome {
                    record.note_error(CheckKind::Ip, &e);
                }
            }
            return Err(ProbeError::DomainNotFound(record.name().to_string()));
        }

        settle(record, CheckKind::Ip, outcomes)
    }

    /// Evidence is the textual addresses; they are checked against the
    /// catalog's published ranges.
    fn interpret(&self, evidence: &[String], catalog: &Catalog) -> Result<Vec<CdnMatch>, ProbeError> {
        let mut found: Vec<CdnMatch> = Vec::new();
        for raw in evidence {
            let ip: IpAddr = raw
                .parse()
                .map_err(|_| ProbeError::Malformed(format!("not an address: {raw}")))?;
            for hit in catalog.match_ip(ip) {
                if !found.contains(&hit) {
                    found.push(hit);
                }
            }
        }
        Ok(found)
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
