use std::sync::Arc;

use async_trait::async_trait;
use cdnmap_common::config::CheckKind;
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::{DomainRecord, EvidenceKind};

use super::{Analyzer, ProbeBudget};
use crate::network::{DnsLookup, registrable_domain};

/// Authoritative nameservers. CDNs that also host DNS (Cloudflare, Akamai,
/// AWS) show up here even when nothing else gives them away.
pub struct NameserverAnalyzer {
    dns: Arc<dyn DnsLookup>,
}

impl NameserverAnalyzer {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl Analyzer for NameserverAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Nameserver
    }

    /// NS records of the domain itself, or of its registrable parent when
    /// the domain is not a zone apex.
    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        let name = record.name().to_string();
        let servers = match self.dns.lookup_ns(&name, budget.per_probe()).await {
            Ok(servers) => servers,
            Err(e) => {
                let parent = registrable_domain(&name);
                if parent == name {
                    return Err(e);
                }
                record.note_error(CheckKind::Nameserver, &e);
                self.dns.lookup_ns(&parent, budget.per_probe()).await?
            }
        };

        for server in &servers {
            record.add_evidence(EvidenceKind::Nameserver, server.clone());
        }
        Ok(servers)
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
