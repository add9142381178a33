use std::sync::Arc;

use async_trait::async_trait;
use cdnmap_common::config::CheckKind;
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::{DomainRecord, EvidenceKind};

use super::{Analyzer, ProbeBudget, probe_names, settle};
use crate::network::DnsLookup;

/// CNAME targets of the domain and its `www.` variant. Edge hostnames such as
/// `d111.cloudfront.net` are the most reliable CDN signal there is.
pub struct CnameAnalyzer {
    dns: Arc<dyn DnsLookup>,
}

impl CnameAnalyzer {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl Analyzer for CnameAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Cname
    }

    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        let mut outcomes = Vec::new();
        for name in probe_names(record.name()) {
            let outcome = self.dns.lookup_cnames(&name, budget.per_probe()).await;
            if let Ok(targets) = &outcome {
                for target in targets {
                    record.add_evidence(EvidenceKind::Cname, target.clone());
                }
            }
            outcomes.push(outcome);
        }
        settle(record, CheckKind::Cname, outcomes)
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
