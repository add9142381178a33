use std::sync::Arc;

use async_trait::async_trait;
use cdnmap_common::catalog::{Catalog, CdnMatch, UNRECOGNIZED_CDN};
use cdnmap_common::config::CheckKind;
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::{DomainRecord, EvidenceKind};

use super::{Analyzer, ProbeBudget, probe_names, settle};
use crate::network::{HeaderList, WebClient};

/// Headers whose values name the serving infrastructure.
const EVIDENCE_HEADERS: [&str; 5] = ["server", "via", "x-cache", "x-served-by", "x-cdn"];

/// Header names (or name prefixes) only a specific vendor emits.
const VENDOR_HEADERS: [(&str, &str); 8] = [
    ("cf-ray", "Cloudflare"),
    ("cf-cache-status", "Cloudflare"),
    ("x-amz-cf-", "Cloudfront"),
    ("x-akamai-transformed", "Akamai"),
    ("akamai-", "Akamai"),
    ("x-fastly-request-id", "Fastly"),
    ("x-azure-ref", "MicrosoftAzure"),
    ("x-iinfo", "Incapsula"),
];

const SCHEMES: [&str; 2] = ["http", "https"];

/// Response headers of the domain and its `www.` variant, over plain HTTP
/// and over TLS.
pub struct HttpAnalyzer {
    web: Arc<dyn WebClient>,
}

impl HttpAnalyzer {
    pub fn new(web: Arc<dyn WebClient>) -> Self {
        Self { web }
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Http
    }

    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        if record.ips().is_empty() {
            return Err(ProbeError::NoIpAddress);
        }

        let mut outcomes = Vec::new();
        for name in probe_names(record.name()) {
            for scheme in SCHEMES {
                let url = format!("{scheme}://{name}");
                let outcome = self
                    .web
                    .fetch_headers(&url, budget.per_probe())
                    .await
                    .map(|headers| header_evidence(&headers));
                if let Ok(values) = &outcome {
                    for value in values {
                        record.add_evidence(EvidenceKind::Header, value.clone());
                    }
                }
                outcomes.push(outcome);
            }
        }
        settle(record, CheckKind::Http, outcomes)
    }

    /// Catalog matches, or the unrecognized-CDN marker when nothing matched
    /// but a cache header was seen.
    fn interpret(&self, evidence: &[String], catalog: &Catalog) -> Result<Vec<CdnMatch>, ProbeError> {
        let found = catalog.match_all(evidence);
        if found.is_empty() && evidence.iter().any(|e| e == UNRECOGNIZED_CDN) {
            return Ok(vec![CdnMatch::new(UNRECOGNIZED_CDN, UNRECOGNIZED_CDN)]);
        }
        Ok(found)
    }
}

/// Values of the interesting headers plus the vendor behind any
/// vendor-specific header name. A `-cache` header name (Drupal's aside)
/// adds [`UNRECOGNIZED_CDN`].
fn header_evidence(headers: &HeaderList) -> Vec<String> {
    let mut evidence: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        let value = value.trim();
        if !value.is_empty() && !evidence.iter().any(|v| v == value) {
            evidence.push(value.to_string());
        }
    };

    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        if EVIDENCE_HEADERS.contains(&name.as_str()) {
            push(value.as_str());
        }
        if let Some((_, vendor)) = VENDOR_HEADERS.iter().find(|(prefix, _)| name.starts_with(prefix)) {
            push(*vendor);
        }
        if name.contains("-cache") && !name.contains("drupal") {
            push(UNRECOGNIZED_CDN);
        }
    }
    evidence
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
