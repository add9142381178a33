//! The evidence-gathering **abstraction**.
//!
//! Every source of CDN evidence (DNS records, HTTP headers, WHOIS data) is an
//! [`Analyzer`]. An analyzer is stateless: everything it learns goes into the
//! [`DomainRecord`] it is handed, so the same instance serves every domain of
//! a batch and can safely run twice against one record.
//!
//! Analyzers are collected in an [`AnalyzerRegistry`], a static list ordered
//! by [`Analyzer::priority`]. Adding a new evidence source means adding a new
//! implementation and registering it; nothing is discovered at runtime.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdnmap_common::catalog::{Catalog, CdnMatch};
use cdnmap_common::config::{CheckKind, ScanConfig};
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::DomainRecord;

use crate::network::{DnsLookup, HickoryDns, ReqwestClient, WebClient};

pub mod cname;
pub mod http;
pub mod ip;
pub mod nameserver;
pub mod whois;

pub use cname::CnameAnalyzer;
pub use http::HttpAnalyzer;
pub use ip::IpAnalyzer;
pub use nameserver::NameserverAnalyzer;
pub use whois::WhoisAnalyzer;

/// Share of the per-domain timeout any single network call may consume.
const PROBE_SHARE: f64 = 0.4;
const MIN_PROBE: Duration = Duration::from_millis(1);

/// Time allowances for one domain's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeBudget {
    total: Duration,
    per_probe: Duration,
}

impl ProbeBudget {
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            per_probe: total.mul_f64(PROBE_SHARE).max(MIN_PROBE),
        }
    }

    /// Deadline of the whole job.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Upper bound for one DNS query, HTTP fetch or RDAP call.
    pub fn per_probe(&self) -> Duration {
        self.per_probe
    }
}

/// Outcome of one [`Analyzer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerReport {
    pub kind: CheckKind,
    pub cdns: Vec<CdnMatch>,
    pub status: Result<(), ProbeError>,
}

impl AnalyzerReport {
    /// `0` on success, otherwise the failure's status code.
    pub fn code(&self) -> i32 {
        match &self.status {
            Ok(()) => 0,
            Err(e) => e.code(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(&self.status, Err(e) if e.is_fatal())
    }

    pub fn found_cdn(&self) -> bool {
        !self.cdns.is_empty()
    }
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// Lower runs first.
    fn priority(&self) -> u8 {
        self.kind() as u8
    }

    /// Performs this analyzer's network probes against the domain and its
    /// `www.` variant, merging findings into `record`.
    ///
    /// Returns the evidence found by this call when at least one probe
    /// succeeded. Failures of individual probes that are absorbed this way
    /// are noted on the record; when every probe fails the first failure is
    /// returned instead.
    async fn gather(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError>;

    /// Maps evidence onto CDNs. Pure; never touches the network.
    fn interpret(&self, evidence: &[String], catalog: &Catalog) -> Result<Vec<CdnMatch>, ProbeError> {
        Ok(catalog.match_all(evidence))
    }

    /// `gather`, then `interpret` if gathering succeeded. Matches are added to
    /// the record as they are found and the failure, if any, is noted on it.
    async fn run(
        &self,
        record: &mut DomainRecord,
        budget: &ProbeBudget,
        catalog: &Catalog,
    ) -> AnalyzerReport {
        let kind = self.kind();
        let outcome = match self.gather(record, budget).await {
            Ok(evidence) => self.interpret(&evidence, catalog),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(cdns) => {
                for found in &cdns {
                    record.add_cdn(found);
                }
                AnalyzerReport {
                    kind,
                    cdns,
                    status: Ok(()),
                }
            }
            Err(e) => {
                record.note_error(kind, &e);
                AnalyzerReport {
                    kind,
                    cdns: Vec::new(),
                    status: Err(e),
                }
            }
        }
    }
}

/// Collapses the outcomes of an analyzer's sub-probes into one result.
///
/// Succeeds with the merged evidence if any probe succeeded, noting the
/// failures it absorbs on the record. Otherwise returns the first failure and
/// notes the rest.
pub(crate) fn settle(
    record: &mut DomainRecord,
    kind: CheckKind,
    outcomes: Vec<Result<Vec<String>, ProbeError>>,
) -> Result<Vec<String>, ProbeError> {
    let any_ok = outcomes.iter().any(Result::is_ok);
    let mut evidence = Vec::new();
    let mut first_err = None;

    for outcome in outcomes {
        match outcome {
            Ok(found) => evidence.extend(found),
            Err(e) if !any_ok && first_err.is_none() => first_err = Some(e),
            Err(e) => record.note_error(kind, &e),
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(evidence),
    }
}

/// The analyzers of a scan, ordered by priority.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the five network analyzers sharing one resolver and one
    /// HTTP client.
    pub fn network(config: &ScanConfig) -> anyhow::Result<Self> {
        let budget = ProbeBudget::new(config.timeout);
        let dns: Arc<dyn DnsLookup> = Arc::new(HickoryDns::new(budget.per_probe()));
        let web: Arc<dyn WebClient> = Arc::new(ReqwestClient::new(&config.user_agent)?);

        Ok(Self::new()
            .with(IpAnalyzer::new(dns.clone()))
            .with(CnameAnalyzer::new(dns.clone()))
            .with(HttpAnalyzer::new(web.clone()))
            .with(WhoisAnalyzer::new(dns.clone(), web))
            .with(NameserverAnalyzer::new(dns)))
    }

    pub fn with(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.register(Arc::new(analyzer));
        self
    }

    /// Adds an analyzer, keeping the list ordered. Analyzers of equal
    /// priority keep their registration order.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        let at = self
            .analyzers
            .partition_point(|a| a.priority() <= analyzer.priority());
        self.analyzers.insert(at, analyzer);
    }

    pub fn get(&self, kind: CheckKind) -> Option<&Arc<dyn Analyzer>> {
        self.analyzers.iter().find(|a| a.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.analyzers.iter()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.analyzers.iter().map(|a| a.kind()))
            .finish()
    }
}

/// `domain` followed by its `www.` variant, unless it already is one.
pub(crate) fn probe_names(domain: &str) -> Vec<String> {
    if domain.starts_with("www.") {
        vec![domain.to_string()]
    } else {
        vec![domain.to_string(), format!("www.{domain}")]
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
