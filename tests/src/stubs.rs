//! Deterministic analyzers standing in for the network ones.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cdnmap_common::catalog::Catalog;
use cdnmap_common::config::{CheckKind, CheckSet, ScanConfig};
use cdnmap_common::error::ProbeError;
use cdnmap_common::record::{DomainRecord, EvidenceKind};
use cdnmap_core::{AnalysisService, Analyzer, AnalyzerRegistry, ProbeBudget};

/// What a stub does for one call.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Records these strings as evidence and returns them.
    Evidence(Vec<String>),
    Fail(ProbeError),
    /// Sleeps, then returns no evidence.
    Sleep(Duration),
    Panic,
}

impl Behavior {
    pub fn evidence(values: &[&str]) -> Self {
        Behavior::Evidence(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn empty() -> Self {
        Behavior::Evidence(Vec::new())
    }
}

/// Per-domain invocation counter shared between a stub and the test.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<HashMap<String, usize>>,
}

impl CallLog {
    /// Records a call and returns how many calls came before it.
    fn record(&self, domain: &str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(domain.to_string()).or_insert(0);
        *count += 1;
        *count - 1
    }

    pub fn count(&self, domain: &str) -> usize {
        self.calls.lock().unwrap().get(domain).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

/// An analyzer of any kind whose behavior is scripted per domain and per
/// pass. The n-th call for a domain uses the n-th scripted behavior, the
/// last one repeating; unscripted domains use the fallback.
pub struct StubAnalyzer {
    kind: CheckKind,
    fallback: Behavior,
    script: HashMap<String, Vec<Behavior>>,
    calls: Arc<CallLog>,
}

impl StubAnalyzer {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            fallback: Behavior::empty(),
            script: HashMap::new(),
            calls: Arc::new(CallLog::default()),
        }
    }

    pub fn otherwise(mut self, behavior: Behavior) -> Self {
        self.fallback = behavior;
        self
    }

    /// Appends the behavior of the next pass over `domain`.
    pub fn on(mut self, domain: &str, behavior: Behavior) -> Self {
        self.script.entry(domain.to_string()).or_default().push(behavior);
        self
    }

    pub fn calls(&self) -> Arc<CallLog> {
        self.calls.clone()
    }

    fn behavior_for(&self, domain: &str, pass: usize) -> Behavior {
        match self.script.get(domain) {
            Some(steps) if !steps.is_empty() => steps[pass.min(steps.len() - 1)].clone(),
            _ => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn gather(
        &self,
        record: &mut DomainRecord,
        _: &ProbeBudget,
    ) -> Result<Vec<String>, ProbeError> {
        let name = record.name().to_string();
        let pass = self.calls.record(&name);

        match self.behavior_for(&name, pass) {
            Behavior::Evidence(values) => {
                for value in &values {
                    store(record, self.kind, value);
                }
                Ok(values)
            }
            Behavior::Fail(e) => Err(e),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(Vec::new())
            }
            Behavior::Panic => panic!("stub fault while analyzing {name}"),
        }
    }
}

fn store(record: &mut DomainRecord, kind: CheckKind, value: &str) {
    let evidence = match kind {
        CheckKind::Ip => {
            if let Ok(ip) = value.parse::<IpAddr>() {
                record.add_ip(ip);
            }
            return;
        }
        CheckKind::Cname => EvidenceKind::Cname,
        CheckKind::Http => EvidenceKind::Header,
        CheckKind::Whois => EvidenceKind::WhoisOrg,
        CheckKind::Nameserver => EvidenceKind::Nameserver,
    };
    record.add_evidence(evidence, value);
}

/// The one-entry catalog `{"cloudfront.net": "Cloudfront"}`.
pub fn stub_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::builder()
            .signature("cloudfront.net", "Cloudfront")
            .build(),
    )
}

/// A service over `analyzers` and the stub catalog.
pub fn service(analyzers: Vec<StubAnalyzer>) -> AnalysisService {
    let mut registry = AnalyzerRegistry::new();
    for analyzer in analyzers {
        registry.register(Arc::new(analyzer));
    }
    AnalysisService::new(stub_catalog(), registry)
}

/// Every check enabled, `workers` workers and a per-domain `timeout`.
pub fn config(workers: usize, timeout: Duration) -> ScanConfig {
    ScanConfig::default()
        .with_checks(CheckSet::all())
        .with_workers(workers)
        .with_timeout(timeout)
}

pub fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// A full set of five stubs, all returning empty evidence, plus the IP stub
/// resolving every domain to a documentation address.
pub struct StubSet {
    pub ip: StubAnalyzer,
    pub cname: StubAnalyzer,
    pub http: StubAnalyzer,
    pub whois: StubAnalyzer,
    pub nameserver: StubAnalyzer,
}

impl Default for StubSet {
    fn default() -> Self {
        Self {
            ip: StubAnalyzer::new(CheckKind::Ip).otherwise(Behavior::evidence(&["192.0.2.1"])),
            cname: StubAnalyzer::new(CheckKind::Cname),
            http: StubAnalyzer::new(CheckKind::Http),
            whois: StubAnalyzer::new(CheckKind::Whois),
            nameserver: StubAnalyzer::new(CheckKind::Nameserver),
        }
    }
}

/// Call logs of a [`StubSet`], taken before the stubs move into a service.
pub struct StubCalls {
    pub ip: Arc<CallLog>,
    pub cname: Arc<CallLog>,
    pub http: Arc<CallLog>,
    pub whois: Arc<CallLog>,
    pub nameserver: Arc<CallLog>,
}

impl StubSet {
    pub fn into_service(self) -> (AnalysisService, StubCalls) {
        let calls = StubCalls {
            ip: self.ip.calls(),
            cname: self.cname.calls(),
            http: self.http.calls(),
            whois: self.whois.calls(),
            nameserver: self.nameserver.calls(),
        };
        let service = service(vec![
            self.nameserver,
            self.whois,
            self.http,
            self.cname,
            self.ip,
        ]);
        (service, calls)
    }
}
