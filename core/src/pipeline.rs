//! # Per-domain pipeline
//!
//! Runs the analyzers of one domain strictly in sequence:
//!
//! 1. **Resolve**: the IP analyzer always runs first. A nonexistent domain
//!    ends the pipeline immediately.
//! 2. **Probe**: every enabled analyzer runs in priority order until one of
//!    them identifies a CDN.
//! 3. **Digest**: all accumulated evidence is matched once more and the
//!    record's `frontable` flag is derived.
//!
//! A panic inside an analyzer is caught here and turned into a [`JobError`];
//! it never reaches the scheduler.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cdnmap_common::catalog::{Catalog, CdnMatch};
use cdnmap_common::config::{CheckKind, CheckSet};
use cdnmap_common::record::{DomainRecord, EvidenceKind};
use cdnmap_common::{debug, error};
use futures::FutureExt;
use thiserror::Error;

use crate::analyzer::{Analyzer, AnalyzerRegistry, AnalyzerReport, ProbeBudget};

/// Why a job did not finish normally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("analyzer panicked: {0}")]
    Panicked(String),
}

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// An analyzer found a CDN; later analyzers were skipped.
    Matched { by: CheckKind },
    /// Every enabled analyzer ran without identifying a CDN.
    Exhausted,
    /// The domain does not exist.
    Nonexistent,
}

pub struct Pipeline {
    registry: AnalyzerRegistry,
    catalog: Arc<Catalog>,
    checks: CheckSet,
    budget: ProbeBudget,
}

impl Pipeline {
    pub fn new(
        registry: AnalyzerRegistry,
        catalog: Arc<Catalog>,
        checks: CheckSet,
        budget: ProbeBudget,
    ) -> Self {
        Self {
            registry,
            catalog,
            checks,
            budget,
        }
    }

    pub fn budget(&self) -> ProbeBudget {
        self.budget
    }

    /// Runs the pipeline against `record`. The record is finalized whatever
    /// happens, including when an analyzer panics.
    pub async fn execute(&self, record: &mut DomainRecord) -> Result<PipelineStatus, JobError> {
        let outcome = AssertUnwindSafe(self.drive(record)).catch_unwind().await;
        match outcome {
            Ok(status) => Ok(status),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!("Analysis of {} aborted: {reason}", record.name());
                record.finalize();
                Err(JobError::Panicked(reason))
            }
        }
    }

    async fn drive(&self, record: &mut DomainRecord) -> PipelineStatus {
        if let Some(ip) = self.registry.get(CheckKind::Ip) {
            let report = if self.checks.contains(CheckKind::Ip) {
                ip.run(record, &self.budget, &self.catalog).await
            } else {
                resolve_only(ip.as_ref(), record, &self.budget).await
            };

            if report.is_fatal() {
                debug!("{} does not exist", record.name());
                record.finalize();
                return PipelineStatus::Nonexistent;
            }
            if report.found_cdn() {
                return self.matched(record, CheckKind::Ip);
            }
        }

        let enabled = self
            .registry
            .iter()
            .filter(|a| a.kind() != CheckKind::Ip && self.checks.contains(a.kind()));

        for analyzer in enabled {
            let report = analyzer.run(record, &self.budget, &self.catalog).await;
            if report.is_fatal() {
                record.finalize();
                return PipelineStatus::Nonexistent;
            }
            if report.found_cdn() {
                return self.matched(record, analyzer.kind());
            }
        }

        self.digest(record);
        PipelineStatus::Exhausted
    }

    fn matched(&self, record: &mut DomainRecord, by: CheckKind) -> PipelineStatus {
        self.digest(record);
        debug!("{}: {} via {by}", record.name(), record.cdns().join(", "));
        PipelineStatus::Matched { by }
    }

    /// Matches every non-empty evidence list (and, when the IP check is
    /// enabled, the resolved addresses) and derives `frontable`.
    pub fn digest(&self, record: &mut DomainRecord) {
        let mut found: Vec<CdnMatch> = Vec::new();
        for kind in EvidenceKind::ALL {
            let evidence = record.evidence(kind);
            if !evidence.is_empty() {
                found.extend(self.catalog.match_all(evidence));
            }
        }
        if self.checks.contains(CheckKind::Ip) {
            for ip in record.ips() {
                found.extend(self.catalog.match_ip(*ip));
            }
        }

        for hit in &found {
            record.add_cdn(hit);
        }
        record.finalize();
    }
}

/// Runs an analyzer for its side effects on the record only; its matches are
/// discarded.
async fn resolve_only(
    analyzer: &dyn Analyzer,
    record: &mut DomainRecord,
    budget: &ProbeBudget,
) -> AnalyzerReport {
    let kind = analyzer.kind();
    let status = match analyzer.gather(record, budget).await {
        Ok(_) => Ok(()),
        Err(e) => {
            record.note_error(kind, &e);
            Err(e)
        }
    };
    AnalyzerReport {
        kind,
        cdns: Vec::new(),
        status,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
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
