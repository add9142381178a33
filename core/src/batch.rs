//! # Batch analysis service
//!
//! The entry point front-ends use. Builds one [`DomainRecord`] per domain,
//! drives the [`Scheduler`] and returns the records with the job tally.
//! Formatting and output are left to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cdnmap_common::catalog::Catalog;
use cdnmap_common::config::ScanConfig;
use cdnmap_common::info;
use cdnmap_common::record::DomainRecord;
use tokio::sync::watch;

use crate::analyzer::{AnalyzerRegistry, ProbeBudget};
use crate::pipeline::Pipeline;
use crate::scheduler::{JobTally, ProgressFn, Scheduler};

/// Optional observers of a running batch.
#[derive(Default)]
pub struct BatchHooks {
    /// Called with the number of finished jobs after each job.
    pub on_progress: Option<ProgressFn>,
    /// Flipping the value to `true` abandons the jobs still pending.
    pub stop: Option<watch::Receiver<bool>>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One record per input domain, in input order.
    pub records: Vec<DomainRecord>,
    pub tally: JobTally,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn completed(&self) -> usize {
        self.tally.completed
    }

    pub fn frontable(&self) -> impl Iterator<Item = &DomainRecord> {
        self.records.iter().filter(|r| r.is_frontable())
    }
}

pub struct AnalysisService {
    catalog: Arc<Catalog>,
    registry: AnalyzerRegistry,
}

impl AnalysisService {
    pub fn new(catalog: Arc<Catalog>, registry: AnalyzerRegistry) -> Self {
        Self { catalog, registry }
    }

    /// Service backed by the live DNS and HTTP analyzers.
    pub fn network(catalog: Arc<Catalog>, config: &ScanConfig) -> anyhow::Result<Self> {
        Ok(Self::new(catalog, AnalyzerRegistry::network(config)?))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Analyzes every domain of `domains` (already validated) under `config`.
    pub async fn analyze_batch(
        &self,
        domains: &[String],
        config: &ScanConfig,
        hooks: BatchHooks,
    ) -> BatchOutcome {
        let started = Instant::now();
        if domains.is_empty() {
            return BatchOutcome::default();
        }

        let records: Vec<DomainRecord> = domains.iter().map(DomainRecord::new).collect();
        let pipeline = Pipeline::new(
            self.registry.clone(),
            self.catalog.clone(),
            config.checks,
            ProbeBudget::new(config.timeout),
        );
        let workers = config.effective_workers();
        let scheduler = Scheduler::new(pipeline, workers, config.double);

        info!(
            "Analyzing {} domains with {workers} workers (checks: {}, timeout: {:?}{})",
            domains.len(),
            config.checks,
            config.timeout,
            if config.double { ", double pass" } else { "" }
        );

        let (mut records, tally) = scheduler.run(records, hooks.on_progress, hooks.stop).await;

        // dropped and abandoned jobs may have left a record mid-pipeline
        for record in &mut records {
            record.finalize();
        }

        BatchOutcome {
            records,
            tally,
            elapsed: started.elapsed(),
        }
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

    use async_trait::async_trait;
    use cdnmap_common::config::CheckKind;
    use cdnmap_common::error::ProbeError;
    use cdnmap_common::record::EvidenceKind;

    use crate::analyzer::Analyzer;

    /// CNAMEs every `*.cdn.test` domain onto CloudFront.
    struct Edge;

    #[async_trait]
    impl Analyzer for Edge {
        fn kind(&self) -> CheckKind {
            CheckKind::Cname
        }

        async fn gather(
            &self,
            record: &mut DomainRecord,
            _: &ProbeBudget,
        ) -> Result<Vec<String>, ProbeError> {
            if !record.name().ends_with(".cdn.test") {
                return Err(ProbeError::NoAnswer(record.name().to_string()));
            }
            let target = format!("{}.cloudfront.net", record.name().replace('.', "-"));
            record.add_evidence(EvidenceKind::Cname, target.clone());
            Ok(vec![target])
        }
    }

    fn service() -> AnalysisService {
        let catalog = Catalog::builder().signature("cloudfront.net", "Cloudfront").build();
        AnalysisService::new(Arc::new(catalog), AnalyzerRegistry::new().with(Edge))
    }

    #[tokio::test]
    async fn returns_one_record_per_domain() {
        let domains: Vec<String> = ["a.cdn.test", "b.plain.test", "c.cdn.test"]
            .into_iter()
            .map(String::from)
            .collect();
        let config = ScanConfig::default().with_workers(2);

        let outcome = service().analyze_batch(&domains, &config, BatchHooks::default()).await;

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.completed(), 3);
        let names: Vec<&str> = outcome.frontable().map(|r| r.name()).collect();
        assert_eq!(names, ["a.cdn.test", "c.cdn.test"]);
        assert_eq!(outcome.records[0].cdns(), ["Cloudfront".to_string()]);
        assert!(outcome.records[1].errors().iter().any(|e| e.check == CheckKind::Cname));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let outcome = service()
            .analyze_batch(&[], &ScanConfig::default(), BatchHooks::default())
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.tally, JobTally::default());
    }
}
