use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cdnmap_common::catalog::Catalog;
use cdnmap_common::config::ScanConfig;
use cdnmap_common::record::DomainRecord;
use cdnmap_common::target::{self, DomainList};
use cdnmap_common::{info, success, warn};
use cdnmap_core::{AnalysisService, BatchHooks, BatchOutcome};
use colored::*;
use tokio::sync::watch;
use tracing::Instrument;

use crate::commands::ScanArgs;
use crate::error::CliError;
use crate::mprint;
use crate::report::{self, Report};
use crate::terminal::input::InputHandle;
use crate::terminal::progress::BatchProgress;
use crate::terminal::{colors, format, print};

/// Where the domains come from.
pub enum Input {
    File(PathBuf),
    List(Vec<String>),
}

pub async fn analyze(input: Input, opts: &ScanArgs) -> Result<(), CliError> {
    let started: Instant = Instant::now();

    if let Some(path) = &opts.output {
        if path.exists() {
            return Err(CliError::OutputExists(path.clone()));
        }
    }

    let domains: DomainList = load_domains(input)?;
    if domains.is_empty() {
        return Err(CliError::NoDomains);
    }
    if domains.valid.is_empty() {
        return Err(CliError::InvalidDomains(domains.invalid));
    }

    let catalog: Arc<Catalog> = load_catalog(opts.catalog.as_deref())?;
    let config: ScanConfig = opts.scan_config();
    let service = AnalysisService::network(catalog, &config).map_err(CliError::Setup)?;

    print::header("analyzing domains", opts.quiet);
    print_settings(&domains, &config, opts.quiet);

    let outcome: BatchOutcome = run_batch(&service, &domains.valid, &config, opts).await;

    render(&outcome, opts);

    let report = Report::new(
        &outcome,
        &domains.invalid,
        opts.all,
        opts.verbose,
        started.elapsed(),
    );
    let json = report.to_json().map_err(|e| CliError::OutputWrite {
        path: opts.output.clone().unwrap_or_default(),
        source: e.into(),
    })?;

    if opts.output.is_none() || opts.verbose {
        println!("{json}");
    }
    if let Some(path) = &opts.output {
        report::write_new(path, &json)?;
        success!("Report written to {}", path.display());
    }
    Ok(())
}

fn load_domains(input: Input) -> Result<DomainList, CliError> {
    match input {
        Input::List(args) => Ok(target::parse_args(args)),
        Input::File(path) => {
            let text = fs::read_to_string(&path)
                .map_err(|source| CliError::InputFile { path, source })?;
            Ok(target::parse_lines(&text))
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>, CliError> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };

    let text = fs::read_to_string(path).map_err(|source| CliError::CatalogFile {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = Catalog::from_json_str(&text).map_err(|source| CliError::Catalog {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded {} signatures from {}", catalog.len(), path.display());
    Ok(Arc::new(catalog))
}

async fn run_batch(
    service: &AnalysisService,
    domains: &[String],
    config: &ScanConfig,
    opts: &ScanArgs,
) -> BatchOutcome {
    let (stop_tx, stop_rx) = watch::channel(false);
    let listener: Option<InputHandle> = if opts.no_input {
        None
    } else {
        InputHandle::start(stop_tx)
    };

    let passes = if config.double { 2 } else { 1 };
    let progress = BatchProgress::new(domains.len() * passes, opts.quiet, listener.is_some());
    let hooks = BatchHooks {
        on_progress: Some(progress.callback()),
        stop: listener.as_ref().map(|_| stop_rx),
    };

    let outcome = service
        .analyze_batch(domains, config, hooks)
        .instrument(progress.span())
        .await;

    drop(listener);
    drop(progress);
    outcome
}

fn print_settings(domains: &DomainList, config: &ScanConfig, q_level: u8) {
    if q_level > 0 {
        return;
    }
    let rows: [(&str, String); 5] = [
        ("Domains", domains.valid.len().to_string()),
        ("Skipped", domains.invalid.len().to_string()),
        ("Checks", config.checks.to_string()),
        ("Workers", config.effective_workers().to_string()),
        ("Timeout", format!("{}s", config.timeout.as_secs())),
    ];
    let key_width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        print::aligned_line(key, value, key_width);
    }
}

fn render(outcome: &BatchOutcome, opts: &ScanArgs) {
    let shown: Vec<&DomainRecord> = outcome
        .records
        .iter()
        .filter(|record| opts.all || record.is_frontable())
        .collect();

    if shown.is_empty() {
        if opts.quiet == 0 {
            print::header("no cdn detected", opts.quiet);
            print::no_results();
        }
    } else if opts.quiet < 2 {
        print::header("results", opts.quiet);
        for (idx, record) in shown.iter().enumerate() {
            print::tree_head(idx, record.name());
            print::as_tree_one_level(format::record_details(record, opts.verbose));
            if idx + 1 != shown.len() {
                mprint!();
            }
        }
    }

    let tally = outcome.tally;
    if tally.dropped + tally.failed > 0 {
        warn!(
            "{} of {} jobs did not complete ({} dropped, {} failed)",
            tally.dropped + tally.failed,
            tally.submitted,
            tally.dropped,
            tally.failed
        );
    }

    print_summary(outcome.frontable().count(), outcome.records.len(), outcome.elapsed, opts.quiet);
}

fn print_summary(with_cdn: usize, total: usize, elapsed: Duration, q_level: u8) {
    let with_cdn: ColoredString = format!("{with_cdn}/{total} domains").bold().green();
    let elapsed: ColoredString = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
    let output: ColoredString =
        format!("Analysis Complete: {with_cdn} behind a CDN in {elapsed}").color(colors::TEXT_DEFAULT);

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => success!("{}", output),
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
