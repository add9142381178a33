//! JSON report of a finished batch.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use cdnmap_common::record::{DomainRecord, StatusEntry};
use cdnmap_core::{BatchOutcome, JobTally};
use chrono::Local;
use serde::Serialize;

use crate::error::CliError;

const DATE_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

#[derive(Debug, Serialize)]
pub struct Report {
    pub date: String,
    /// Seconds, from input parsing to the end of the batch.
    pub runtime: f64,
    pub total_analyzed: usize,
    pub count_with_cdn: usize,
    pub jobs: JobSummary,
    pub valid_domains: BTreeMap<String, DomainEntry>,
    pub invalid_domains: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct JobSummary {
    pub submitted: usize,
    pub completed: usize,
    pub dropped: usize,
    pub failed: usize,
}

impl From<JobTally> for JobSummary {
    fn from(tally: JobTally) -> Self {
        Self {
            submitted: tally.submitted,
            completed: tally.completed,
            dropped: tally.dropped,
            failed: tally.failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DomainEntry {
    pub cdns: Vec<String>,
    pub cdn_names: Vec<String>,
    pub ips: Vec<IpAddr>,
    pub frontable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

#[derive(Debug, Serialize)]
pub struct Evidence {
    pub cnames: Vec<String>,
    pub headers: Vec<String>,
    pub whois: Vec<String>,
    pub nameservers: Vec<String>,
    pub status: Vec<StatusEntry>,
}

impl DomainEntry {
    fn from_record(record: &DomainRecord, verbose: bool) -> Self {
        let evidence = verbose.then(|| Evidence {
            cnames: record.cnames().to_vec(),
            headers: record.headers().to_vec(),
            whois: record.whois_orgs().to_vec(),
            nameservers: record.nameservers().to_vec(),
            status: record.errors().to_vec(),
        });

        Self {
            cdns: record.cdns().to_vec(),
            cdn_names: record.cdn_names().to_vec(),
            ips: record.ips().iter().copied().collect(),
            frontable: record.is_frontable(),
            evidence,
        }
    }
}

impl Report {
    /// Builds the report. Only frontable domains are listed unless `all` is set.
    pub fn new(
        outcome: &BatchOutcome,
        invalid: &[String],
        all: bool,
        verbose: bool,
        runtime: Duration,
    ) -> Self {
        let valid_domains = outcome
            .records
            .iter()
            .filter(|record| all || record.is_frontable())
            .map(|record| {
                (
                    record.name().to_string(),
                    DomainEntry::from_record(record, verbose),
                )
            })
            .collect();

        Self {
            date: Local::now().format(DATE_FORMAT).to_string(),
            runtime: runtime.as_secs_f64(),
            total_analyzed: outcome.records.len(),
            count_with_cdn: outcome.frontable().count(),
            jobs: outcome.tally.into(),
            valid_domains,
            invalid_domains: invalid.to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes `contents` to `path`, refusing to replace an existing file.
pub fn write_new(path: &Path, contents: &str) -> Result<(), CliError> {
    let file = OpenOptions::new().write(true).create_new(true).open(path);
    let mut file = match file {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(CliError::OutputExists(path.to_path_buf()));
        }
        Err(source) => {
            return Err(CliError::OutputWrite {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    file.write_all(contents.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|source| CliError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
