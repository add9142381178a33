use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use cdnmap_common::debug;
use cdnmap_common::error::ProbeError;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType};
use tokio::time::timeout;

/// The DNS queries the analyzers need. Every call is bounded by `limit`.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup_ips(&self, name: &str, limit: Duration) -> Result<Vec<IpAddr>, ProbeError>;
    async fn lookup_cnames(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError>;
    async fn lookup_ns(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError>;
    async fn lookup_txt(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError>;
}

/// [`DnsLookup`] backed by the system resolver configuration.
#[derive(Clone)]
pub struct HickoryDns {
    resolver: TokioAsyncResolver,
}

impl HickoryDns {
    /// Builds a resolver from `/etc/resolv.conf` (or the platform equivalent),
    /// falling back to the library defaults when it cannot be read.
    pub fn new(per_query: Duration) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|e| {
                debug!("System resolver config unavailable ({e}), using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            });
        opts.timeout = per_query;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    async fn records(
        &self,
        name: &str,
        kind: RecordType,
        limit: Duration,
    ) -> Result<Vec<RData>, ProbeError> {
        let lookup = match timeout(limit, self.resolver.lookup(name, kind)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(map_resolve_error(name, &e)),
            Err(_elapsed) => return Err(ProbeError::Timeout),
        };
        let records: Vec<RData> = lookup.iter().cloned().collect();
        if records.is_empty() {
            return Err(ProbeError::NoAnswer(name.to_string()));
        }
        Ok(records)
    }
}

#[async_trait]
impl DnsLookup for HickoryDns {
    async fn lookup_ips(&self, name: &str, limit: Duration) -> Result<Vec<IpAddr>, ProbeError> {
        let lookup = match timeout(limit, self.resolver.lookup_ip(name)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(map_resolve_error(name, &e)),
            Err(_elapsed) => return Err(ProbeError::Timeout),
        };
        let ips: Vec<IpAddr> = lookup.iter().collect();
        if ips.is_empty() {
            return Err(ProbeError::NoAnswer(name.to_string()));
        }
        Ok(ips)
    }

    async fn lookup_cnames(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError> {
        let records = self.records(name, RecordType::CNAME, limit).await?;
        let cnames: Vec<String> = records
            .iter()
            .filter_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(strip_root(&cname.to_utf8())),
                _ => None,
            })
            .collect();
        non_empty(name, cnames)
    }

    async fn lookup_ns(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError> {
        let records = self.records(name, RecordType::NS, limit).await?;
        let servers: Vec<String> = records
            .iter()
            .filter_map(|rdata| match rdata {
                RData::NS(ns) => Some(strip_root(&ns.to_utf8())),
                _ => None,
            })
            .collect();
        non_empty(name, servers)
    }

    async fn lookup_txt(&self, name: &str, limit: Duration) -> Result<Vec<String>, ProbeError> {
        let records = self.records(name, RecordType::TXT, limit).await?;
        let texts: Vec<String> = records
            .iter()
            .filter_map(|rdata| match rdata {
                RData::TXT(txt) => Some(
                    txt.txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part).into_owned())
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect();
        non_empty(name, texts)
    }
}

/// Maps resolver failures onto the probe status taxonomy.
pub fn map_resolve_error(name: &str, err: &ResolveError) -> ProbeError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => ProbeError::NxDomain(name.to_string()),
            _ => ProbeError::NoAnswer(name.to_string()),
        },
        ResolveErrorKind::NoConnections => ProbeError::NoNameservers(name.to_string()),
        ResolveErrorKind::Timeout => ProbeError::Timeout,
        _ => ProbeError::Lookup(err.to_string()),
    }
}

fn strip_root(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn non_empty(name: &str, values: Vec<String>) -> Result<Vec<String>, ProbeError> {
    if values.is_empty() {
        Err(ProbeError::NoAnswer(name.to_string()))
    } else {
        Ok(values)
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
