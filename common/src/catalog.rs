//! The CDN signature catalog.
//!
//! A [`Catalog`] maps free-form evidence (CNAME targets, HTTP header values,
//! WHOIS organisation names, nameserver hostnames) and IP addresses onto CDN
//! providers. It is immutable once built and meant to be shared behind an
//! [`Arc`] by every worker.
//!
//! Matching an evidence string consults three tables in order:
//!
//! 1. the signature table: hostname fragments (or `re:`-prefixed regular
//!    expressions) keyed to a CDN name,
//! 2. the name table: the CDN names themselves, searched case-insensitively,
//! 3. the common table: short needles for the highest-traffic providers.
//!
//! Every table yields the CDN's canonical name as the match id.

mod builtin;

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use ipnetwork::IpNetwork;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REGEX_PREFIX: &str = "re:";

/// Placeholder id for a response that carries cache headers from a provider
/// the catalog does not know. Never matched as evidence itself.
pub const UNRECOGNIZED_CDN: &str = "CDN_NOT_RECOGNIZED";

static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();

/// A single catalog hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CdnMatch {
    /// Canonical CDN identifier, e.g. `Cloudfront`.
    pub id: String,
    /// Human-readable description.
    pub name: String,
}

impl CdnMatch {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid signature pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid network '{cidr}' for {cdn}: {source}")]
    InvalidNetwork {
        cdn: String,
        cidr: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    #[error("catalog file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog defines no signatures")]
    Empty,
}

#[derive(Debug, Clone)]
enum Pattern {
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    fn parse(raw: &str) -> Result<Self, CatalogError> {
        match raw.strip_prefix(REGEX_PREFIX) {
            Some(expr) => RegexBuilder::new(expr)
                .case_insensitive(true)
                .build()
                .map(Pattern::Regex)
                .map_err(|source| CatalogError::InvalidPattern {
                    pattern: raw.to_string(),
                    source,
                }),
            None => Ok(Pattern::Substring(normalize(raw))),
        }
    }

    fn is_match(&self, normalized: &str) -> bool {
        match self {
            Pattern::Substring(needle) => !needle.is_empty() && normalized.contains(needle),
            Pattern::Regex(re) => re.is_match(normalized),
        }
    }
}

#[derive(Debug, Clone)]
struct Signature {
    pattern: Pattern,
    cdn: String,
}

#[derive(Debug, Clone)]
struct CommonEntry {
    needle: String,
    cdn: String,
    display: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    signatures: Vec<Signature>,
    /// CDN names, lowercased and as written, in signature order.
    by_name: Vec<(String, String)>,
    common: Vec<CommonEntry>,
    ip_ranges: Vec<(String, Vec<IpNetwork>)>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The built-in catalog, constructed on first use.
    pub fn builtin() -> Arc<Catalog> {
        BUILTIN
            .get_or_init(|| {
                let catalog = builtin_catalog().expect("built-in catalog tables are malformed");
                Arc::new(catalog)
            })
            .clone()
    }

    /// Parses a catalog from its JSON representation:
    ///
    /// ```json
    /// {
    ///   "signatures": [{ "pattern": ".cloudfront.net", "cdn": "Cloudfront" }],
    ///   "common": [{ "needle": "Cloudfront", "cdn": "Cloudfront", "display": "..." }],
    ///   "ip_ranges": { "Cloudflare": ["104.16.0.0/13"] }
    /// }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Catalog, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        if doc.signatures.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut builder = Catalog::builder();
        for sig in doc.signatures {
            builder = builder.try_signature(&sig.pattern, &sig.cdn)?;
        }
        for entry in doc.common {
            builder = builder.common(&entry.needle, &entry.cdn, &entry.display);
        }
        for (cdn, cidrs) in doc.ip_ranges {
            for cidr in cidrs {
                builder = builder.ip_range(&cdn, &cidr)?;
            }
        }
        Ok(builder.build())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Display name for a canonical CDN id.
    pub fn display_name(&self, cdn: &str) -> String {
        self.common
            .iter()
            .find(|e| e.cdn == cdn)
            .map(|e| e.display.clone())
            .unwrap_or_else(|| cdn.to_string())
    }

    /// Matches one evidence string against every table. Results are ordered
    /// by table, then by table order, and never repeat an id.
    pub fn match_evidence(&self, evidence: &str) -> Vec<CdnMatch> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect(evidence, &mut out, &mut seen);
        out
    }

    /// Matches several evidence strings, deduplicating across all of them.
    pub fn match_all<I, S>(&self, evidence: I) -> Vec<CdnMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for item in evidence {
            self.collect(item.as_ref(), &mut out, &mut seen);
        }
        out
    }

    /// CDNs whose published ranges contain `ip`.
    pub fn match_ip(&self, ip: IpAddr) -> Vec<CdnMatch> {
        self.ip_ranges
            .iter()
            .filter(|(_, nets)| nets.iter().any(|net| net.contains(ip)))
            .map(|(cdn, _)| CdnMatch::new(cdn.clone(), self.display_name(cdn)))
            .collect()
    }

    fn collect(&self, evidence: &str, out: &mut Vec<CdnMatch>, seen: &mut HashSet<String>) {
        let normalized = normalize(evidence);
        if normalized.is_empty() || evidence == UNRECOGNIZED_CDN {
            return;
        }
        let lowered = evidence.to_lowercase();

        let mut push = |cdn: &str, display: String| {
            if seen.insert(cdn.to_string()) {
                out.push(CdnMatch::new(cdn, display));
            }
        };

        for sig in &self.signatures {
            if sig.pattern.is_match(&normalized) {
                push(&sig.cdn, self.display_name(&sig.cdn));
            }
        }

        for (lower, cdn) in &self.by_name {
            if lowered.contains(lower.as_str()) {
                push(cdn, self.display_name(cdn));
            }
        }

        for entry in &self.common {
            if normalized.contains(entry.needle.as_str()) {
                push(&entry.cdn, entry.display.clone());
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    signatures: Vec<Signature>,
    common: Vec<CommonEntry>,
    ip_ranges: Vec<(String, Vec<IpNetwork>)>,
}

impl CatalogBuilder {
    /// Adds a plain substring signature.
    pub fn signature(mut self, pattern: &str, cdn: &str) -> Self {
        self.signatures.push(Signature {
            pattern: Pattern::Substring(normalize(pattern)),
            cdn: cdn.to_string(),
        });
        self
    }

    /// Adds a signature that may carry the `re:` prefix.
    pub fn try_signature(mut self, pattern: &str, cdn: &str) -> Result<Self, CatalogError> {
        self.signatures.push(Signature {
            pattern: Pattern::parse(pattern)?,
            cdn: cdn.to_string(),
        });
        Ok(self)
    }

    pub fn common(mut self, needle: &str, cdn: &str, display: &str) -> Self {
        self.common.push(CommonEntry {
            needle: normalize(needle),
            cdn: cdn.to_string(),
            display: display.to_string(),
        });
        self
    }

    pub fn ip_range(mut self, cdn: &str, cidr: &str) -> Result<Self, CatalogError> {
        let net: IpNetwork = cidr.parse().map_err(|source| CatalogError::InvalidNetwork {
            cdn: cdn.to_string(),
            cidr: cidr.to_string(),
            source,
        })?;
        match self.ip_ranges.iter_mut().find(|(name, _)| name == cdn) {
            Some((_, nets)) => nets.push(net),
            None => self.ip_ranges.push((cdn.to_string(), vec![net])),
        }
        Ok(self)
    }

    pub fn build(self) -> Catalog {
        let mut by_name: Vec<(String, String)> = Vec::new();
        for sig in &self.signatures {
            if !by_name.iter().any(|(_, cdn)| *cdn == sig.cdn) {
                by_name.push((sig.cdn.to_lowercase(), sig.cdn.clone()));
            }
        }

        Catalog {
            signatures: self.signatures,
            by_name,
            common: self.common,
            ip_ranges: self.ip_ranges,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    signatures: Vec<SignatureDoc>,
    #[serde(default)]
    common: Vec<CommonDoc>,
    #[serde(default)]
    ip_ranges: std::collections::BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SignatureDoc {
    pattern: String,
    cdn: String,
}

#[derive(Debug, Deserialize)]
struct CommonDoc {
    needle: String,
    cdn: String,
    display: String,
}

fn builtin_catalog() -> Result<Catalog, CatalogError> {
    let mut builder = builtin::SIGNATURES
        .iter()
        .fold(Catalog::builder(), |b, (pattern, cdn)| b.signature(pattern, cdn));

    for (needle, cdn, display) in builtin::COMMON {
        builder = builder.common(needle, cdn, display);
    }
    for (cdn, cidrs) in builtin::IP_RANGES {
        for cidr in cidrs.iter() {
            builder = builder.ip_range(cdn, cidr)?;
        }
    }
    Ok(builder.build())
}

/// Lowercases and strips all whitespace.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
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

    fn ids(matches: &[CdnMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn cloudfront_cname_maps_to_cloudfront() {
        let catalog = Catalog::builtin();
        let hits = catalog.match_evidence("d111111abcdef8.cloudfront.net");
        assert_eq!(ids(&hits), ["Cloudfront"]);
        assert!(hits[0].name.contains("aws.amazon.com/cloudfront"));
    }

    #[test]
    fn common_table_normalizes_case_and_spaces() {
        let catalog = Catalog::builder().common("Cloudflare", "Cloudflare", "CF").build();
        let hits = catalog.match_evidence("  CLOUD flare ");
        assert_eq!(hits, vec![CdnMatch::new("Cloudflare", "CF")]);
    }

    #[test]
    fn name_table_matches_header_values() {
        let catalog = Catalog::builtin();
        let hits = catalog.match_evidence("cloudflare");
        assert_eq!(ids(&hits), ["Cloudflare"]);
    }

    #[test]
    fn single_evidence_never_repeats_an_id() {
        let catalog = Catalog::builder()
            .signature(".akamai.net", "Akamai")
            .signature(".akamaiedge.net", "Akamai")
            .common("Akamai", "Akamai", "Akamai - https://akamai.com")
            .build();
        let hits = catalog.match_evidence("e1.a.akamaiedge.net");
        assert_eq!(ids(&hits), ["Akamai"]);
    }

    #[test]
    fn empty_and_unknown_evidence_yield_nothing() {
        let catalog = Catalog::builtin();
        assert!(catalog.match_evidence("").is_empty());
        assert!(catalog.match_evidence("   ").is_empty());
        assert!(catalog.match_evidence("nginx/1.25.3").is_empty());
    }

    #[test]
    fn regex_signatures_are_case_insensitive() {
        let catalog = Catalog::builder()
            .try_signature(r"re:^edge-\d+\.example\.net$", "ExampleCDN")
            .expect("valid regex")
            .build();
        assert_eq!(ids(&catalog.match_evidence("EDGE-42.example.net")), ["ExampleCDN"]);
        assert!(catalog.match_evidence("edge-x.example.net").is_empty());
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = Catalog::builder().try_signature("re:(", "Broken").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }

    #[test]
    fn match_all_dedups_across_inputs() {
        let catalog = Catalog::builtin();
        let hits = catalog.match_all(["a.cloudfront.net", "b.cloudfront.net", "x.fastly.net"]);
        assert_eq!(ids(&hits), ["Cloudfront", "Fastly"]);
    }

    #[test]
    fn ip_ranges_match_published_networks() {
        let catalog = Catalog::builtin();
        let cf: IpAddr = "104.16.1.1".parse().unwrap();
        let fastly: IpAddr = "151.101.1.69".parse().unwrap();
        let other: IpAddr = "93.184.216.34".parse().unwrap();

        assert_eq!(ids(&catalog.match_ip(cf)), ["Cloudflare"]);
        assert_eq!(ids(&catalog.match_ip(fastly)), ["Fastly"]);
        assert!(catalog.match_ip(other).is_empty());
    }

    #[test]
    fn unrecognized_marker_is_not_evidence() {
        let catalog = Catalog::builder()
            .signature("not_recog", "Greedy")
            .signature(".cdn", "Cdn")
            .build();
        assert!(catalog.match_evidence(UNRECOGNIZED_CDN).is_empty());
        assert_eq!(ids(&catalog.match_evidence("edge.cdn.example")), ["Cdn"]);
    }

    #[test]
    fn json_catalog_round_trips_into_matches() {
        let json = r#"{
            "signatures": [
                { "pattern": ".edge.example", "cdn": "ExampleCDN" },
                { "pattern": "re:^cache\\d+\\.", "cdn": "CacheCo" }
            ],
            "common": [
                { "needle": "ExampleCDN", "cdn": "ExampleCDN", "display": "Example CDN" }
            ],
            "ip_ranges": { "ExampleCDN": ["198.51.100.0/24"] }
        }"#;
        let catalog = Catalog::from_json_str(json).expect("valid catalog");

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.match_evidence("a.edge.example"),
            vec![CdnMatch::new("ExampleCDN", "Example CDN")]
        );
        assert_eq!(ids(&catalog.match_evidence("cache7.foo.net")), ["CacheCo"]);
        assert_eq!(
            ids(&catalog.match_ip("198.51.100.7".parse().unwrap())),
            ["ExampleCDN"]
        );
    }

    #[test]
    fn json_catalog_errors() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
        assert!(matches!(
            Catalog::from_json_str(r#"{"signatures": []}"#),
            Err(CatalogError::Empty)
        ));
        let bad_net = r#"{"signatures":[{"pattern":"x","cdn":"X"}],"ip_ranges":{"X":["nope"]}}"#;
        assert!(matches!(
            Catalog::from_json_str(bad_net),
            Err(CatalogError::InvalidNetwork { .. })
        ));
    }
}
