//! # Domain input
//!
//! Turns user input into the validated domain list the engine consumes.
//!
//! Inputs come from two places:
//! * Command-line arguments, each of which may hold a comma-separated list.
//! * A text file with one domain per line (`#` starts a comment).
//!
//! Names are trimmed, lowercased and stripped of a trailing root dot. Anything
//! that fails syntax validation lands in [`DomainList::invalid`] instead of
//! aborting the whole parse.

use std::collections::HashSet;

use thiserror::Error;

use crate::warn;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("empty domain")]
    Empty,

    #[error("domain '{0}' exceeds 253 characters")]
    TooLong(String),

    #[error("domain '{0}' needs at least two labels")]
    SingleLabel(String),

    #[error("domain '{domain}' has an invalid label '{label}'")]
    InvalidLabel { domain: String, label: String },

    #[error("domain '{0}' has a numeric top-level label")]
    NumericTld(String),
}

/// Result of parsing a batch of user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainList {
    /// Normalized, unique, in input order.
    pub valid: Vec<String>,
    /// Raw entries that failed validation.
    pub invalid: Vec<String>,
}

impl DomainList {
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, raw: &str, seen: &mut HashSet<String>) {
        match normalize_domain(raw) {
            Ok(domain) => {
                if seen.insert(domain.clone()) {
                    self.valid.push(domain);
                }
            }
            Err(e) => {
                warn!("Skipping '{raw}': {e}");
                self.invalid.push(raw.trim().to_string());
            }
        }
    }
}

/// Validates and normalizes a single domain name.
pub fn normalize_domain(s: &str) -> Result<String, DomainError> {
    let domain = s.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return Err(DomainError::Empty);
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(DomainError::TooLong(domain));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(DomainError::SingleLabel(domain));
    }

    if let Some(bad) = labels.iter().find(|label| !is_valid_label(label)) {
        return Err(DomainError::InvalidLabel {
            label: bad.to_string(),
            domain: domain.clone(),
        });
    }

    let tld = labels[labels.len() - 1];
    if tld.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::NumericTld(domain));
    }

    Ok(domain)
}

/// Parses arguments, each of which may itself be a comma-separated list.
pub fn parse_args<I, S>(args: I) -> DomainList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut list = DomainList::default();
    let mut seen = HashSet::new();
    for arg in args {
        for part in arg.as_ref().split(',') {
            if part.trim().is_empty() {
                continue;
            }
            list.push(part, &mut seen);
        }
    }
    list
}

/// Parses file contents: one domain per line, blank lines and `#` comments ignored.
pub fn parse_lines(text: &str) -> DomainList {
    let mut list = DomainList::default();
    let mut seen = HashSet::new();
    for line in text.lines() {
        let entry = line.split('#').next().unwrap_or_default().trim();
        if entry.is_empty() {
            continue;
        }
        list.push(entry, &mut seen);
    }
    list
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
