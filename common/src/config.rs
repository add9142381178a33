use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Ubuntu Chromium/37.0.2062.94 Chrome/37.0.2062.94 Safari/537.36";

/// One kind of evidence probe. Each kind is selected on the command line by a
/// single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Ip,
    Cname,
    Http,
    Whois,
    Nameserver,
}

impl CheckKind {
    pub const ALL: [CheckKind; 5] = [
        CheckKind::Ip,
        CheckKind::Cname,
        CheckKind::Http,
        CheckKind::Whois,
        CheckKind::Nameserver,
    ];

    pub fn letter(self) -> char {
        match self {
            CheckKind::Ip => 'i',
            CheckKind::Cname => 'c',
            CheckKind::Http => 'h',
            CheckKind::Whois => 'w',
            CheckKind::Nameserver => 'n',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Ip => "ip",
            CheckKind::Cname => "cname",
            CheckKind::Http => "http",
            CheckKind::Whois => "whois",
            CheckKind::Nameserver => "nameserver",
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.letter() == c.to_ascii_lowercase())
    }

    fn from_name(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == lower)
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of enabled checks, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckSet(u8);

impl CheckSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        CheckKind::ALL.into_iter().collect()
    }

    pub fn with(mut self, kind: CheckKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn insert(&mut self, kind: CheckKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: CheckKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = CheckKind> + '_ {
        CheckKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

impl FromIterator<CheckKind> for CheckSet {
    fn from_iter<T: IntoIterator<Item = CheckKind>>(iter: T) -> Self {
        let mut set = CheckSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl FromStr for CheckSet {
    type Err = String;

    /// Parses either a letter string (`"chw"`) or a comma separated list of
    /// names (`"cname,http,whois"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("at least one check must be selected".to_string());
        }

        if s.contains(',') || CheckKind::from_name(s).is_some() {
            return s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    CheckKind::from_name(part).ok_or_else(|| format!("unknown check: {part}"))
                })
                .collect();
        }

        s.chars()
            .map(|c| CheckKind::from_letter(c).ok_or_else(|| format!("unknown check letter: {c}")))
            .collect()
    }
}

impl fmt::Display for CheckSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in self.iter() {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Knobs consumed by the analysis engine.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub checks: CheckSet,
    /// `0` means "use the host's available parallelism".
    pub workers: usize,
    /// Per-domain budget. Also the deadline of every job.
    pub timeout: Duration,
    pub user_agent: String,
    /// Submit every domain twice to counter edge cache misses.
    pub double: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            checks: CheckSet::empty()
                .with(CheckKind::Cname)
                .with(CheckKind::Http)
                .with(CheckKind::Whois),
            workers: 0,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            double: false,
        }
    }
}

impl ScanConfig {
    pub fn with_checks(mut self, checks: CheckSet) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_double(mut self, double: bool) -> Self {
        self.double = double;
        self
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
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
