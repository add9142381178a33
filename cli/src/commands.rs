pub mod analyze;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use cdnmap_common::config::{CheckSet, DEFAULT_USER_AGENT, ScanConfig};

#[derive(Parser)]
#[command(name = "cdnmap")]
#[command(version)]
#[command(about = "Find out which CDN serves a domain and whether it can be fronted.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub options: ScanArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the domains listed in a file, one per line
    #[command(alias = "f")]
    File { path: PathBuf },
    /// Analyze domains given on the command line
    #[command(alias = "l")]
    List {
        /// Domains, separated by spaces or commas
        #[arg(required = true, num_args = 1..)]
        domains: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Checks to run, as letters (i, c, h, w, n) or comma separated names
    #[arg(long, global = true, default_value = "chw")]
    pub checks: CheckSet,

    /// Write the JSON report to this file (must not exist yet)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include raw evidence and probe statuses, and print the report
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report domains without a CDN too
    #[arg(long, global = true)]
    pub all: bool,

    /// Run every domain twice to catch intermittent edge assignments
    #[arg(short, long, global = true)]
    pub double: bool,

    /// Number of concurrent workers (0 = one per core)
    #[arg(short = 't', long = "threads", global = true, default_value_t = 0)]
    pub workers: usize,

    /// Seconds a single domain may take before it is dropped
    #[arg(long, global = true, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// User-Agent sent with HTTP probes
    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT, hide_default_value = true)]
    pub user_agent: String,

    /// Replace the built-in signature catalog with a JSON file
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Do not listen for 'q' to stop early
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Reduce terminal output (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl ScanArgs {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            checks: self.checks,
            workers: self.workers,
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            double: self.double,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
