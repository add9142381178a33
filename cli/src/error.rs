use std::io;
use std::path::PathBuf;

use cdnmap_common::catalog::CatalogError;
use thiserror::Error;

/// Everything that stops the binary before or after a batch. Each variant
/// maps onto a distinct process exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("A file named {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("Could not write {}: {source}", path.display())]
    OutputWrite { path: PathBuf, source: io::Error },

    #[error("None of the supplied domains is valid: {}", .0.join(", "))]
    InvalidDomains(Vec<String>),

    #[error("No domains were supplied")]
    NoDomains,

    #[error("Could not read input file {}: {source}", path.display())]
    InputFile { path: PathBuf, source: io::Error },

    #[error("Could not read catalog {}: {source}", path.display())]
    CatalogFile { path: PathBuf, source: io::Error },

    #[error("Invalid catalog {}: {source}", path.display())]
    Catalog { path: PathBuf, source: CatalogError },

    #[error("Could not start the analysis engine: {0:#}")]
    Setup(anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::OutputExists(_) => 1,
            CliError::OutputWrite { .. } => 2,
            CliError::InvalidDomains(_) => 3,
            CliError::NoDomains => 4,
            CliError::InputFile { .. } => 5,
            CliError::CatalogFile { .. } | CliError::Catalog { .. } => 6,
            CliError::Setup(_) => 7,
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
