//! # cdnmap core
//!
//! The concurrent analysis engine.
//!
//! * **[`analyzer`]**: the evidence-gathering capability and its network variants.
//! * **[`pipeline`]**: per-domain ordering, early exit and digestion.
//! * **[`scheduler`]**: bounded fan-out of pipelines with per-job deadlines.
//! * **[`batch`]**: the entry point front-ends call ([`batch::AnalysisService`]).
//! * **[`network`]**: DNS and HTTP clients shared by the analyzers.

pub mod analyzer;
pub mod batch;
pub mod network;
pub mod pipeline;
pub mod scheduler;

pub use analyzer::{Analyzer, AnalyzerRegistry, ProbeBudget};
pub use batch::{AnalysisService, BatchHooks, BatchOutcome};
pub use pipeline::{JobError, Pipeline, PipelineStatus};
pub use scheduler::{JobTally, ProgressFn, Scheduler};
