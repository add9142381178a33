//! # cdnmap common
//!
//! Shared models and contracts for the CDN detection engine.
//!
//! * **[`record`]**: the per-domain evidence accumulator ([`record::DomainRecord`]).
//! * **[`catalog`]**: the read-only table of CDN signatures and the matcher.
//! * **[`config`]**: scan knobs consumed by the engine (checks, workers, timeout).
//! * **[`error`]**: the probe status taxonomy shared by every analyzer.
//! * **[`target`]**: domain-name validation and list parsing for front-ends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod record;
pub mod target;

#[doc(hidden)]
pub use tracing as __tracing;

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!($($arg)*)
    };
}

/// Info-level event routed to the `cdnmap::success` target, rendered with a
/// distinct symbol by the terminal formatter.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "cdnmap::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!($($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!($($arg)*)
    };
}
