//! Cross-crate scenarios for the analysis engine, driven by scripted stub
//! analyzers so no test depends on the live network.

pub mod stubs;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
