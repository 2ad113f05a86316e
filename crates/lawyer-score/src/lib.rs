//! Lawyer performance scoring: turns per-case CSV exports into one scored
//! record per lawyer and serves the resulting roster over HTTP.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod roster;
pub mod telemetry;
