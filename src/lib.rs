//! Open-loop HTTP load generator.
//!
//! A coordinator process divides a target request rate across worker
//! processes. Each worker schedules requests at absolute nominal instants
//! (so a slow request never slows the schedule down), caps in-flight work
//! with an admission governor, and folds results into fixed-size aggregates.
//! Workers stream snapshots and a final report back over stdio as JSON
//! lines; the coordinator merges them and prints the run report.

pub mod args;
pub mod config;
pub mod coordinator;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod protocol;
pub mod sinks;
pub mod worker;
