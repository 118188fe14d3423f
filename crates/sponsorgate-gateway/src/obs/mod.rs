//! In-process metrics for the admission pipeline.
//!
//! Counters, gauges, and histograms are atomics keyed by label sets and
//! rendered in Prometheus text format by the `/metrics` handler.

pub mod metrics;

pub use metrics::SponsorMetrics;
