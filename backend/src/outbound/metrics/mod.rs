//! Prometheus exporters for domain metrics ports.
//!
//! Compiled only with the `metrics` feature.

mod prometheus_pipeline_runs;

pub use prometheus_pipeline_runs::PrometheusPipelineMetrics;
