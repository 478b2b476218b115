//! Structured JSON logging, a Prometheus `MetricsSink`, and the shared
//! `/health` + `/metrics` admin surface mounted by both the registry and
//! subscriber servers (§6).

pub mod admin;
pub mod init;
pub mod prometheus;
pub mod sinks;

pub use init::init_tracing;
pub use sinks::{metrics, HttpMetricsSink, LroMetricsSink, MetricsSink, QueueMetricsSink, SINK};
