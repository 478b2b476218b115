//! The abstract metrics contract: decouples instrumentation call sites in
//! `onix-registry-server`/`onix-subscriber-server`/`onix-queue` from the
//! concrete Prometheus backend.

use once_cell::sync::OnceCell;

/// A no-op sink, returned before [`crate::prometheus::install`] runs and
/// used directly in tests that don't care about metrics.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the installed sink, or a no-op if [`crate::prometheus::install`]
/// has not run yet.
pub fn metrics() -> &'static dyn MetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// HTTP-surface metrics: one request counter and one latency histogram,
/// both labeled by route and (for the counter) response status.
pub trait HttpMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_requests_total(&self, route: &str, status: u16);
    fn observe_request_duration(&self, route: &str, duration_secs: f64);
}
impl HttpMetricsSink for NopSink {
    fn inc_requests_total(&self, _route: &str, _status: u16) {}
    fn observe_request_duration(&self, _route: &str, _duration_secs: f64) {}
}

/// `ChannelTaskQueue` fan-out metrics (§4.K/§4.L).
pub trait QueueMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_tasks_enqueued(&self, task_type: &'static str);
    fn inc_tasks_failed(&self, task_type: &'static str);
    fn observe_task_duration(&self, task_type: &'static str, duration_secs: f64);
    fn set_queue_depth(&self, depth: i64);
}
impl QueueMetricsSink for NopSink {
    fn inc_tasks_enqueued(&self, _task_type: &'static str) {}
    fn inc_tasks_failed(&self, _task_type: &'static str) {}
    fn observe_task_duration(&self, _task_type: &'static str, _duration_secs: f64) {}
    fn set_queue_depth(&self, _depth: i64) {}
}

/// Subscription-lifecycle metrics: one counter per admin action outcome
/// (§4.H), keeping the engine itself free of any metrics dependency.
pub trait LroMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_admin_action(&self, action: &'static str, outcome: &'static str);
}
impl LroMetricsSink for NopSink {
    fn inc_admin_action(&self, _action: &'static str, _outcome: &'static str) {}
}

pub trait MetricsSink: HttpMetricsSink + QueueMetricsSink + LroMetricsSink {}
impl<T> MetricsSink for T where T: HttpMetricsSink + QueueMetricsSink + LroMetricsSink {}
