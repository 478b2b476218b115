//! Concrete `MetricsSink` implementation backed by the `prometheus` crate.
//! Metric collectors are registered once, in [`install`]; every sink method
//! after that is a lock-free lookup into a `OnceCell`.

use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

use crate::sinks::*;

static HTTP_REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static QUEUE_TASKS_ENQUEUED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static QUEUE_TASKS_FAILED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static QUEUE_TASK_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static QUEUE_DEPTH: OnceCell<IntGauge> = OnceCell::new();
static ADMIN_ACTIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("prometheus sink not initialized; call onix_telemetry::prometheus::install() first")
    };
}

/// Registers every collector with the default registry. Must run exactly
/// once, before the first metrics call and before [`crate::sinks::SINK`] is
/// set; a second call is a programming error, not a runtime condition.
pub fn install() -> Result<(), prometheus::Error> {
    HTTP_REQUESTS_TOTAL
        .set(register_int_counter_vec!(
            "onix_http_requests_total",
            "Total HTTP requests handled, by route and status code",
            &["route", "status"]
        )?)
        .expect("install() called more than once");
    HTTP_REQUEST_DURATION_SECONDS
        .set(register_histogram_vec!(
            "onix_http_request_duration_seconds",
            "HTTP request latency in seconds, by route",
            &["route"],
            exponential_buckets(0.001, 2.0, 16)?
        )?)
        .expect("install() called more than once");
    QUEUE_TASKS_ENQUEUED_TOTAL
        .set(register_int_counter_vec!(
            "onix_queue_tasks_enqueued_total",
            "Total tasks submitted to the task queue, by task type",
            &["task_type"]
        )?)
        .expect("install() called more than once");
    QUEUE_TASKS_FAILED_TOTAL
        .set(register_int_counter_vec!(
            "onix_queue_tasks_failed_total",
            "Total tasks that failed processing, by task type",
            &["task_type"]
        )?)
        .expect("install() called more than once");
    QUEUE_TASK_DURATION_SECONDS
        .set(register_histogram_vec!(
            "onix_queue_task_duration_seconds",
            "Task processing latency in seconds, by task type",
            &["task_type"],
            exponential_buckets(0.001, 2.0, 16)?
        )?)
        .expect("install() called more than once");
    QUEUE_DEPTH
        .set(register_int_gauge!(
            "onix_queue_depth",
            "Current number of tasks buffered in the task queue"
        )?)
        .expect("install() called more than once");
    ADMIN_ACTIONS_TOTAL
        .set(register_int_counter_vec!(
            "onix_admin_actions_total",
            "Total admin actions processed, by action and outcome",
            &["action", "outcome"]
        )?)
        .expect("install() called more than once");

    SINK.set(&PrometheusSink).expect("install() called more than once");
    Ok(())
}

impl HttpMetricsSink for PrometheusSink {
    fn inc_requests_total(&self, route: &str, status: u16) {
        get_metric!(HTTP_REQUESTS_TOTAL)
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    fn observe_request_duration(&self, route: &str, duration_secs: f64) {
        get_metric!(HTTP_REQUEST_DURATION_SECONDS)
            .with_label_values(&[route])
            .observe(duration_secs);
    }
}

impl QueueMetricsSink for PrometheusSink {
    fn inc_tasks_enqueued(&self, task_type: &'static str) {
        get_metric!(QUEUE_TASKS_ENQUEUED_TOTAL).with_label_values(&[task_type]).inc();
    }

    fn inc_tasks_failed(&self, task_type: &'static str) {
        get_metric!(QUEUE_TASKS_FAILED_TOTAL).with_label_values(&[task_type]).inc();
    }

    fn observe_task_duration(&self, task_type: &'static str, duration_secs: f64) {
        get_metric!(QUEUE_TASK_DURATION_SECONDS)
            .with_label_values(&[task_type])
            .observe(duration_secs);
    }

    fn set_queue_depth(&self, depth: i64) {
        get_metric!(QUEUE_DEPTH).set(depth);
    }
}

impl LroMetricsSink for PrometheusSink {
    fn inc_admin_action(&self, action: &'static str, outcome: &'static str) {
        get_metric!(ADMIN_ACTIONS_TOTAL).with_label_values(&[action, outcome]).inc();
    }
}
