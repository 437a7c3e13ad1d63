//! Prometheus metrics for the SymptoScan service.
//!
//! Covers HTTP traffic, risk assessments, classifier loading and training,
//! accounts, reviews and the chat broker. All metrics live in one registry and
//! are exported in text format at `/metrics`.
//!
//! # Example
//! ```no_run
//! use symptoscan::metrics::PREDICTIONS_TOTAL;
//!
//! PREDICTIONS_TOTAL
//!     .with_label_values(&["diabetes", "high"])
//!     .inc();
//! ```

mod middleware;

pub use middleware::MetricsLayer;

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "symptoscan";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Number of requests currently being served
    pub static ref HTTP_CONNECTIONS_ACTIVE: Gauge = Gauge::with_opts(
        Opts::new("http_connections_active", "Number of in-flight HTTP requests")
            .namespace(NAMESPACE)
    ).expect("Failed to create HTTP_CONNECTIONS_ACTIVE metric");

    // ============================================================================
    // Prediction Metrics
    // ============================================================================

    /// Labels: disease, risk_level
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of risk assessments")
            .namespace(NAMESPACE),
        &["disease", "risk_level"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Labels: disease. Includes first-use loading.
    pub static ref PREDICTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Risk assessment duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["disease"]
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    /// Labels: disease, source (artifact, trained, failed)
    pub static ref MODEL_LOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("model_loads_total", "Classifier initializations by outcome")
            .namespace(NAMESPACE),
        &["disease", "source"]
    ).expect("Failed to create MODEL_LOADS_TOTAL metric");

    /// Labels: disease
    pub static ref MODEL_TRAINING_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "model_training_duration_seconds",
            "Classifier training duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["disease"]
    ).expect("Failed to create MODEL_TRAINING_DURATION_SECONDS metric");

    // ============================================================================
    // Account, Review and Chat Metrics
    // ============================================================================

    /// Labels: event (signup, login, login_failed, logout)
    pub static ref ACCOUNT_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("account_events_total", "Account lifecycle events")
            .namespace(NAMESPACE),
        &["event"]
    ).expect("Failed to create ACCOUNT_EVENTS_TOTAL metric");

    /// Labels: action (created, updated, deleted, flagged, unflagged)
    pub static ref REVIEWS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("reviews_total", "Review write operations")
            .namespace(NAMESPACE),
        &["action"]
    ).expect("Failed to create REVIEWS_TOTAL metric");

    /// Labels: outcome (llm, mock, fallback, off_topic)
    pub static ref CHAT_MESSAGES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("chat_messages_total", "Chat replies by how they were produced")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create CHAT_MESSAGES_TOTAL metric");

    /// Labels: status
    pub static ref LLM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "llm_request_duration_seconds",
            "Chat completion request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0]),
        &["status"]
    ).expect("Failed to create LLM_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");

    pub static ref UPTIME_SECONDS: Gauge = Gauge::with_opts(
        Opts::new("uptime_seconds", "Application uptime in seconds")
            .namespace(NAMESPACE)
    ).expect("Failed to create UPTIME_SECONDS metric");
}

fn register(collector: Box<dyn Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Register every metric with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    register(Box::new(HTTP_CONNECTIONS_ACTIVE.clone()))?;

    register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
    register(Box::new(MODEL_LOADS_TOTAL.clone()))?;
    register(Box::new(MODEL_TRAINING_DURATION_SECONDS.clone()))?;

    register(Box::new(ACCOUNT_EVENTS_TOTAL.clone()))?;
    register(Box::new(REVIEWS_TOTAL.clone()))?;
    register(Box::new(CHAT_MESSAGES_TOTAL.clone()))?;
    register(Box::new(LLM_REQUEST_DURATION_SECONDS.clone()))?;

    register(Box::new(BUILD_INFO.clone()))?;
    register(Box::new(UPTIME_SECONDS.clone()))?;

    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Prometheus text exposition of the global registry
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_prediction_counter() {
        PREDICTIONS_TOTAL
            .with_label_values(&["stroke", "medium"])
            .inc();

        let value = PREDICTIONS_TOTAL
            .with_label_values(&["stroke", "medium"])
            .get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        let metrics = gather_metrics();
        assert!(metrics.contains("symptoscan_build_info"));
    }
}
