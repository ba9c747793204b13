/// Prometheus metrics for production observability
///
/// Request counters and latency histograms are labelled by API route, errors
/// by taxonomy category. Exposed in text format at `/metrics`.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Instant;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for API request metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// Route name (e.g., "bookings", "subcategories")
    pub route: String,
    /// Request status ("success", "error")
    pub status: String,
}

/// Labels for error metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    /// Error taxonomy category
    pub category: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub route: String,
}

/// Central metrics collector with Prometheus registry
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Total API requests by route and status
    pub api_requests_total: Family<RequestLabels, Counter>,

    /// Request duration in seconds by route
    pub api_request_duration_seconds: Family<RouteLabels, Histogram>,

    /// Total API errors by taxonomy category
    pub api_errors_total: Family<ErrorLabels, Counter>,

    /// Total bookings accepted
    pub bookings_created_total: Counter,

    /// Currently active admin sessions
    pub admin_sessions_active: Gauge,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let api_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "api_requests",
            "Total number of API requests",
            api_requests_total.clone(),
        );

        let api_request_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                // Buckets: 1ms up through ~1s; this is an in-memory store.
                Histogram::new(exponential_buckets(0.001, 2.5, 10))
            });
        registry.register(
            "api_request_duration_seconds",
            "Request latency histogram in seconds",
            api_request_duration_seconds.clone(),
        );

        let api_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "api_errors",
            "Total number of API errors by category",
            api_errors_total.clone(),
        );

        let bookings_created_total = Counter::default();
        registry.register(
            "bookings_created",
            "Total number of bookings accepted",
            bookings_created_total.clone(),
        );

        let admin_sessions_active = Gauge::default();
        registry.register(
            "admin_sessions_active",
            "Number of unexpired admin sessions",
            admin_sessions_active.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            api_requests_total,
            api_request_duration_seconds,
            api_errors_total,
            bookings_created_total,
            admin_sessions_active,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        encode(&mut buffer, &registry).expect("encoding metrics should succeed");
        buffer
    }

    pub fn record_request_success(&self, route: &str, duration: std::time::Duration) {
        self.api_requests_total
            .get_or_create(&RequestLabels {
                route: route.to_string(),
                status: "success".to_string(),
            })
            .inc();

        self.api_request_duration_seconds
            .get_or_create(&RouteLabels {
                route: route.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn record_request_error(&self, route: &str, duration: std::time::Duration) {
        self.api_requests_total
            .get_or_create(&RequestLabels {
                route: route.to_string(),
                status: "error".to_string(),
            })
            .inc();

        self.api_request_duration_seconds
            .get_or_create(&RouteLabels {
                route: route.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    /// Count an error against its taxonomy category.
    pub fn record_api_error(&self, category: &str) {
        self.api_errors_total
            .get_or_create(&ErrorLabels {
                category: category.to_string(),
            })
            .inc();
    }

    pub fn record_booking_created(&self) {
        self.bookings_created_total.inc();
    }

    pub fn update_session_count(&self, count: usize) {
        self.admin_sessions_active.set(count as i64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for request timing, recording against the global registry on
/// completion. Dropping without an explicit outcome counts as an error.
pub struct RequestMetrics {
    route: String,
    start: Instant,
    completed: bool,
}

impl RequestMetrics {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
            start: Instant::now(),
            completed: false,
        }
    }

    pub fn success(mut self) {
        METRICS.record_request_success(&self.route, self.start.elapsed());
        self.completed = true;
    }

    pub fn error(mut self) {
        METRICS.record_request_error(&self.route, self.start.elapsed());
        self.completed = true;
    }
}

impl Drop for RequestMetrics {
    fn drop(&mut self) {
        if !self.completed {
            METRICS.record_request_error(&self.route, self.start.elapsed());
        }
    }
}

/// Wrap a handler body with request timing against a named route.
#[macro_export]
macro_rules! with_metrics {
    ($route:expr, $body:expr) => {{
        let _metrics = $crate::metrics::RequestMetrics::new($route);
        let result = $body;
        match &result {
            Ok(_) => _metrics.success(),
            Err(_) => _metrics.error(),
        }
        result
    }};
}
