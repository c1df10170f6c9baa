use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::error;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0,
];

/// Reads `OBSERVABILITY_ENABLED` once; anything but `false`/`0` enables it.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// Returns `None` when observability is disabled or the recorder could not
/// be installed; the API keeps serving either way.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            error!(error = %e, "Failed to configure Prometheus buckets");
            return None;
        }
    };

    let handle = match builder.install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to install Prometheus recorder");
            return None;
        }
    };

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for the standalone metrics listener.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Ledger metrics

/// Counts a stored attendance record by type and reason.
pub fn track_attendance_recorded(kind: &str, reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "attendance_records_total",
        "type" => kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Counts a refused attendance event by rejection kind.
pub fn track_attendance_rejected(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("attendance_rejections_total", "kind" => kind.to_string()).increment(1);
}

pub fn track_student_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("students_created_total").increment(1);
}
