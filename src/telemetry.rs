use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const AUDIT_TARGET: &str = "nexus_rest::audit";
pub const METRICS_TARGET: &str = "nexus_rest::metrics";

#[derive(Default)]
pub struct Metrics {
    pub queries_total: AtomicU64,
    pub writes_total: AtomicU64,
    pub refused_total: AtomicU64,
}

#[derive(Default)]
pub struct Telemetry {
    pub metrics: Metrics,
    // tests capture audit lines in memory
    audit_sink: RwLock<Option<Arc<RwLock<Vec<String>>>>>,
}

pub(crate) static TELEMETRY: std::sync::LazyLock<Telemetry> =
    std::sync::LazyLock::new(Telemetry::default);

pub fn set_audit_sink_for_tests(sink: Arc<RwLock<Vec<String>>>) {
    *TELEMETRY.audit_sink.write() = Some(sink);
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// One structured line per executed store query.
pub fn log_query(collection: &str, duration_ms: u128, result_count: usize, limit: usize, skip: usize) {
    TELEMETRY.metrics.queries_total.fetch_add(1, Ordering::Relaxed);
    let line = serde_json::json!({
        "ts": now_ts(),
        "op": "find",
        "collection": collection,
        "duration_ms": u64::try_from(duration_ms).unwrap_or(u64::MAX),
        "result_count": to_u64(result_count),
        "limit": (limit != usize::MAX).then(|| to_u64(limit)),
        "skip": to_u64(skip),
    })
    .to_string();
    log::debug!(target: METRICS_TARGET, "{line}");
}

/// Audit line for a persisted mutation.
pub fn log_audit(op: &str, collection: &str, doc_id: &str) {
    TELEMETRY.metrics.writes_total.fetch_add(1, Ordering::Relaxed);
    let line = serde_json::json!({
        "ts": now_ts(), "op": op, "collection": collection, "doc_id": doc_id
    })
    .to_string();
    let audit_clone = TELEMETRY.audit_sink.read().clone();
    if let Some(sink) = audit_clone {
        sink.write().push(line.clone());
    }
    log::info!(target: AUDIT_TARGET, "{line}");
}

/// Count a request that ended in a 4xx envelope.
pub fn record_refused() {
    TELEMETRY.metrics.refused_total.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn metrics_text() -> String {
    let m = &TELEMETRY.metrics;
    format!(
        "nexus_rest_queries_total {}\n\
         nexus_rest_writes_total {}\n\
         nexus_rest_refused_total {}\n",
        m.queries_total.load(Ordering::Relaxed),
        m.writes_total.load(Ordering::Relaxed),
        m.refused_total.load(Ordering::Relaxed),
    )
}
