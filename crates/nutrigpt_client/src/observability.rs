//! Metric names and recording helpers shared by the client and the server.

use std::time::Duration;

pub const PLAN_REQUESTS: &str = "nutrigpt_plan_requests_total";
pub const PLAN_CACHE_MISSES: &str = "nutrigpt_plan_cache_misses_total";
pub const GENERATION_TOTAL: &str = "nutrigpt_generation_total";
pub const GENERATION_SECONDS: &str = "nutrigpt_generation_seconds";
pub const STORE_WRITE_FAILURES: &str = "nutrigpt_store_write_failures_total";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationKind {
    Plan,
    Chat,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Plan => "plan",
            GenerationKind::Chat => "chat",
        }
    }
}

pub fn record_generation(kind: GenerationKind, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(GENERATION_TOTAL, "kind" => kind.as_str(), "outcome" => outcome).increment(1);
    metrics::histogram!(GENERATION_SECONDS, "kind" => kind.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_plan_request(origin: &'static str) {
    metrics::counter!(PLAN_REQUESTS, "origin" => origin).increment(1);
}

pub fn record_cache_miss(reason: &'static str) {
    metrics::counter!(PLAN_CACHE_MISSES, "reason" => reason).increment(1);
}

pub fn record_store_write_failure() {
    metrics::counter!(STORE_WRITE_FAILURES).increment(1);
}
