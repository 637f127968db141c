use metrics_exporter_prometheus::PrometheusHandle;
use perf_review::review::{InMemoryReviewStore, Period, PerformanceReviewService};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryReviewService = PerformanceReviewService<InMemoryReviewStore>;

pub(crate) fn in_memory_service() -> MemoryReviewService {
    PerformanceReviewService::new(Arc::new(InMemoryReviewStore::new()))
}

pub(crate) fn parse_period(raw: &str) -> Result<Period, String> {
    Period::parse(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_period_accepts_compact_months_only() {
        assert_eq!(
            parse_period("202403").expect("valid period").as_str(),
            "202403"
        );
        assert!(parse_period("2024-03").is_err());
        assert!(parse_period("202413").is_err());
    }
}
