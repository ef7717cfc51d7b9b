use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    checks: AtomicU64,
    anomalies: AtomicU64,
    rejected_requests: AtomicU64,
    valuations: AtomicU64,
    assistant_requests: AtomicU64,
}

impl Metrics {
    pub fn record_check(&self, is_anomaly: bool) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if is_anomaly {
            self.anomalies.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_valuation(&self) {
        self.valuations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_assistant_request(&self) {
        self.assistant_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let checks = self.checks.load(Ordering::Relaxed);
        let anomalies = self.anomalies.load(Ordering::Relaxed);
        let rejected = self.rejected_requests.load(Ordering::Relaxed);
        let valuations = self.valuations.load(Ordering::Relaxed);
        let assistant = self.assistant_requests.load(Ordering::Relaxed);

        format!(
            "# TYPE landrec_checks_total counter\n\
landrec_checks_total {}\n\
# TYPE landrec_anomalies_total counter\n\
landrec_anomalies_total {}\n\
# TYPE landrec_rejected_requests_total counter\n\
landrec_rejected_requests_total {}\n\
# TYPE landrec_valuations_total counter\n\
landrec_valuations_total {}\n\
# TYPE landrec_assistant_requests_total counter\n\
landrec_assistant_requests_total {}\n",
            checks, anomalies, rejected, valuations, assistant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters() {
        let metrics = Metrics::default();
        metrics.record_check(true);
        metrics.record_check(false);
        metrics.record_rejected();

        let text = metrics.render_prometheus();
        assert!(text.contains("landrec_checks_total 2\n"));
        assert!(text.contains("landrec_anomalies_total 1\n"));
        assert!(text.contains("landrec_rejected_requests_total 1\n"));
        assert!(text.contains("landrec_valuations_total 0\n"));
    }
}
