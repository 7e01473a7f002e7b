use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Prometheus metrics for the control plane: admin request outcomes, the
/// xDS ACK/NACK/push counters named in the component design, and a gauge
/// for the number of records currently in the catalog.
pub struct MetricsCollector {
    registry: Registry,

    pub admin_requests_total: IntCounterVec,
    pub admin_request_duration: HistogramVec,
    pub catalog_size: IntGauge,
    pub xds_push_total: IntCounterVec,
    pub xds_nack_total: IntCounterVec,
    pub xds_active_streams: IntGauge,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let admin_requests_total = IntCounterVec::new(
            Opts::new("gatewayctl_admin_requests_total", "Total admin HTTP requests")
                .namespace("gatewayctl"),
            &["method", "path", "status"],
        )?;

        let admin_request_duration = HistogramVec::new(
            HistogramOpts::new("gatewayctl_admin_request_duration_seconds", "Admin request latency")
                .namespace("gatewayctl")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["path"],
        )?;

        let catalog_size = IntGauge::new("gatewayctl_catalog_size", "Number of records in the catalog")?;

        let xds_push_total = IntCounterVec::new(
            Opts::new("gatewayctl_xds_push_total", "Total xDS resource pushes").namespace("gatewayctl"),
            &["type_url"],
        )?;

        let xds_nack_total = IntCounterVec::new(
            Opts::new("gatewayctl_xds_nack_total", "Total xDS NACKs received").namespace("gatewayctl"),
            &["type_url"],
        )?;

        let xds_active_streams = IntGauge::new("gatewayctl_xds_active_streams", "Open ADS streams")?;

        registry.register(Box::new(admin_requests_total.clone()))?;
        registry.register(Box::new(admin_request_duration.clone()))?;
        registry.register(Box::new(catalog_size.clone()))?;
        registry.register(Box::new(xds_push_total.clone()))?;
        registry.register(Box::new(xds_nack_total.clone()))?;
        registry.register(Box::new(xds_active_streams.clone()))?;

        Ok(Self {
            registry,
            admin_requests_total,
            admin_request_duration,
            catalog_size,
            xds_push_total,
            xds_nack_total,
            xds_active_streams,
        })
    }

    pub fn record_admin_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        self.admin_requests_total.with_label_values(&[method, path, &status.to_string()]).inc();
        self.admin_request_duration.with_label_values(&[path]).observe(duration_secs);
    }

    pub fn record_push(&self, type_url: &str) {
        self.xds_push_total.with_label_values(&[type_url]).inc();
    }

    pub fn record_nack(&self, type_url: &str) {
        self.xds_nack_total.with_label_values(&[type_url]).inc();
    }

    /// Prometheus text exposition, served under the configured metrics path.
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let metrics = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metrics, &mut buffer).unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("failed to build metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_text_includes_registered_metric_names() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_push("type.googleapis.com/envoy.config.cluster.v3.Cluster");
        collector.record_nack("type.googleapis.com/envoy.config.route.v3.RouteConfiguration");
        let text = collector.gather_text();
        assert!(text.contains("gatewayctl_xds_push_total"));
        assert!(text.contains("gatewayctl_xds_nack_total"));
    }
}
