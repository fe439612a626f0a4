use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the series this crate emits.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        describe_counter!("loader_fetch_total", "Source fetches started, by source.");
        describe_counter!("loader_failures_total", "Data bundle loads that failed.");
        describe_histogram!("loader_load_ms", "Fetch + assemble time of the data bundle in milliseconds.");
        describe_histogram!("loader_parse_ms", "Source parse time in milliseconds, by source.");
        describe_counter!("tabular_rows_dropped_total", "Malformed CSV rows dropped while parsing.");
        describe_counter!("ratio_index_collisions_total", "Raw names that collapsed onto an existing key.");
        describe_counter!("api_requests_total", "HTTP requests served, by route.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
