use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub nearby_queries_total: IntCounterVec,
    pub nearby_query_latency_seconds: HistogramVec,
    pub nearby_drivers_returned: Histogram,
    pub driver_updates_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let nearby_queries_total = IntCounterVec::new(
            Opts::new("nearby_queries_total", "Nearby driver searches by outcome"),
            &["outcome"],
        )
        .expect("valid nearby_queries_total metric");

        let nearby_query_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "nearby_query_latency_seconds",
                "Latency of candidate retrieval in seconds",
            ),
            &["source"],
        )
        .expect("valid nearby_query_latency_seconds metric");

        let nearby_drivers_returned = Histogram::with_opts(
            HistogramOpts::new(
                "nearby_drivers_returned",
                "Number of drivers returned per successful search",
            )
            .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
        )
        .expect("valid nearby_drivers_returned metric");

        let driver_updates_total = IntCounterVec::new(
            Opts::new("driver_updates_total", "Driver updates by kind and outcome"),
            &["kind", "outcome"],
        )
        .expect("valid driver_updates_total metric");

        registry
            .register(Box::new(nearby_queries_total.clone()))
            .expect("register nearby_queries_total");
        registry
            .register(Box::new(nearby_query_latency_seconds.clone()))
            .expect("register nearby_query_latency_seconds");
        registry
            .register(Box::new(nearby_drivers_returned.clone()))
            .expect("register nearby_drivers_returned");
        registry
            .register(Box::new(driver_updates_total.clone()))
            .expect("register driver_updates_total");

        Self {
            registry,
            nearby_queries_total,
            nearby_query_latency_seconds,
            nearby_drivers_returned,
            driver_updates_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
