use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub pickups_submitted_total: IntCounter,
    pub match_outcomes_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub rejected_operations_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let pickups_submitted_total =
            IntCounter::new("pickups_submitted_total", "Pickup requests accepted")
                .expect("valid pickups_submitted_total metric");

        let match_outcomes_total = IntCounterVec::new(
            Opts::new("match_outcomes_total", "Automatic match attempts by outcome"),
            &["outcome"],
        )
        .expect("valid match_outcomes_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Committed lifecycle transitions by target status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let rejected_operations_total = IntCounterVec::new(
            Opts::new(
                "rejected_operations_total",
                "Dispatch operations rejected by error kind",
            ),
            &["kind"],
        )
        .expect("valid rejected_operations_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of pickup submission and matching in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        registry
            .register(Box::new(pickups_submitted_total.clone()))
            .expect("register pickups_submitted_total");
        registry
            .register(Box::new(match_outcomes_total.clone()))
            .expect("register match_outcomes_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(rejected_operations_total.clone()))
            .expect("register rejected_operations_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");

        Self {
            registry,
            pickups_submitted_total,
            match_outcomes_total,
            status_transitions_total,
            rejected_operations_total,
            dispatch_latency_seconds,
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
