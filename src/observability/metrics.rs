use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub messages_total: IntCounterVec,
    pub message_latency_seconds: HistogramVec,
    pub extractions_total: IntCounterVec,
    pub geocode_total: IntCounterVec,
    pub distance_resolutions_total: IntCounterVec,
    pub orders_written_total: IntCounterVec,
    pub active_sessions: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_total = IntCounterVec::new(
            Opts::new("messages_total", "Inbound chat messages by session state"),
            &["state"],
        )
        .expect("valid messages_total metric");

        let message_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "message_latency_seconds",
                "Time spent handling one inbound message in seconds",
            ),
            &["state"],
        )
        .expect("valid message_latency_seconds metric");

        let extractions_total = IntCounterVec::new(
            Opts::new("extractions_total", "Field extraction attempts by step and outcome"),
            &["step", "outcome"],
        )
        .expect("valid extractions_total metric");

        let geocode_total = IntCounterVec::new(
            Opts::new("geocode_total", "Geocoding lookups by outcome"),
            &["outcome"],
        )
        .expect("valid geocode_total metric");

        let distance_resolutions_total = IntCounterVec::new(
            Opts::new(
                "distance_resolutions_total",
                "Route distances by the tier that produced them",
            ),
            &["tier"],
        )
        .expect("valid distance_resolutions_total metric");

        let orders_written_total = IntCounterVec::new(
            Opts::new("orders_written_total", "Order store writes by kind"),
            &["kind"],
        )
        .expect("valid orders_written_total metric");

        let active_sessions =
            IntGauge::new("active_sessions", "Conversation sessions outside the idle state")
                .expect("valid active_sessions metric");

        registry
            .register(Box::new(messages_total.clone()))
            .expect("register messages_total");
        registry
            .register(Box::new(message_latency_seconds.clone()))
            .expect("register message_latency_seconds");
        registry
            .register(Box::new(extractions_total.clone()))
            .expect("register extractions_total");
        registry
            .register(Box::new(geocode_total.clone()))
            .expect("register geocode_total");
        registry
            .register(Box::new(distance_resolutions_total.clone()))
            .expect("register distance_resolutions_total");
        registry
            .register(Box::new(orders_written_total.clone()))
            .expect("register orders_written_total");
        registry
            .register(Box::new(active_sessions.clone()))
            .expect("register active_sessions");

        Self {
            registry,
            messages_total,
            message_latency_seconds,
            extractions_total,
            geocode_total,
            distance_resolutions_total,
            orders_written_total,
            active_sessions,
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
