use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub dispatch_attempts: Histogram,
    pub jobs_in_queue: IntGauge,
    pub providers_online: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_total = IntCounterVec::new(
            Opts::new("dispatch_total", "Finished dispatch runs by outcome"),
            &["outcome"],
        )
        .expect("valid dispatch_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Wall-clock duration of one dispatch run",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let dispatch_attempts = Histogram::with_opts(
            HistogramOpts::new("dispatch_attempts", "Matching attempts used per dispatch run")
                .buckets(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .expect("valid dispatch_attempts metric");

        let jobs_in_queue = IntGauge::new("jobs_in_queue", "Jobs waiting for a dispatch worker")
            .expect("valid jobs_in_queue metric");

        let providers_online = IntGauge::new("providers_online", "Providers currently online")
            .expect("valid providers_online metric");

        registry
            .register(Box::new(dispatch_total.clone()))
            .expect("register dispatch_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(dispatch_attempts.clone()))
            .expect("register dispatch_attempts");
        registry
            .register(Box::new(jobs_in_queue.clone()))
            .expect("register jobs_in_queue");
        registry
            .register(Box::new(providers_online.clone()))
            .expect("register providers_online");

        Self {
            registry,
            dispatch_total,
            dispatch_latency_seconds,
            dispatch_attempts,
            jobs_in_queue,
            providers_online,
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
