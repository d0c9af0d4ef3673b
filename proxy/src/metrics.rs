use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("proxy_http_requests_total", "Total inbound requests per endpoint"),
        &["endpoint"]
    )
    .unwrap();
    pub static ref UPSTREAM_REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "proxy_upstream_requests_total",
        "Total requests sent to the Aranet API"
    ))
    .unwrap();
    pub static ref UPSTREAM_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "proxy_upstream_failures_total",
        "Upstream requests that failed or returned a non-2xx status"
    ))
    .unwrap();
    pub static ref RESHAPE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "proxy_reshape_failures_total",
        "Measurement payloads that could not be reshaped"
    ))
    .unwrap();
    pub static ref UPSTREAM_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "proxy_upstream_latency_seconds",
            "Time spent waiting for the Aranet API"
        )
        .buckets(vec![
            0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0
        ])
    )
    .unwrap();
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESHAPE_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
