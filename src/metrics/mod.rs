// Metrics module - Prometheus counters for the caching proxy
//
// Each ProxyMetrics owns its registry so several proxies (and tests) in one
// process never collide on metric names.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::cache::Layout;

pub struct ProxyMetrics {
    registry: Registry,

    /// Requests answered from an existing cache entry
    pub hits: IntCounter,

    /// Lookups that found no entry
    pub misses: IntCounter,

    /// Requests sent to the backend
    pub backend_fetches: IntCounter,

    /// Backend requests that failed before a response was read
    pub backend_failures: IntCounter,

    /// Misses answered with 404 because no backend is configured
    pub not_found_offline: IntCounter,

    /// Entries written, by layout
    stores: IntCounterVec,

    /// Backend fetch duration (in seconds)
    fetch_duration: HistogramVec,
}

impl ProxyMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "restcache_requests_total",
                "Total number of proxied requests by cache outcome",
            ),
            &["outcome"], // hit, miss, not_found_offline
        )?;
        registry.register(Box::new(requests.clone()))?;

        let backend = IntCounterVec::new(
            Opts::new(
                "restcache_backend_requests_total",
                "Total number of backend requests by result",
            ),
            &["result"], // sent, failed
        )?;
        registry.register(Box::new(backend.clone()))?;

        let stores = IntCounterVec::new(
            Opts::new(
                "restcache_cache_stores_total",
                "Total number of cache entries written by layout",
            ),
            &["layout"], // simple, extended
        )?;
        registry.register(Box::new(stores.clone()))?;

        let fetch_duration = HistogramVec::new(
            HistogramOpts::new(
                "restcache_backend_fetch_duration_seconds",
                "Duration of backend fetches in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]), // 5ms to 30s
            &["result"],
        )?;
        registry.register(Box::new(fetch_duration.clone()))?;

        Ok(Self {
            hits: requests.with_label_values(&["hit"]),
            misses: requests.with_label_values(&["miss"]),
            not_found_offline: requests.with_label_values(&["not_found_offline"]),
            backend_fetches: backend.with_label_values(&["sent"]),
            backend_failures: backend.with_label_values(&["failed"]),
            stores,
            fetch_duration,
            registry,
        })
    }

    pub fn record_store(&self, layout: Layout) {
        self.stores.with_label_values(&[layout.as_str()]).inc();
    }

    pub fn stores(&self, layout: Layout) -> u64 {
        self.stores.with_label_values(&[layout.as_str()]).get()
    }

    pub fn observe_fetch(&self, result: &str, seconds: f64) {
        self.fetch_duration
            .with_label_values(&[result])
            .observe(seconds);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for ProxyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyMetrics")
            .field("hits", &self.hits.get())
            .field("misses", &self.misses.get())
            .field("backend_fetches", &self.backend_fetches.get())
            .finish_non_exhaustive()
    }
}
