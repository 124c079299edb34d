// Proxy module - cache-first request orchestration
//
// Every response is served from the store. A miss fetches from the backend,
// stores the result and goes back to lookup, so fresh and cached responses
// take the same read path.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use crate::backend::{Cookie, FetchOutcome, Fetcher, HttpFetcher};
use crate::cache::{CacheError, CacheKey, DiskCache, QueryParams, ResponseStore, StoredResponse};
use crate::config::Config;
use crate::constants::MAX_CACHE_PASSES;
use crate::error::ProxyError;
use crate::metrics::ProxyMetrics;
use crate::request_coalescing::{FetchCoalescer, FetchPermit};

/// Inbound request data the proxy needs besides the target path
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest {
    pub params: QueryParams,
    pub cookies: Vec<Cookie>,
}

impl ProxyRequest {
    pub fn new(params: QueryParams, cookies: Vec<Cookie>) -> Self {
        Self { params, cookies }
    }
}

/// Response to write back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Replayed headers, e.g. `Set-Cookie`, in stored order
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: None,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    fn from_stored(stored: StoredResponse) -> Self {
        let headers = stored.headers();
        let status = stored.status();
        let content_type = stored.content_type().map(str::to_string);
        let body = match stored {
            StoredResponse::Simple { body, .. } | StoredResponse::Extended { body, .. } => body,
        };

        Self {
            status,
            content_type,
            headers,
            body,
        }
    }
}

/// Caching reverse proxy core
pub struct CachingProxy {
    store: Arc<dyn ResponseStore>,
    fetcher: Arc<dyn Fetcher>,
    coalescer: Option<FetchCoalescer>,
    metrics: Arc<ProxyMetrics>,
}

impl CachingProxy {
    /// Create a proxy with per-key fetch coalescing enabled
    pub fn new(
        store: Arc<dyn ResponseStore>,
        fetcher: Arc<dyn Fetcher>,
        metrics: Arc<ProxyMetrics>,
    ) -> Self {
        Self {
            store,
            fetcher,
            coalescer: Some(FetchCoalescer::new()),
            metrics,
        }
    }

    /// Enable or disable per-key fetch coalescing
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalescer = enabled.then(FetchCoalescer::new);
        self
    }

    /// Build the disk store and HTTP fetcher described by `config`
    pub async fn from_config(
        config: &Config,
        metrics: Arc<ProxyMetrics>,
    ) -> Result<Self, ProxyError> {
        let mime_types = Arc::new(config.cache.mime_table());
        let store = DiskCache::open(&config.cache.dir, mime_types).await?;
        let fetcher = HttpFetcher::from_config(&config.backend)?;

        tracing::info!(
            cache_dir = %config.cache.dir,
            backend = config.backend.host.as_deref().unwrap_or("none"),
            tls = config.backend.tls,
            coalesce_fetches = config.cache.coalesce_fetches,
            "Caching proxy initialized"
        );

        Ok(Self::new(Arc::new(store), Arc::new(fetcher), metrics)
            .with_coalescing(config.cache.coalesce_fetches))
    }

    pub fn metrics(&self) -> &Arc<ProxyMetrics> {
        &self.metrics
    }

    /// Serve `target` from the cache, filling it from the backend on a miss
    pub async fn handle(
        &self,
        target: &str,
        request: &ProxyRequest,
    ) -> Result<ProxyResponse, ProxyError> {
        let key = CacheKey::new(target, &request.params)?;

        for pass in 0..MAX_CACHE_PASSES {
            if let Some(stored) = self.lookup(&key).await? {
                self.metrics.hits.inc();
                tracing::debug!(
                    key = %key,
                    layout = stored.layout().as_str(),
                    status = stored.status(),
                    pass = pass,
                    "Cache hit"
                );
                return Ok(ProxyResponse::from_stored(stored));
            }

            if pass == 0 {
                self.metrics.misses.inc();
            }
            tracing::debug!(key = %key, pass = pass, "Cache miss");

            // The last pass only reads back what the previous one stored
            if pass + 1 == MAX_CACHE_PASSES {
                break;
            }

            // Permit is released at the end of this block, before the next lookup
            let _permit = match self.acquire(&key).await {
                Some(permit) => {
                    // An earlier holder may have filled the entry while we waited
                    if let Some(stored) = self.store.lookup(&key).await? {
                        self.metrics.hits.inc();
                        tracing::debug!(key = %key, "Entry stored by concurrent request");
                        return Ok(ProxyResponse::from_stored(stored));
                    }
                    Some(permit)
                }
                None => None,
            };

            if !self.fill(&key, &request.cookies).await? {
                self.metrics.not_found_offline.inc();
                tracing::info!(key = %key, "No backend configured, answering 404");
                return Ok(ProxyResponse::not_found());
            }
        }

        tracing::error!(
            key = %key,
            passes = MAX_CACHE_PASSES,
            "Entry still missing after store"
        );
        Err(ProxyError::Internal(format!(
            "cache entry for {} missing after store",
            key
        )))
    }

    /// Look up `key`, waiting out an in-progress write before calling it corrupt
    async fn lookup(&self, key: &CacheKey) -> Result<Option<StoredResponse>, ProxyError> {
        match self.store.lookup(key).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_corrupt() && self.coalescer.is_some() => {
                tracing::debug!(key = %key, error = %err, "Incomplete entry, rechecking under lock");
                let _permit = self.acquire(key).await;
                self.store.lookup(key).await.map_err(|err| self.corrupt(key, err))
            }
            Err(err) => Err(self.corrupt(key, err)),
        }
    }

    fn corrupt(&self, key: &CacheKey, err: CacheError) -> ProxyError {
        tracing::error!(key = %key, error = %err, "Cache lookup failed");
        ProxyError::Cache(err)
    }

    async fn acquire(&self, key: &CacheKey) -> Option<FetchPermit> {
        match &self.coalescer {
            Some(coalescer) => Some(coalescer.acquire(key).await),
            None => None,
        }
    }

    /// Fetch `key` from the backend and store it
    ///
    /// Returns `false` when no backend is configured; nothing is written then.
    async fn fill(&self, key: &CacheKey, cookies: &[Cookie]) -> Result<bool, ProxyError> {
        let start = Instant::now();
        let outcome = self.fetcher.fetch(key.as_str(), cookies).await;
        let elapsed = start.elapsed().as_secs_f64();

        let raw = match outcome {
            Ok(FetchOutcome::Fetched(raw)) => {
                self.metrics.backend_fetches.inc();
                self.metrics.observe_fetch("ok", elapsed);
                raw
            }
            Ok(FetchOutcome::NoBackend) => return Ok(false),
            Err(err) => {
                self.metrics.backend_fetches.inc();
                self.metrics.backend_failures.inc();
                self.metrics.observe_fetch("error", elapsed);
                tracing::warn!(key = %key, error = %err, "Backend fetch failed");
                return Err(ProxyError::Backend(err));
            }
        };

        let status = raw.status;
        let layout = self.store.store(key, raw).await.map_err(|err| {
            tracing::error!(key = %key, error = %err, "Failed to store backend response");
            ProxyError::Cache(err)
        })?;
        self.metrics.record_store(layout);

        tracing::info!(
            key = %key,
            status = status,
            layout = layout.as_str(),
            duration_ms = (elapsed * 1000.0) as u64,
            "Backend response cached"
        );
        Ok(true)
    }
}
