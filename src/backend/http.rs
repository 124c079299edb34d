//! HTTP(S) fetcher built on reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};

use super::{cookie_header, Cookie, FetchError, FetchOutcome, Fetcher};
use crate::cache::RawResponse;
use crate::config::BackendConfig;

/// Fetches from `{scheme}://{host:port}{target}`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    backend: Option<String>,
    use_tls: bool,
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher; `backend` is `host:port`, `None` for offline mode
    pub fn new(backend: Option<String>, use_tls: bool, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            backend,
            use_tls,
            client,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, FetchError> {
        Self::new(
            config.host.clone(),
            config.tls,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Full origin URL for a canonical target, if a backend is configured
    pub fn url_for(&self, target: &str) -> Option<String> {
        self.backend
            .as_ref()
            .map(|backend| format!("{}://{}{}", self.scheme(), backend, target))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str, cookies: &[Cookie]) -> Result<FetchOutcome, FetchError> {
        let (Some(backend), Some(url)) = (self.backend.as_deref(), self.url_for(target)) else {
            return Ok(FetchOutcome::NoBackend);
        };

        let parsed = reqwest::Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let mut request = self.client.get(parsed);
        if let Some(cookie) = cookie_header(cookies) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    backend: backend.to_string(),
                }
            } else {
                FetchError::Unreachable {
                    backend: backend.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let set_cookies: Vec<String> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        let set_cookie = (!set_cookies.is_empty()).then(|| set_cookies.join("\n"));

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        tracing::debug!(
            url = %url,
            status = status,
            bytes = body.len(),
            cookies = cookies.len(),
            "Backend response received"
        );

        Ok(FetchOutcome::Fetched(RawResponse {
            status,
            content_type,
            set_cookie,
            body,
        }))
    }
}
