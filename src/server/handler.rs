//! Translation between HTTP requests/responses and the proxy core

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, ALLOW, CONTENT_TYPE, COOKIE};
use http::request::Parts;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use tracing::Instrument;

use crate::backend::{parse_cookie_header, Cookie};
use crate::cache::QueryParams;
use crate::error::ProxyError;
use crate::proxy::{CachingProxy, ProxyRequest, ProxyResponse};

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Per-connection request handler; cheap to clone
#[derive(Clone)]
pub struct RequestHandler {
    proxy: Arc<CachingProxy>,
    metrics_path: Option<Arc<str>>,
}

impl RequestHandler {
    pub fn new(proxy: Arc<CachingProxy>, metrics_path: Option<String>) -> Self {
        Self {
            proxy,
            metrics_path: metrics_path.map(Arc::from),
        }
    }

    /// Answer one request; never fails, errors become status codes
    ///
    /// The request body is ignored: only GET and HEAD are proxied.
    pub async fn respond<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path()
        );

        let (parts, _) = req.into_parts();

        async move {
            let start = Instant::now();
            let is_head = parts.method == Method::HEAD;
            let mut response = self.dispatch(&parts).await;

            tracing::info!(
                status = response.status().as_u16(),
                bytes = bytes_len(&response),
                duration_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );

            if is_head {
                *response.body_mut() = Full::new(Bytes::new());
            }
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, req: &Parts) -> Response<Full<Bytes>> {
        if req.method != Method::GET && req.method != Method::HEAD {
            let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        if self.metrics_path.as_deref() == Some(req.uri.path()) {
            return self.render_metrics();
        }

        let (target, request) = match parse_request(req) {
            Ok(parsed) => parsed,
            Err(err) => return error_response(&err),
        };

        match self.proxy.handle(&target, &request).await {
            Ok(response) => build_response(response),
            Err(err) => error_response(&err),
        }
    }

    fn render_metrics(&self) -> Response<Full<Bytes>> {
        match self.proxy.metrics().render() {
            Ok(text) => {
                let mut response = Response::new(Full::new(Bytes::from(text)));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(METRICS_CONTENT_TYPE));
                response
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to render metrics");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

/// Decoded target path plus the query parameters and cookies it carries
pub fn parse_request(req: &Parts) -> Result<(String, ProxyRequest), ProxyError> {
    let raw_path = req.uri.path();
    let target = urlencoding::decode(raw_path)
        .map_err(|_| ProxyError::BadRequest(format!("path '{}' is not valid UTF-8", raw_path)))?
        .into_owned();

    let params = QueryParams::from_query_string(req.uri.query().unwrap_or(""))?;

    let cookies: Vec<Cookie> = req
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect();

    Ok((target, ProxyRequest::new(params, cookies)))
}

fn build_response(proxied: ProxyResponse) -> Response<Full<Bytes>> {
    let status = match StatusCode::from_u16(proxied.status) {
        Ok(status) => status,
        Err(_) => {
            tracing::error!(status = proxied.status, "Cached status is not a valid HTTP status");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let mut response = Response::new(Full::new(proxied.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Some(content_type) = proxied.content_type {
        match HeaderValue::from_str(&content_type) {
            Ok(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type = %content_type, "Skipping invalid Content-Type"),
        }
    }
    for (name, value) in proxied.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid replayed header"),
        }
    }

    response
}

fn error_response(err: &ProxyError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, status = status.as_u16(), "Request failed");
    } else {
        tracing::warn!(error = %err, status = status.as_u16(), "Request rejected");
    }
    plain(status, err.to_string())
}

fn plain(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}

fn bytes_len(response: &Response<Full<Bytes>>) -> u64 {
    use hyper::body::Body;
    response.body().size_hint().exact().unwrap_or(0)
}
