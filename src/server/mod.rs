// Server module - HTTP/1.1 listener in front of the caching proxy
//
// One tokio task per connection; requests on a connection are handled in
// order. TLS termination is left to whatever sits in front of the listener.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::proxy::CachingProxy;

mod handler;

pub use handler::{parse_request, RequestHandler};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bound listener ready to serve the proxy
pub struct ProxyServer {
    listener: TcpListener,
    handler: RequestHandler,
}

impl ProxyServer {
    /// Bind `address` (`host:port`, port 0 for an ephemeral port)
    pub async fn bind(
        address: &str,
        proxy: Arc<CachingProxy>,
        metrics_path: Option<String>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            handler: RequestHandler::new(proxy, metrics_path),
        })
    }

    /// Bind the address and metrics path from `config`
    pub async fn from_config(config: &Config, proxy: Arc<CachingProxy>) -> Result<Self, ServerError> {
        Self::bind(
            &config.server.listen_addr(),
            proxy,
            config.server.metrics_path.clone(),
        )
        .await
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process exits
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes
    ///
    /// Stops accepting new connections; connections already accepted run to
    /// completion on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let local_addr = self.local_addr()?;
        tracing::info!(address = %local_addr, "Proxy listening");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(address = %local_addr, "Shutting down listener");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(err) => {
                            // Transient (e.g. fd exhaustion); keep accepting
                            tracing::warn!(error = %err, "Failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let handler = self.handler.clone();
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler.respond(req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(peer = %peer, error = %err, "Connection closed with error");
            }
        });
    }
}
