use anyhow::Context;
use clap::Parser;
use restcache::config::{Config, LogFormat};
use restcache::metrics::ProxyMetrics;
use restcache::proxy::CachingProxy;
use restcache::server::ProxyServer;
use std::path::PathBuf;
use std::sync::Arc;

/// Restcache - caching reverse proxy for idempotent REST backends
#[derive(Parser, Debug)]
#[command(name = "restcache")]
#[command(version, about, long_about = None)]
struct Args {
    /// Backend to record from (host:port); omit to serve the cache only
    #[arg(short = 's', long = "server", value_name = "HOST:PORT")]
    backend: Option<String>,

    /// Cache root directory
    #[arg(short = 'c', long = "cache", value_name = "DIR")]
    cache_dir: Option<String>,

    /// Reach the backend over https
    #[arg(short = 'x', long = "ssl")]
    ssl: bool,

    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    address: Option<String>,

    /// Listen port
    #[arg(long)]
    port: Option<u16>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

impl Args {
    /// Load the config file (if any) and apply command-line overrides
    fn into_config(self) -> Result<(Config, bool), String> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(backend) = self.backend {
            config.backend.host = Some(backend);
        }
        if let Some(cache_dir) = self.cache_dir {
            config.cache.dir = cache_dir;
        }
        if self.ssl {
            config.backend.tls = true;
        }
        if let Some(address) = self.address {
            config.server.address = address;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        config.validate()?;
        Ok((config, self.test))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    let config_file = args
        .config
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "none".to_string());

    let (config, test_only) = args.into_config().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    if test_only {
        println!("Configuration is valid");
        return Ok(());
    }

    // Initialize logging subsystem
    restcache::logging::init_subscriber(config.logging.format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = %config_file,
        server_address = %config.server.address,
        server_port = config.server.port,
        backend = config.backend.host.as_deref().unwrap_or("none"),
        cache_dir = %config.cache.dir,
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(ProxyMetrics::new().context("Failed to register metrics")?);
    let proxy = CachingProxy::from_config(&config, metrics)
        .await
        .context("Failed to initialize caching proxy")?;

    let server = ProxyServer::from_config(&config, Arc::new(proxy))
        .await
        .context("Failed to start listener")?;

    tracing::info!(
        address = %server.local_addr()?,
        "Starting Restcache proxy"
    );

    // Run until Ctrl-C
    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
