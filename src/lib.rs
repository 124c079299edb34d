// Restcache Library
// Caching reverse proxy: records backend responses on disk and replays them

pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod proxy;
pub mod request_coalescing;
pub mod server;
