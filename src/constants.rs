// Constants module - centralized default values for configuration
//
// Defaults used by the config layer, the cache store and the proxy loop.
// Keeping them here avoids magic numbers scattered across modules.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Default listen port (same base port the original test servers used)
pub const DEFAULT_PORT: u16 = 16000;

// =============================================================================
// Backend defaults
// =============================================================================

/// Default backend request timeout in seconds
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Cache layout
// =============================================================================

/// File holding the raw body of an extended entry
pub const BODY_FILE_NAME: &str = ".dmp";

/// File holding the metadata of an extended entry; its presence commits the entry
pub const META_FILE_NAME: &str = ".prp";

/// Metadata property carrying the numeric status
pub const STATUS_PROPERTY: &str = "status";

/// Metadata property carrying the content type
pub const CONTENT_TYPE_PROPERTY: &str = "Content-Type";

/// Metadata property carrying the raw Set-Cookie value(s)
pub const SET_COOKIE_PROPERTY: &str = "Set-Cookie";

/// Content type reported when no extension mapping applies
pub const DEFAULT_MIME_TYPE: &str = "unknown/unknown";

// =============================================================================
// Proxy loop
// =============================================================================

/// Maximum number of cache lookups per request (miss, then hit after store)
pub const MAX_CACHE_PASSES: usize = 2;
