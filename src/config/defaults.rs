//! Default configuration values.
//!
//! Grouped by subsystem. Every `Default` impl in `monitor_config` draws from
//! here.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Allowed CORS origins. `*` allows any origin.
pub const CORS_ORIGINS: &[&str] = &["*"];

// ============================================================================
// Storage
// ============================================================================

/// Sled database directory.
pub const DB_PATH: &str = "./data/observations.db";

/// Upper bound on a single storage call (ms).
pub const STORAGE_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Metrics
// ============================================================================

/// Suffix appended to movement figures in `/get_tracking_info`.
pub const MOVEMENT_UNIT: &str = "m";

/// Number of newest positions returned by `/recent_movements`.
pub const RECENT_MOVEMENTS_LIMIT: usize = 10;

// ============================================================================
// Advisory
// ============================================================================

/// OpenAI-compatible API root.
pub const ADVISORY_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat model requested from the advisory endpoint.
pub const ADVISORY_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the advisory API key.
pub const ADVISORY_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Overall bound on one advisory call (seconds).
pub const ADVISORY_TIMEOUT_SECS: u64 = 15;
