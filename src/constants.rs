//! Application-wide constants
//!
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Largest accepted request body (bytes); fits a maximal submission in UTF-8
pub const MAX_REQUEST_BODY_BYTES: usize = 512 * 1024;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// JUDGING PIPELINE
// =============================================================================

/// Stream the judge workers read jobs from
pub const DEFAULT_JUDGE_QUEUE_STREAM: &str = "submission-topic";

/// Stream the judge workers write results to
pub const DEFAULT_JUDGE_RESULT_STREAM: &str = "judge-result-topic";

/// Consumer group used when reading judge results
pub const DEFAULT_JUDGE_RESULT_GROUP: &str = "croj-result-appliers";

/// Block time for a single XREADGROUP call
pub const RESULT_STREAM_BLOCK_MS: u64 = 5000;

/// Result entries idle longer than this are reclaimed on consumer start
pub const RESULT_CLAIM_MIN_IDLE_MS: u64 = 60_000;

/// Lower bound of the simulated judging latency (milliseconds)
pub const DEFAULT_SIMULATION_MIN_DELAY_MS: u64 = 1000;

/// Upper bound of the simulated judging latency (milliseconds)
pub const DEFAULT_SIMULATION_MAX_DELAY_MS: u64 = 4000;

/// Attempts at applying one simulated result before giving up
pub const SIMULATION_APPLY_MAX_ATTEMPTS: u32 = 5;

/// First retry backoff for a failed simulated apply (milliseconds)
pub const SIMULATION_RETRY_BASE_MS: u64 = 500;

/// Pending submissions swept per timeout pass
pub const TIMEOUT_SWEEP_BATCH: i64 = 100;

/// Interval between timeout sweeps (seconds)
pub const TIMEOUT_SWEEP_INTERVAL_SECS: u64 = 30;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum source code length in Unicode code points
pub const MAX_CODE_LENGTH: u64 = 65535;

/// Maximum language tag length
pub const MAX_LANGUAGE_LENGTH: u64 = 32;
