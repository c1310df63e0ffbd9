//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; cron jobs rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 50-59   | fetch            | Remote services and import sources       |
//! | 60-69   | store            | Content store snapshot                   |
//! | 70-79   | config           | Settings file and required values        |
//!
//! A run that aborts with a 5x code has written nothing. A 6x code may
//! leave the store partially converged; re-running the import repairs it.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the matching `From` impl in `main.rs`

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
/// Per-record failures are reported in the stats, not the exit code.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// Cannot reach the remote service, or the request timed out.
pub const EXIT_FETCH_NETWORK: u8 = 50;

/// Remote service answered with an HTTP error status.
pub const EXIT_FETCH_HTTP: u8 = 51;

/// Response body is not what the service contract says
/// (bad JSON, missing `results` / `programs`, broken CSV).
pub const EXIT_FETCH_PARSE: u8 = 52;

/// First page came back with zero results. Usually a wrong URL or query.
pub const EXIT_FETCH_EMPTY: u8 = 53;

/// Pagination broke its contract (empty later page, `next` loop).
pub const EXIT_FETCH_PROTOCOL: u8 = 54;

/// Local import file (WordPress export, thumbnail CSV) is malformed.
pub const EXIT_SOURCE_PARSE: u8 = 55;

// =============================================================================
// Store (60-69)
// =============================================================================

/// Content store stopped answering mid-run.
pub const EXIT_STORE_UNAVAILABLE: u8 = 60;

/// Store snapshot cannot be read or written.
pub const EXIT_STORE_IO: u8 = 61;

/// Store snapshot is corrupt.
pub const EXIT_STORE_FORMAT: u8 = 62;

/// Store refused an operation outside the per-record loop.
pub const EXIT_STORE_REJECTED: u8 = 63;

// =============================================================================
// Config (70-79)
// =============================================================================

/// `--config` / `$MAINSITE_CONFIG` points at a missing file.
pub const EXIT_CONFIG_NOT_FOUND: u8 = 70;

/// Config file is unreadable or not valid TOML for the settings schema.
pub const EXIT_CONFIG_INVALID: u8 = 71;

/// A required value (service URL, store path) is missing or malformed.
pub const EXIT_CONFIG_VALUE: u8 = 72;
