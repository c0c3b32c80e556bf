//! Process exit codes for `pingone`.
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | configuration error (also any unclassified failure) |
//! | 2 | authentication rejected by PingOne |
//! | 3 | PingOne unreachable or timed out |
//! | 4 | unexpected response, API error or no population |
//! | 5 | cache file could not be read or written |
//! | 6 | `cache get` found no fresh entry |
//!
//! Codes 1 to 5 come from [`PingOneError::exit_code`].

use pingone_cache::PingOneError;

pub const SUCCESS: i32 = 0;
pub const UNCLASSIFIED: i32 = 1;
pub const CACHE_MISS: i32 = 6;

/// Exit code for an error that reached `main`.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<PingOneError>()
        .map_or(UNCLASSIFIED, PingOneError::exit_code)
}
