//! Unix-seconds claim helpers.
//!
//! Federation JWTs carry `iat` and `exp` as unix seconds. Signers sample
//! `unix_now` once per statement and derive `exp` from that `iat`, so
//! the two claims never straddle a second boundary.

use chrono::Utc;

/// Current time as unix seconds, for `iat` claims.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
