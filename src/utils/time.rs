//! Time and timestamp utilities

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
