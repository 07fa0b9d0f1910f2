//! Branch identifier format.
//!
//! Branch ids look like `<prefix>_<token>_<created_at_ms>`, e.g.
//! `branch_3f2a9c1e_1731012345678`. The third underscore-separated component
//! is the creation time that [`EmbeddedTimestamp`](super::EmbeddedTimestamp)
//! uses to pick the newest branch.

use uuid::Uuid;

/// Length of the random token in generated ids.
const TOKEN_LEN: usize = 8;

/// Generate a fresh branch id created at `created_at_ms`.
///
/// `prefix` must not contain `_`; the config layer enforces this.
pub fn new_branch_id(prefix: &str, created_at_ms: i64) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, &token[..TOKEN_LEN], created_at_ms)
}

/// Extract the creation time embedded in a branch id.
///
/// Returns `None` when the id has fewer than three components or the third
/// one is not an integer.
pub fn created_at(branch_id: &str) -> Option<i64> {
    branch_id.split('_').nth(2)?.parse().ok()
}
