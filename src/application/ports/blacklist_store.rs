use async_trait::async_trait;

use crate::app_error::AppResult;

/// Persistence for revoked-token records.
///
/// Keys arrive already namespaced with the scene's blacklist prefix.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Record `key` as revoked from `valid_until` (unix seconds) onwards.
    /// The record may be dropped after `ttl_secs`.
    async fn put(&self, key: &str, valid_until: i64, ttl_secs: u64) -> AppResult<()>;

    /// The `valid_until` stored for `key`, if the record still exists.
    async fn get(&self, key: &str) -> AppResult<Option<i64>>;
}
