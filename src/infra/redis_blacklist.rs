use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};
use crate::application::ports::blacklist_store::BlacklistStore;

/// Redis-backed blacklist; records expire with `SET EX`.
#[derive(Clone)]
pub struct RedisBlacklistStore {
    manager: ConnectionManager,
}

impl RedisBlacklistStore {
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl BlacklistStore for RedisBlacklistStore {
    async fn put(&self, key: &str, valid_until: i64, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(key, valid_until, ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Blacklist(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| AppError::Blacklist(e.to_string()))
    }
}
