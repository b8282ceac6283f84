use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::app_error::AppResult;
use crate::application::ports::blacklist_store::BlacklistStore;

struct Entry {
    valid_until: i64,
    expires_at: i64,
}

/// Process-local blacklist. Expired records are dropped on read and swept on
/// every write.
#[derive(Default)]
pub struct InMemoryBlacklistStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryBlacklistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    // A panic elsewhere cannot leave an entry half-written, so a poisoned map
    // is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlacklistStore for InMemoryBlacklistStore {
    async fn put(&self, key: &str, valid_until: i64, ttl_secs: u64) -> AppResult<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let entry = Entry {
            valid_until,
            expires_at: now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        };
        let mut entries = self.entries();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.expires_at <= now => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.valid_until)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryBlacklistStore::new();
        store.put("app:1", 42, 60).await.unwrap();
        assert_eq!(store.get("app:1").await.unwrap(), Some(42));
        assert_eq!(store.get("app:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let store = InMemoryBlacklistStore::new();
        store.put("app:1", 42, 0).await.unwrap();
        assert_eq!(store.get("app:1").await.unwrap(), None);
        assert!(!store.contains("app:1"));
    }

    #[tokio::test]
    async fn test_write_sweeps_expired_entries() {
        let store = InMemoryBlacklistStore::new();
        store.put("app:1", 42, 0).await.unwrap();
        store.put("app:2", 42, 0).await.unwrap();
        store.put("app:3", 42, 60).await.unwrap();

        assert!(!store.contains("app:1"));
        assert!(!store.contains("app:2"));
        assert!(store.contains("app:3"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_survives_poisoned_lock() {
        let store = InMemoryBlacklistStore::new();
        store.put("app:1", 42, 60).await.unwrap();

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = store.entries.lock().unwrap();
                panic!("writer died");
            });
            assert!(handle.join().is_err());
        });
        assert!(store.entries.is_poisoned());

        assert_eq!(store.get("app:1").await.unwrap(), Some(42));
        store.put("app:2", 7, 60).await.unwrap();
        assert!(store.contains("app:2"));
        assert!(!store.is_empty());
    }
}
