use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::app_error::{AppError, AppResult};
use crate::application::jwt::{self, Claims};
use crate::application::ports::blacklist_store::BlacklistStore;
use crate::application::resolver::ResolvedSceneConfig;
use crate::domain::entities::scene_settings::MAX_SECONDS;

/// Token revocation, namespaced per scene by `blacklist_prefix`.
#[derive(Clone)]
pub struct Blacklist {
    store: Arc<dyn BlacklistStore>,
}

impl Blacklist {
    pub fn new(store: Arc<dyn BlacklistStore>) -> Self {
        Self { store }
    }

    pub fn key(config: &ResolvedSceneConfig, jti: &str) -> String {
        format!("{}:{}", config.blacklist_prefix(), jti)
    }

    /// Revoke a token. Within the scene's grace period it keeps verifying.
    /// Returns `false` when the scene has the blacklist disabled.
    #[instrument(skip(self, config, claims), fields(scene = config.name(), jti = %claims.jti))]
    pub async fn revoke(&self, config: &ResolvedSceneConfig, claims: &Claims) -> AppResult<bool> {
        let settings = config.settings();
        if !settings.blacklist_enabled {
            debug!("blacklist disabled for scene, nothing revoked");
            return Ok(false);
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let grace = settings.blacklist_grace_period.whole_seconds();
        let valid_until = now.saturating_add(grace);
        // Keep the record until the token would have expired anyway.
        let ttl_secs = claims
            .exp
            .saturating_sub(now)
            .max(0)
            .saturating_add(grace)
            .clamp(1, 2 * MAX_SECONDS) as u64;

        self.store
            .put(&Self::key(config, &claims.jti), valid_until, ttl_secs)
            .await?;
        debug!(valid_until, ttl_secs, "token revoked");
        Ok(true)
    }

    pub async fn is_revoked(&self, config: &ResolvedSceneConfig, claims: &Claims) -> AppResult<bool> {
        if !config.settings().blacklist_enabled {
            return Ok(false);
        }
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let record = self.store.get(&Self::key(config, &claims.jti)).await?;
        Ok(record.is_some_and(|valid_until| now >= valid_until))
    }

    /// [`jwt::verify`] plus a revocation check.
    pub async fn verify(&self, config: &ResolvedSceneConfig, token: &str) -> AppResult<Claims> {
        let claims = jwt::verify(config, token)?;
        if self.is_revoked(config, &claims).await? {
            return Err(AppError::Revoked);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolver::SceneConfigResolver;
    use crate::infra::memory_blacklist::InMemoryBlacklistStore;
    use serde_json::{Map, json};

    fn resolver() -> SceneConfigResolver {
        let value = json!({
            "secret": "s",
            "blacklist_prefix": "app",
            "scene": {
                "default": {},
                "admin": {"blacklist_prefix": "admin_bl"},
                "lenient": {"blacklist_grace_period": 3600},
                "open": {"blacklist_enabled": false},
                "forever": {"ttl": MAX_SECONDS, "blacklist_grace_period": MAX_SECONDS},
            },
        });
        SceneConfigResolver::from_value(Some(value)).unwrap()
    }

    fn blacklist() -> (Blacklist, Arc<InMemoryBlacklistStore>) {
        let store = Arc::new(InMemoryBlacklistStore::new());
        (Blacklist::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_revoked_token_fails_verification() {
        let r = resolver();
        let (bl, _) = blacklist();
        let config = r.scene_config("default").unwrap();
        let issued = jwt::issue(config, "u", Map::new()).unwrap();

        assert!(bl.verify(config, &issued.token).await.is_ok());
        assert!(bl.revoke(config, &issued.claims).await.unwrap());
        assert!(matches!(
            bl.verify(config, &issued.token).await,
            Err(AppError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_keys_use_scene_prefix() {
        let r = resolver();
        let (bl, store) = blacklist();
        let config = r.scene_config("admin").unwrap();
        let issued = jwt::issue(config, "u", Map::new()).unwrap();
        bl.revoke(config, &issued.claims).await.unwrap();

        let key = format!("admin_bl:{}", issued.claims.jti);
        assert_eq!(Blacklist::key(config, &issued.claims.jti), key);
        assert!(store.contains(&key));
    }

    #[tokio::test]
    async fn test_grace_period_keeps_token_valid() {
        let r = resolver();
        let (bl, _) = blacklist();
        let config = r.scene_config("lenient").unwrap();
        let issued = jwt::issue(config, "u", Map::new()).unwrap();

        bl.revoke(config, &issued.claims).await.unwrap();
        assert!(!bl.is_revoked(config, &issued.claims).await.unwrap());
        assert!(bl.verify(config, &issued.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_blacklist_never_revokes() {
        let r = resolver();
        let (bl, store) = blacklist();
        let config = r.scene_config("open").unwrap();
        let issued = jwt::issue(config, "u", Map::new()).unwrap();

        assert!(!bl.revoke(config, &issued.claims).await.unwrap());
        assert!(store.is_empty());
        assert!(bl.verify(config, &issued.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revocation_is_scoped_to_scene_prefix() {
        let r = resolver();
        let (bl, _) = blacklist();
        let default = r.scene_config("default").unwrap();
        let admin = r.scene_config("admin").unwrap();
        let issued = jwt::issue(default, "u", Map::new()).unwrap();

        bl.revoke(default, &issued.claims).await.unwrap();
        assert!(bl.is_revoked(default, &issued.claims).await.unwrap());
        assert!(!bl.is_revoked(admin, &issued.claims).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_saturates_on_far_future_expiry() {
        let r = resolver();
        let (bl, store) = blacklist();
        let config = r.scene_config("forever").unwrap();
        let mut issued = jwt::issue(config, "u", Map::new()).unwrap();
        issued.claims.exp = i64::MAX;

        assert!(bl.revoke(config, &issued.claims).await.unwrap());
        assert!(store.contains(&Blacklist::key(config, &issued.claims.jti)));
        assert!(!bl.is_revoked(config, &issued.claims).await.unwrap());
    }
}
