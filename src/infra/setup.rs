use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::InfraError;
use crate::{
    application::{
        blacklist::Blacklist, ports::blacklist_store::BlacklistStore,
        resolver::SceneConfigResolver,
    },
    infra::{
        config::{AppConfig, JsonConfigSource},
        memory_blacklist::InMemoryBlacklistStore,
        redis_blacklist::RedisBlacklistStore,
    },
};

pub fn build_resolver(config: &AppConfig) -> Result<SceneConfigResolver, InfraError> {
    let source = JsonConfigSource::from_file(&config.config_path)?;
    let resolver = SceneConfigResolver::from_source(&source, &config.namespace)?;
    Ok(resolver)
}

/// Redis when `REDIS_URL` is configured, otherwise a process-local store.
pub async fn build_blacklist(config: &AppConfig) -> Result<Blacklist, InfraError> {
    let store: Arc<dyn BlacklistStore> = match &config.redis_url {
        Some(url) => {
            info!("using redis blacklist store");
            Arc::new(RedisBlacklistStore::new(url).await?)
        }
        None => {
            info!("using in-memory blacklist store");
            Arc::new(InMemoryBlacklistStore::new())
        }
    };
    Ok(Blacklist::new(store))
}

pub fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "scene_jwt=info".into());

    // Console (pretty logs)
    let console_layer = (!log_json).then(|| fmt::layer().with_target(false).with_level(true).pretty());

    // Structured JSON logs on stdout
    let json_layer = log_json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
