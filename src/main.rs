use dotenvy::dotenv;
use tracing::{info, warn};

use scene_jwt::infra::{
    config::AppConfig,
    setup::{build_resolver, init_tracing},
};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(config.log_json);

    let resolver = build_resolver(&config)?;

    let mut count = 0;
    for name in resolver.scene_names() {
        let scene = resolver.scene_config(name)?;
        let settings = scene.settings();
        info!(
            scene = name,
            alg = %settings.alg,
            family = settings.family().as_str(),
            token_prefix = %settings.token_prefix,
            blacklist_prefix = %settings.blacklist_prefix,
            ttl_secs = settings.ttl.whole_seconds(),
            "scene ok"
        );
        count += 1;
    }

    if count == 0 {
        warn!(namespace = %config.namespace, "no scenes declared; every lookup will fail");
    }

    Ok(())
}
