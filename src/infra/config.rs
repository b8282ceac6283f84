use std::fs;
use std::path::{Path, PathBuf};

use env_helpers::{get_env, get_env_default};
use serde_json::Value;

use super::InfraError;
use crate::application::ports::config_source::ConfigSource;

pub const DEFAULT_NAMESPACE: &str = "jwt";

pub struct AppConfig {
    /// JSON file holding the host configuration tree.
    pub config_path: PathBuf,
    /// Dotted path of the JWT table inside that tree.
    pub namespace: String,
    /// Emit JSON log lines instead of the pretty console format.
    pub log_json: bool,
    /// Redis for the shared blacklist. Unset means in-process only.
    pub redis_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config_path: String = get_env("SCENE_JWT_CONFIG");
        let namespace: String = get_env_default("SCENE_JWT_NAMESPACE", DEFAULT_NAMESPACE.to_string());
        let log_json: bool = get_env_default("SCENE_JWT_LOG_JSON", false);
        let redis_url: Option<String> = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        Self {
            config_path: PathBuf::from(config_path),
            namespace,
            log_json,
            redis_url,
        }
    }
}

/// Configuration tree held in memory, addressed with dotted paths.
#[derive(Debug, Clone)]
pub struct JsonConfigSource {
    root: Value,
}

impl JsonConfigSource {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_file(path: &Path) -> Result<Self, InfraError> {
        let raw = fs::read_to_string(path).map_err(|source| InfraError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let root = serde_json::from_str(&raw).map_err(|source| InfraError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }
}

impl ConfigSource for JsonConfigSource {
    fn read(&self, namespace: &str) -> Option<Value> {
        if namespace.is_empty() {
            return Some(self.root.clone());
        }
        namespace
            .split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
            .cloned()
    }
}
