use std::sync::Arc;

use serde_json::{Map, Value};

use crate::app_error::AppResult;
use crate::application::jwt::{self, Claims, IssuedToken};
use crate::application::resolver::{DEFAULT_SCENE, ResolvedSceneConfig, SceneConfigResolver};

/// A caller's active scene over a shared resolver.
///
/// Create one per request or task. Changing the scene here never affects
/// other selectors built from the same resolver.
#[derive(Debug, Clone)]
pub struct SceneSelector {
    resolver: Arc<SceneConfigResolver>,
    scene: String,
}

impl SceneSelector {
    pub fn new(resolver: Arc<SceneConfigResolver>) -> Self {
        Self {
            resolver,
            scene: DEFAULT_SCENE.to_string(),
        }
    }

    /// Sets the active scene. Existence is checked on lookup, not here.
    pub fn set_scene(&mut self, scene: impl Into<String>) -> &mut Self {
        self.scene = scene.into();
        self
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn resolver(&self) -> &Arc<SceneConfigResolver> {
        &self.resolver
    }

    /// Configuration for the active scene.
    pub fn config(&self) -> AppResult<&ResolvedSceneConfig> {
        self.resolver.scene_config(&self.scene)
    }

    pub fn issue(&self, subject: &str, extra: Map<String, Value>) -> AppResult<IssuedToken> {
        jwt::issue(self.config()?, subject, extra)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        jwt::verify(self.config()?, token)
    }
}
