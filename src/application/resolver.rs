use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::app_error::{AppError, AppResult};
use crate::application::ports::config_source::ConfigSource;
use crate::domain::entities::algorithm::{AlgorithmCatalog, JwtAlgorithm, algorithm_list_value};
use crate::domain::entities::scene_settings::{DEFAULT_BLACKLIST_PREFIX, SceneSettings, is_blank};

pub const DEFAULT_SCENE: &str = "default";
const SCENE_KEY: &str = "scene";

/// One scene's merged settings: the raw bag plus its validated typed view.
#[derive(Debug)]
pub struct ResolvedSceneConfig {
    name: String,
    bag: Map<String, Value>,
    settings: SceneSettings,
}

impl ResolvedSceneConfig {
    pub fn new(name: &str, bag: Map<String, Value>) -> AppResult<Self> {
        let settings = SceneSettings::from_bag(name, &bag)?;
        Ok(Self {
            name: name.to_string(),
            bag,
            settings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bag(&self) -> &Map<String, Value> {
        &self.bag
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn alg(&self) -> JwtAlgorithm {
        self.settings.alg
    }

    pub fn token_prefix(&self) -> &str {
        &self.settings.token_prefix
    }

    pub fn blacklist_prefix(&self) -> &str {
        &self.settings.blacklist_prefix
    }
}

/// Global defaults plus one merged configuration per declared scene.
///
/// Built once from a configuration snapshot. Lookups only read, so a resolver
/// behind an `Arc` can be shared by any number of callers; each caller keeps
/// its own active scene in a [`SceneSelector`](crate::selector::SceneSelector).
#[derive(Debug)]
pub struct SceneConfigResolver {
    global: Map<String, Value>,
    scenes: BTreeMap<String, ResolvedSceneConfig>,
}

impl SceneConfigResolver {
    pub fn from_source(source: &dyn ConfigSource, namespace: &str) -> AppResult<Self> {
        let snapshot = source.read(namespace);
        if snapshot.is_none() {
            debug!(namespace, "no jwt configuration found, using built-in defaults");
        }
        Self::from_value(snapshot)
    }

    pub fn from_value(snapshot: Option<Value>) -> AppResult<Self> {
        let mut global = match snapshot {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(AppError::InvalidConfig(format!(
                    "jwt configuration must be a mapping, got {}",
                    other
                )));
            }
        };

        let defaulted = apply_builtin_defaults(&mut global);

        let overrides = match global.remove(SCENE_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(Value::Array(items)) if items.is_empty() => Map::new(),
            Some(other) => {
                return Err(AppError::InvalidConfig(format!(
                    "'scene' must map scene names to settings, got {}",
                    other
                )));
            }
        };

        let mut scenes = BTreeMap::new();
        for (name, override_bag) in overrides {
            let bag = merge(&global, &name, override_bag, &defaulted)?;
            let resolved = ResolvedSceneConfig::new(&name, bag)?;
            debug!(scene = %name, alg = %resolved.alg(), "resolved jwt scene");
            scenes.insert(name, resolved);
        }

        info!(scenes = scenes.len(), "jwt scene configuration loaded");
        Ok(Self { global, scenes })
    }

    /// Normalized global defaults, without the `scene` table.
    pub fn global(&self) -> &Map<String, Value> {
        &self.global
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub fn scene_config(&self, name: &str) -> AppResult<&ResolvedSceneConfig> {
        self.scenes.get(name).ok_or_else(|| {
            warn!(scene = name, "lookup for unconfigured jwt scene");
            AppError::ConfigurationMissing {
                scene: name.to_string(),
            }
        })
    }

    pub fn default_scene_config(&self) -> AppResult<&ResolvedSceneConfig> {
        self.scene_config(DEFAULT_SCENE)
    }

    /// Replaces the entry for `name` with `bag` as given, skipping the merge
    /// with global defaults. The bag must still pass validation.
    pub fn set_scene_config(&mut self, name: &str, bag: Map<String, Value>) -> AppResult<()> {
        let resolved = ResolvedSceneConfig::new(name, bag)?;
        debug!(scene = name, alg = %resolved.alg(), "jwt scene configuration replaced");
        self.scenes.insert(name.to_string(), resolved);
        Ok(())
    }
}

const FAMILY_KEYS: [(&str, &[JwtAlgorithm]); 2] = [
    ("symmetry_algs", &JwtAlgorithm::SYMMETRIC),
    ("asymmetric_algs", &JwtAlgorithm::ASYMMETRIC),
];

/// Fills blank keys with built-ins. Returns the family-set keys that were
/// filled here rather than supplied by the host.
fn apply_builtin_defaults(global: &mut Map<String, Value>) -> Vec<&'static str> {
    if is_blank(global.get("supported_algs")) {
        global.insert(
            "supported_algs".to_string(),
            AlgorithmCatalog::builtin().to_value(),
        );
    }
    let mut defaulted = Vec::new();
    for (key, _) in FAMILY_KEYS {
        if is_blank(global.get(key)) {
            defaulted.push(key);
        }
    }
    fill_family_defaults(global, &defaulted);
    if is_blank(global.get("blacklist_prefix")) {
        global.insert(
            "blacklist_prefix".to_string(),
            Value::String(DEFAULT_BLACKLIST_PREFIX.to_string()),
        );
    }
    defaulted
}

/// Built-in family sets restricted to the bag's own `supported_algs`.
fn fill_family_defaults(bag: &mut Map<String, Value>, keys: &[&str]) {
    let offered = offered_algorithms(bag.get("supported_algs"));
    for (key, builtin) in FAMILY_KEYS {
        if !keys.contains(&key) {
            continue;
        }
        let algs: Vec<JwtAlgorithm> = builtin
            .iter()
            .copied()
            .filter(|alg| offered.contains(alg))
            .collect();
        bag.insert(key.to_string(), algorithm_list_value(&algs));
    }
}

/// Algorithms named by a `supported_algs` value. Unknown names are skipped
/// here and reported when the scene is validated.
fn offered_algorithms(value: Option<&Value>) -> Vec<JwtAlgorithm> {
    let names: Vec<&str> = match value {
        Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    names
        .into_iter()
        .filter_map(|name| name.parse::<JwtAlgorithm>().ok())
        .collect()
}

/// Shallow merge: every key in the override replaces the global value.
/// Family sets the host never supplied are recomputed against the merged
/// catalog, so a scene may narrow `supported_algs` on its own.
fn merge(
    global: &Map<String, Value>,
    scene: &str,
    override_bag: Value,
    defaulted: &[&'static str],
) -> AppResult<Map<String, Value>> {
    let mut merged = global.clone();
    let mut refill = defaulted.to_vec();
    match override_bag {
        Value::Object(map) => {
            refill.retain(|key| is_blank(map.get(*key)));
            merged.extend(map);
        }
        Value::Null => {}
        Value::Array(items) if items.is_empty() => {}
        other => {
            return Err(AppError::InvalidConfig(format!(
                "scene '{}' must be a mapping, got {}",
                scene, other
            )));
        }
    }
    fill_family_defaults(&mut merged, &refill);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver(value: Value) -> SceneConfigResolver {
        SceneConfigResolver::from_value(Some(value)).unwrap()
    }

    #[test]
    fn test_scene_inherits_unoverridden_keys() {
        let r = resolver(json!({
            "secret": "global-secret",
            "ttl": 3600,
            "custom_flag": "on",
            "scene": {
                "admin": {"ttl": 60, "token_prefix": "Admin"},
            },
        }));

        let admin = r.scene_config("admin").unwrap();
        assert_eq!(admin.get("ttl"), Some(&json!(60)));
        assert_eq!(admin.get("token_prefix"), Some(&json!("Admin")));
        assert_eq!(admin.get("secret"), Some(&json!("global-secret")));
        assert_eq!(admin.get("custom_flag"), Some(&json!("on")));
    }

    #[test]
    fn test_override_of_one_key_leaves_others_untouched() {
        let r = resolver(json!({
            "secret": "s",
            "ttl": 100,
            "issuer": "me",
            "scene": {"api": {"ttl": 5}},
        }));

        let api = r.scene_config("api").unwrap();
        for (key, value) in r.global() {
            if key != "ttl" {
                assert_eq!(api.get(key), Some(value), "key {} changed", key);
            }
        }
        assert_eq!(api.bag().len(), r.global().len());
    }

    #[test]
    fn test_scene_table_is_removed_from_global() {
        let r = resolver(json!({"secret": "s", "scene": {"default": {}}}));
        assert!(r.global().get("scene").is_none());
        assert!(r.scene_config("default").unwrap().get("scene").is_none());
    }

    #[test]
    fn test_empty_values_get_builtin_defaults() {
        let r = resolver(json!({
            "secret": "s",
            "supported_algs": {},
            "symmetry_algs": null,
            "asymmetric_algs": [],
            "blacklist_prefix": "",
            "scene": {"default": []},
        }));

        let default = r.default_scene_config().unwrap();
        assert_eq!(
            default.get("supported_algs"),
            Some(&AlgorithmCatalog::builtin().to_value())
        );
        assert_eq!(default.settings().catalog, AlgorithmCatalog::builtin());
        assert_eq!(default.settings().symmetric_algs.len(), 3);
        assert_eq!(default.settings().asymmetric_algs.len(), 6);
        assert_eq!(default.blacklist_prefix(), "webman_admin_jwt");
    }

    #[test]
    fn test_host_values_are_not_replaced() {
        let r = resolver(json!({
            "secret": "s",
            "blacklist_prefix": "myapp",
            "supported_algs": {"HS256": "custom-hmac"},
            "symmetry_algs": ["HS256"],
            "asymmetric_algs": [],
            "scene": {"default": {}},
        }));
        let default = r.default_scene_config().unwrap();
        assert_eq!(default.blacklist_prefix(), "myapp");
        assert_eq!(
            default.settings().catalog.signer_ref(JwtAlgorithm::HS256),
            Some("custom-hmac")
        );
        assert_eq!(default.settings().catalog.len(), 1);
    }

    #[test]
    fn test_default_family_sets_follow_host_catalog() {
        let r = resolver(json!({
            "secret": "s",
            "supported_algs": {"HS256": "hmac-sha256", "RS256": "rsa-sha256"},
            "scene": {"default": {}},
        }));
        assert_eq!(r.global().get("symmetry_algs"), Some(&json!(["HS256"])));
        assert_eq!(r.global().get("asymmetric_algs"), Some(&json!(["RS256"])));
        assert!(r.default_scene_config().is_ok());
    }

    #[test]
    fn test_scene_may_narrow_catalog_on_its_own() {
        let r = resolver(json!({
            "secret": "s",
            "scene": {
                "api": {"supported_algs": {"HS256": "hmac-sha256"}},
                "default": {},
            },
        }));

        let api = r.scene_config("api").unwrap();
        assert_eq!(api.get("symmetry_algs"), Some(&json!(["HS256"])));
        assert_eq!(api.get("asymmetric_algs"), Some(&json!([])));
        assert_eq!(api.settings().catalog.len(), 1);

        let default = r.default_scene_config().unwrap();
        assert_eq!(default.settings().symmetric_algs.len(), 3);
        assert_eq!(default.settings().asymmetric_algs.len(), 6);
    }

    #[test]
    fn test_host_family_sets_are_not_recomputed_per_scene() {
        let result = SceneConfigResolver::from_value(Some(json!({
            "secret": "s",
            "symmetry_algs": ["HS256", "HS384"],
            "scene": {"api": {"supported_algs": ["HS256"]}},
        })));
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_namespace_resolves_no_scenes() {
        let r = SceneConfigResolver::from_value(None).unwrap();
        assert_eq!(r.scene_names().count(), 0);
        assert_eq!(r.global().get("blacklist_prefix"), Some(&json!("webman_admin_jwt")));
        assert!(matches!(
            r.default_scene_config(),
            Err(AppError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn test_absent_scene_table_resolves_no_scenes() {
        let r = resolver(json!({"secret": "s"}));
        assert!(!r.has_scene("default"));
        assert!(r.scene_config("default").is_err());
    }

    #[test]
    fn test_unknown_scene_is_configuration_missing() {
        let r = resolver(json!({"secret": "s", "scene": {"admin": {}}}));
        let err = r.scene_config("nonexistent").unwrap_err();
        assert!(matches!(err, AppError::ConfigurationMissing { ref scene } if scene == "nonexistent"));
    }

    #[test]
    fn test_set_scene_config_replaces_without_merge() {
        let mut r = resolver(json!({
            "secret": "s",
            "ttl": 100,
            "scene": {"admin": {"token_prefix": "Admin"}},
        }));

        let custom = json!({"secret": "other", "token_prefix": "Custom"})
            .as_object()
            .unwrap()
            .clone();
        r.set_scene_config("admin", custom.clone()).unwrap();

        let admin = r.scene_config("admin").unwrap();
        assert_eq!(admin.bag(), &custom);
        assert!(admin.get("ttl").is_none());
        assert!(admin.get("supported_algs").is_none());
    }

    #[test]
    fn test_set_scene_config_adds_new_scene() {
        let mut r = SceneConfigResolver::from_value(None).unwrap();
        let bag = json!({
            "secret": "s",
            "supported_algs": ["HS256"],
            "symmetry_algs": ["HS256"],
        })
        .as_object()
        .unwrap()
        .clone();
        r.set_scene_config("late", bag).unwrap();
        assert!(r.has_scene("late"));
        assert_eq!(r.scene_names().collect::<Vec<_>>(), vec!["late"]);
    }

    #[test]
    fn test_set_scene_config_rejects_invalid_bag() {
        let mut r = resolver(json!({"secret": "s", "scene": {"admin": {}}}));
        let bad = json!({"alg": "NOPE"}).as_object().unwrap().clone();
        assert!(r.set_scene_config("admin", bad).is_err());
        assert!(r.scene_config("admin").unwrap().get("alg").is_none());
    }

    #[test]
    fn test_malformed_shapes_are_rejected() {
        assert!(matches!(
            SceneConfigResolver::from_value(Some(json!("nope"))),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfigResolver::from_value(Some(json!({"scene": "admin"}))),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfigResolver::from_value(Some(json!({"scene": {"admin": 3}}))),
            Err(AppError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_family_mismatch_fails_construction() {
        let result = SceneConfigResolver::from_value(Some(json!({
            "secret": "s",
            "scene": {"api": {"alg": "RS256"}},
        })));
        assert!(matches!(
            result,
            Err(AppError::AlgorithmFamilyMismatch { ref scene, .. }) if scene == "api"
        ));
    }
}
