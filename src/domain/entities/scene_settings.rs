use std::collections::BTreeSet;

use secrecy::SecretString;
use serde_json::{Map, Value};
use time::Duration;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::algorithm::{AlgorithmCatalog, AlgorithmFamily, JwtAlgorithm};

pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer";
pub const DEFAULT_BLACKLIST_PREFIX: &str = "webman_admin_jwt";
pub const DEFAULT_ALGORITHM: JwtAlgorithm = JwtAlgorithm::HS256;
pub const DEFAULT_TTL_SECS: i64 = 7200;
/// Upper bound for any seconds setting (100 years), so `now + ttl + grace`
/// stays far inside `i64`.
pub const MAX_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Absent, null, empty string and empty collections all count as "not configured".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Typed, validated view over one resolved scene bag.
#[derive(Debug)]
pub struct SceneSettings {
    pub scene: String,
    pub alg: JwtAlgorithm,
    pub secret: Option<SecretString>,
    pub public_key: Option<String>,
    pub private_key: Option<SecretString>,
    pub ttl: Duration,
    pub issuer: Option<String>,
    pub leeway_secs: u64,
    pub token_prefix: String,
    pub blacklist_enabled: bool,
    pub blacklist_grace_period: Duration,
    pub blacklist_prefix: String,
    pub catalog: AlgorithmCatalog,
    pub symmetric_algs: BTreeSet<JwtAlgorithm>,
    pub asymmetric_algs: BTreeSet<JwtAlgorithm>,
}

impl SceneSettings {
    pub fn from_bag(scene: &str, bag: &Map<String, Value>) -> AppResult<Self> {
        let fields = Fields { scene, bag };

        let catalog = fields.catalog()?;
        let symmetric_algs =
            fields.family_set("symmetry_algs", AlgorithmFamily::Symmetric, &catalog)?;
        let asymmetric_algs =
            fields.family_set("asymmetric_algs", AlgorithmFamily::Asymmetric, &catalog)?;
        if let Some(shared) = symmetric_algs.intersection(&asymmetric_algs).next() {
            return Err(fields.invalid(format!(
                "{} is listed in both symmetry_algs and asymmetric_algs",
                shared
            )));
        }

        let alg = match fields.string("alg")? {
            Some(raw) => raw
                .parse::<JwtAlgorithm>()
                .map_err(|_| AppError::UnsupportedAlgorithm {
                    scene: scene.to_string(),
                    alg: raw.clone(),
                })?,
            None => DEFAULT_ALGORITHM,
        };
        if !catalog.contains(alg) {
            return Err(AppError::UnsupportedAlgorithm {
                scene: scene.to_string(),
                alg: alg.to_string(),
            });
        }

        let secret = fields.string("secret")?;
        let (public_key, private_key) = fields.key_pair()?;

        let settings = Self {
            scene: scene.to_string(),
            alg,
            secret: secret.map(|s| SecretString::new(s.into())),
            public_key,
            private_key: private_key.map(|s| SecretString::new(s.into())),
            ttl: Duration::seconds(fields.seconds("ttl")?.unwrap_or(DEFAULT_TTL_SECS)),
            issuer: fields.string("issuer")?,
            leeway_secs: fields.seconds("leeway")?.unwrap_or(0) as u64,
            token_prefix: fields
                .string("token_prefix")?
                .unwrap_or_else(|| DEFAULT_TOKEN_PREFIX.to_string()),
            blacklist_enabled: fields.boolean("blacklist_enabled")?.unwrap_or(true),
            blacklist_grace_period: Duration::seconds(
                fields.seconds("blacklist_grace_period")?.unwrap_or(0),
            ),
            blacklist_prefix: fields
                .string("blacklist_prefix")?
                .unwrap_or_else(|| DEFAULT_BLACKLIST_PREFIX.to_string()),
            catalog,
            symmetric_algs,
            asymmetric_algs,
        };
        settings.check_family()?;
        Ok(settings)
    }

    pub fn family(&self) -> AlgorithmFamily {
        self.alg.family()
    }

    fn has_key_pair(&self) -> bool {
        self.public_key.is_some() || self.private_key.is_some()
    }

    fn check_family(&self) -> AppResult<()> {
        let mismatch = |reason: String| AppError::AlgorithmFamilyMismatch {
            scene: self.scene.clone(),
            alg: self.alg.to_string(),
            reason,
        };

        match self.family() {
            AlgorithmFamily::Symmetric => {
                if !self.symmetric_algs.contains(&self.alg) {
                    return Err(mismatch("not listed in symmetry_algs".into()));
                }
                if self.secret.is_none() && self.has_key_pair() {
                    return Err(mismatch(
                        "symmetric algorithm configured with a key pair and no secret".into(),
                    ));
                }
            }
            AlgorithmFamily::Asymmetric => {
                if !self.asymmetric_algs.contains(&self.alg) {
                    return Err(mismatch("not listed in asymmetric_algs".into()));
                }
                if self.secret.is_some() && !self.has_key_pair() {
                    return Err(mismatch(
                        "asymmetric algorithm configured with a shared secret and no key pair"
                            .into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Built-in members of `family` that the catalog actually offers.
pub fn default_family_set(
    family: AlgorithmFamily,
    catalog: &AlgorithmCatalog,
) -> BTreeSet<JwtAlgorithm> {
    let builtin: &[JwtAlgorithm] = match family {
        AlgorithmFamily::Symmetric => &JwtAlgorithm::SYMMETRIC,
        AlgorithmFamily::Asymmetric => &JwtAlgorithm::ASYMMETRIC,
    };
    builtin
        .iter()
        .copied()
        .filter(|alg| catalog.contains(*alg))
        .collect()
}

struct Fields<'a> {
    scene: &'a str,
    bag: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn invalid(&self, msg: String) -> AppError {
        AppError::InvalidConfig(format!("scene '{}': {}", self.scene, msg))
    }

    fn get(&self, key: &str) -> Option<&Value> {
        let value = self.bag.get(key);
        if is_blank(value) { None } else { value }
    }

    fn string(&self, key: &str) -> AppResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(format!("'{}' must be a string, got {}", key, other))),
        }
    }

    fn seconds(&self, key: &str) -> AppResult<Option<i64>> {
        let secs = match self.get(key) {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(other) => {
                return Err(self.invalid(format!("'{}' must be an integer, got {}", key, other)));
            }
        };
        secs.filter(|secs| (0..=MAX_SECONDS).contains(secs))
            .map(Some)
            .ok_or_else(|| {
                self.invalid(format!(
                    "'{}' must be an integer between 0 and {}",
                    key, MAX_SECONDS
                ))
            })
    }

    fn boolean(&self, key: &str) -> AppResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(self.invalid(format!("'{}' must be a boolean", key))),
            },
            Some(Value::Number(n)) => Ok(Some(n.as_f64() != Some(0.0))),
            Some(other) => Err(self.invalid(format!("'{}' must be a boolean, got {}", key, other))),
        }
    }

    fn parse_alg(&self, raw: &str) -> AppResult<JwtAlgorithm> {
        raw.parse::<JwtAlgorithm>()
            .map_err(|_| AppError::UnsupportedAlgorithm {
                scene: self.scene.to_string(),
                alg: raw.to_string(),
            })
    }

    /// Accepts `{"HS256": "hmac-sha256", ...}` or a plain list of identifiers.
    fn catalog(&self) -> AppResult<AlgorithmCatalog> {
        match self.get("supported_algs") {
            None => Ok(AlgorithmCatalog::builtin()),
            Some(Value::Object(map)) => {
                let mut entries = Vec::with_capacity(map.len());
                for (raw, signer) in map {
                    let alg = self.parse_alg(raw)?;
                    let signer = match signer {
                        Value::String(s) if !s.is_empty() => s.clone(),
                        Value::Null | Value::String(_) => alg.signer_ref().to_string(),
                        other => {
                            return Err(self.invalid(format!(
                                "supported_algs.{} must name a signer, got {}",
                                raw, other
                            )));
                        }
                    };
                    entries.push((alg, signer));
                }
                Ok(AlgorithmCatalog::from_entries(entries))
            }
            Some(Value::Array(items)) => {
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    let raw = item
                        .as_str()
                        .ok_or_else(|| self.invalid("supported_algs entries must be strings".into()))?;
                    let alg = self.parse_alg(raw)?;
                    entries.push((alg, alg.signer_ref().to_string()));
                }
                Ok(AlgorithmCatalog::from_entries(entries))
            }
            Some(other) => Err(self.invalid(format!(
                "supported_algs must be a mapping or list, got {}",
                other
            ))),
        }
    }

    fn family_set(
        &self,
        key: &str,
        family: AlgorithmFamily,
        catalog: &AlgorithmCatalog,
    ) -> AppResult<BTreeSet<JwtAlgorithm>> {
        let items = match self.get(key) {
            None => return Ok(default_family_set(family, catalog)),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(self.invalid(format!("'{}' must be a list, got {}", key, other)));
            }
        };

        let mut set = BTreeSet::new();
        for item in items {
            let raw = item
                .as_str()
                .ok_or_else(|| self.invalid(format!("'{}' entries must be strings", key)))?;
            let alg = raw
                .parse::<JwtAlgorithm>()
                .map_err(|e| self.invalid(format!("{}: {}", key, e)))?;
            if alg.family() != family {
                return Err(self.invalid(format!(
                    "{} is not {} but listed in '{}'",
                    alg,
                    family.as_str(),
                    key
                )));
            }
            if !catalog.contains(alg) {
                return Err(self.invalid(format!(
                    "{} is listed in '{}' but missing from supported_algs",
                    alg, key
                )));
            }
            set.insert(alg);
        }
        Ok(set)
    }

    fn key_pair(&self) -> AppResult<(Option<String>, Option<String>)> {
        let keys = match self.get("keys") {
            None => return Ok((None, None)),
            Some(Value::Object(keys)) => keys,
            Some(other) => {
                return Err(self.invalid(format!("'keys' must be a mapping, got {}", other)));
            }
        };
        let pick = |name: &str| -> AppResult<Option<String>> {
            let value = keys.get(name);
            if is_blank(value) {
                return Ok(None);
            }
            value
                .and_then(Value::as_str)
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.invalid(format!("keys.{} must be a PEM string", name)))
        };
        Ok((pick("public")?, pick("private")?))
    }
}
