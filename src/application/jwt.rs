use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::resolver::{ResolvedSceneConfig, SceneConfigResolver};
use crate::domain::entities::algorithm::{AlgorithmFamily, JwtAlgorithm};
use crate::domain::entities::scene_settings::SceneSettings;

/// Claim names managed here; extra claims may not override them.
const RESERVED_CLAIMS: [&str; 7] = ["sub", "iat", "nbf", "exp", "jti", "iss", "jwt_scene"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Token identifier, also the blacklist key suffix.
    pub jti: String,
    /// Scene the token was issued under.
    pub jwt_scene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_prefix: String,
    pub expires_in: i64,
    pub claims: Claims,
}

#[derive(Debug, Deserialize)]
struct SceneClaim {
    jwt_scene: String,
}

fn signer(settings: &SceneSettings) -> AppResult<Algorithm> {
    settings
        .alg
        .signer()
        .ok_or_else(|| AppError::SignerUnavailable(settings.alg.to_string()))
}

fn is_rsa(alg: JwtAlgorithm) -> bool {
    matches!(
        alg,
        JwtAlgorithm::RS256 | JwtAlgorithm::RS384 | JwtAlgorithm::RS512
    )
}

fn missing(settings: &SceneSettings, key: &'static str) -> AppError {
    AppError::MissingKey {
        scene: settings.scene.clone(),
        key,
    }
}

fn encoding_key(settings: &SceneSettings) -> AppResult<EncodingKey> {
    match settings.family() {
        AlgorithmFamily::Symmetric => {
            let secret = settings.secret.as_ref().ok_or_else(|| missing(settings, "secret"))?;
            Ok(EncodingKey::from_secret(secret.expose_secret().as_bytes()))
        }
        AlgorithmFamily::Asymmetric => {
            let pem = settings
                .private_key
                .as_ref()
                .ok_or_else(|| missing(settings, "keys.private"))?;
            let pem = pem.expose_secret().as_bytes();
            let key = if is_rsa(settings.alg) {
                EncodingKey::from_rsa_pem(pem)?
            } else {
                EncodingKey::from_ec_pem(pem)?
            };
            Ok(key)
        }
    }
}

fn decoding_key(settings: &SceneSettings) -> AppResult<DecodingKey> {
    match settings.family() {
        AlgorithmFamily::Symmetric => {
            let secret = settings.secret.as_ref().ok_or_else(|| missing(settings, "secret"))?;
            Ok(DecodingKey::from_secret(secret.expose_secret().as_bytes()))
        }
        AlgorithmFamily::Asymmetric => {
            let pem = settings
                .public_key
                .as_ref()
                .ok_or_else(|| missing(settings, "keys.public"))?;
            let key = if is_rsa(settings.alg) {
                DecodingKey::from_rsa_pem(pem.as_bytes())?
            } else {
                DecodingKey::from_ec_pem(pem.as_bytes())?
            };
            Ok(key)
        }
    }
}

/// Issue a token for `subject` under the given scene.
///
/// Keys of `extra` that collide with managed claims are dropped.
pub fn issue(
    config: &ResolvedSceneConfig,
    subject: &str,
    mut extra: Map<String, Value>,
) -> AppResult<IssuedToken> {
    let settings = config.settings();
    let alg = signer(settings)?;
    let key = encoding_key(settings)?;

    for name in RESERVED_CLAIMS {
        extra.remove(name);
    }

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let expires_in = settings.ttl.whole_seconds();
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        nbf: now,
        exp: now.saturating_add(expires_in),
        jti: Uuid::new_v4().to_string(),
        jwt_scene: config.name().to_string(),
        iss: settings.issuer.clone(),
        extra,
    };

    let token = encode(&Header::new(alg), &claims, &key)?;
    Ok(IssuedToken {
        token,
        token_prefix: settings.token_prefix.clone(),
        expires_in,
        claims,
    })
}

/// Verify a token against the given scene, including that it was issued for it.
pub fn verify(config: &ResolvedSceneConfig, token: &str) -> AppResult<Claims> {
    let settings = config.settings();
    let alg = signer(settings)?;
    let key = decoding_key(settings)?;

    let mut validation = Validation::new(alg);
    validation.leeway = settings.leeway_secs;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
    if let Some(issuer) = &settings.issuer {
        validation.set_issuer(&[issuer]);
    }

    let claims = decode::<Claims>(token, &key, &validation)?.claims;
    if claims.jwt_scene != config.name() {
        return Err(AppError::SceneMismatch {
            expected: config.name().to_string(),
            actual: claims.jwt_scene,
        });
    }
    Ok(claims)
}

/// Read the scene claim without verifying the token.
///
/// Only use the result to choose which scene to verify against.
pub fn peek_scene(token: &str) -> AppResult<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<SceneClaim>(token, &DecodingKey::from_secret(b"ignored"), &validation)?;
    Ok(data.claims.jwt_scene)
}

/// Verify a token against whichever scene it claims to belong to.
pub fn verify_with_resolver(resolver: &SceneConfigResolver, token: &str) -> AppResult<Claims> {
    let scene = peek_scene(token)?;
    verify(resolver.scene_config(&scene)?, token)
}
