use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signing algorithms a scene may be configured with.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    HS256,
    HS384,
    HS512,
    ES256,
    ES384,
    ES512,
    RS256,
    RS384,
    RS512,
}

/// Shared secret (HMAC) vs key pair (RSA/ECDSA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    Symmetric,
    Asymmetric,
}

impl AlgorithmFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmFamily::Symmetric => "symmetric",
            AlgorithmFamily::Asymmetric => "asymmetric",
        }
    }
}

impl JwtAlgorithm {
    pub const ALL: [JwtAlgorithm; 9] = [
        JwtAlgorithm::HS256,
        JwtAlgorithm::HS384,
        JwtAlgorithm::HS512,
        JwtAlgorithm::ES256,
        JwtAlgorithm::ES384,
        JwtAlgorithm::ES512,
        JwtAlgorithm::RS256,
        JwtAlgorithm::RS384,
        JwtAlgorithm::RS512,
    ];

    pub const SYMMETRIC: [JwtAlgorithm; 3] =
        [JwtAlgorithm::HS256, JwtAlgorithm::HS384, JwtAlgorithm::HS512];

    pub const ASYMMETRIC: [JwtAlgorithm; 6] = [
        JwtAlgorithm::RS256,
        JwtAlgorithm::RS384,
        JwtAlgorithm::RS512,
        JwtAlgorithm::ES256,
        JwtAlgorithm::ES384,
        JwtAlgorithm::ES512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JwtAlgorithm::HS256 => "HS256",
            JwtAlgorithm::HS384 => "HS384",
            JwtAlgorithm::HS512 => "HS512",
            JwtAlgorithm::ES256 => "ES256",
            JwtAlgorithm::ES384 => "ES384",
            JwtAlgorithm::ES512 => "ES512",
            JwtAlgorithm::RS256 => "RS256",
            JwtAlgorithm::RS384 => "RS384",
            JwtAlgorithm::RS512 => "RS512",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            JwtAlgorithm::HS256 | JwtAlgorithm::HS384 | JwtAlgorithm::HS512 => {
                AlgorithmFamily::Symmetric
            }
            _ => AlgorithmFamily::Asymmetric,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.family() == AlgorithmFamily::Symmetric
    }

    /// Name of the signer implementation recorded in the catalog.
    pub fn signer_ref(&self) -> &'static str {
        match self {
            JwtAlgorithm::HS256 => "hmac-sha256",
            JwtAlgorithm::HS384 => "hmac-sha384",
            JwtAlgorithm::HS512 => "hmac-sha512",
            JwtAlgorithm::ES256 => "ecdsa-sha256",
            JwtAlgorithm::ES384 => "ecdsa-sha384",
            JwtAlgorithm::ES512 => "ecdsa-sha512",
            JwtAlgorithm::RS256 => "rsa-sha256",
            JwtAlgorithm::RS384 => "rsa-sha384",
            JwtAlgorithm::RS512 => "rsa-sha512",
        }
    }

    /// The `jsonwebtoken` signer backing this algorithm.
    /// ES512 has no backend there and returns `None`.
    pub fn signer(&self) -> Option<jsonwebtoken::Algorithm> {
        use jsonwebtoken::Algorithm;
        match self {
            JwtAlgorithm::HS256 => Some(Algorithm::HS256),
            JwtAlgorithm::HS384 => Some(Algorithm::HS384),
            JwtAlgorithm::HS512 => Some(Algorithm::HS512),
            JwtAlgorithm::ES256 => Some(Algorithm::ES256),
            JwtAlgorithm::ES384 => Some(Algorithm::ES384),
            JwtAlgorithm::ES512 => None,
            JwtAlgorithm::RS256 => Some(Algorithm::RS256),
            JwtAlgorithm::RS384 => Some(Algorithm::RS384),
            JwtAlgorithm::RS512 => Some(Algorithm::RS512),
        }
    }
}

impl std::fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JwtAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        JwtAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str() == upper)
            .ok_or_else(|| format!("Unknown JWT algorithm: {}", s))
    }
}

/// Algorithm identifier to signer implementation reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmCatalog {
    entries: BTreeMap<JwtAlgorithm, String>,
}

impl AlgorithmCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: JwtAlgorithm::ALL
                .into_iter()
                .map(|alg| (alg, alg.signer_ref().to_string()))
                .collect(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (JwtAlgorithm, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn contains(&self, alg: JwtAlgorithm) -> bool {
        self.entries.contains_key(&alg)
    }

    pub fn signer_ref(&self, alg: JwtAlgorithm) -> Option<&str> {
        self.entries.get(&alg).map(String::as_str)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = JwtAlgorithm> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The catalog in the shape hosts write it in configuration.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(alg, signer)| (alg.as_str().to_string(), Value::String(signer.clone())))
            .collect();
        Value::Object(map)
    }
}

impl Default for AlgorithmCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn algorithm_list_value(algs: &[JwtAlgorithm]) -> Value {
    Value::Array(
        algs.iter()
            .map(|alg| Value::String(alg.as_str().to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_nine_entries() {
        let catalog = AlgorithmCatalog::builtin();
        assert_eq!(catalog.len(), 9);
        for alg in JwtAlgorithm::ALL {
            assert!(catalog.contains(alg));
        }
    }

    #[test]
    fn test_family_sets_are_disjoint_and_cover_catalog() {
        for alg in JwtAlgorithm::SYMMETRIC {
            assert!(alg.is_symmetric());
            assert!(!JwtAlgorithm::ASYMMETRIC.contains(&alg));
        }
        for alg in JwtAlgorithm::ASYMMETRIC {
            assert_eq!(alg.family(), AlgorithmFamily::Asymmetric);
        }
        assert_eq!(
            JwtAlgorithm::SYMMETRIC.len() + JwtAlgorithm::ASYMMETRIC.len(),
            JwtAlgorithm::ALL.len()
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("HS256".parse::<JwtAlgorithm>().unwrap(), JwtAlgorithm::HS256);
        assert_eq!("rs512".parse::<JwtAlgorithm>().unwrap(), JwtAlgorithm::RS512);
        assert!("HS1".parse::<JwtAlgorithm>().is_err());
        assert!("PS256".parse::<JwtAlgorithm>().is_err());
        assert!("".parse::<JwtAlgorithm>().is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        for alg in JwtAlgorithm::ALL {
            assert_eq!(format!("{}", alg), alg.as_str());
        }
    }

    #[test]
    fn test_es512_has_no_signer_backend() {
        assert_eq!(JwtAlgorithm::ES512.signer(), None);
        assert_eq!(
            JwtAlgorithm::ES256.signer(),
            Some(jsonwebtoken::Algorithm::ES256)
        );
    }

    #[test]
    fn test_catalog_value_shape() {
        let value = AlgorithmCatalog::builtin().to_value();
        assert_eq!(value["HS256"], "hmac-sha256");
        assert_eq!(value["ES384"], "ecdsa-sha384");
        assert_eq!(value.as_object().unwrap().len(), 9);
    }
}
