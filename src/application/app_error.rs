use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No configuration resolved for scene '{scene}'")]
    ConfigurationMissing { scene: String },

    #[error("Scene '{scene}': unsupported algorithm '{alg}'")]
    UnsupportedAlgorithm { scene: String, alg: String },

    #[error("Scene '{scene}': algorithm {alg} does not fit its configuration: {reason}")]
    AlgorithmFamilyMismatch {
        scene: String,
        alg: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scene '{scene}': missing key material '{key}'")]
    MissingKey { scene: String, key: &'static str },

    #[error("No signer backend available for {0}")]
    SignerUnavailable(String),

    #[error("Token was issued for scene '{actual}', expected '{expected}'")]
    SceneMismatch { expected: String, actual: String },

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Blacklist store error: {0}")]
    Blacklist(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    ConfigurationMissing,
    UnsupportedAlgorithm,
    AlgorithmFamilyMismatch,
    InvalidConfig,
    MissingKey,
    SignerUnavailable,
    SceneMismatch,
    Revoked,
    InvalidToken,
    StoreError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationMissing => "CONFIGURATION_MISSING",
            ErrorCode::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            ErrorCode::AlgorithmFamilyMismatch => "ALGORITHM_FAMILY_MISMATCH",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::MissingKey => "MISSING_KEY",
            ErrorCode::SignerUnavailable => "SIGNER_UNAVAILABLE",
            ErrorCode::SceneMismatch => "SCENE_MISMATCH",
            ErrorCode::Revoked => "REVOKED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::StoreError => "STORE_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ConfigurationMissing { .. } => ErrorCode::ConfigurationMissing,
            AppError::UnsupportedAlgorithm { .. } => ErrorCode::UnsupportedAlgorithm,
            AppError::AlgorithmFamilyMismatch { .. } => ErrorCode::AlgorithmFamilyMismatch,
            AppError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            AppError::MissingKey { .. } => ErrorCode::MissingKey,
            AppError::SignerUnavailable(_) => ErrorCode::SignerUnavailable,
            AppError::SceneMismatch { .. } => ErrorCode::SceneMismatch,
            AppError::Revoked => ErrorCode::Revoked,
            AppError::Token(_) => ErrorCode::InvalidToken,
            AppError::Blacklist(_) => ErrorCode::StoreError,
        }
    }

    /// Errors raised while resolving configuration, as opposed to per-token failures.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ConfigurationMissing
                | ErrorCode::UnsupportedAlgorithm
                | ErrorCode::AlgorithmFamilyMismatch
                | ErrorCode::InvalidConfig
                | ErrorCode::MissingKey
                | ErrorCode::SignerUnavailable
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
