//! Authorization server configuration.
//!
//! Configuration is read from a TOML file with `IDGATE__`-prefixed
//! environment overrides (e.g. `IDGATE__SESSION__KEY_LIFETIME=2m`).
//!
//! # Example (TOML)
//!
//! ```toml
//! issuer = "https://id.example.com"
//!
//! [session]
//! session_lifetime = "10m"
//! key_lifetime = "5m"
//! clock_skew = "30s"
//!
//! [tokens]
//! id_token_lifetime = "1h"
//!
//! [signing]
//! algorithm = "RS256"
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Upper bound for every configured lifetime and for the clock skew.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// External URL of the provider, used as the `iss` claim.
    pub issuer: String,

    /// Session and single-use key settings.
    pub session: SessionConfig,

    /// Issued token settings.
    pub tokens: TokenConfig,

    /// ID token signing settings.
    pub signing: SigningConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:5556".to_string(),
            session: SessionConfig::default(),
            tokens: TokenConfig::default(),
            signing: SigningConfig::default(),
        }
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long an authentication attempt stays usable.
    #[serde(with = "humantime_serde")]
    pub session_lifetime: Duration,

    /// How long a single-use key (including authorization codes) stays
    /// redeemable.
    #[serde(with = "humantime_serde")]
    pub key_lifetime: Duration,

    /// Tolerance added to every expiry comparison.
    #[serde(with = "humantime_serde")]
    pub clock_skew: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_lifetime: Duration::from_secs(600),
            key_lifetime: Duration::from_secs(300),
            clock_skew: Duration::ZERO,
        }
    }
}

/// Issued token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// ID token validity window (`exp - iat`).
    #[serde(with = "humantime_serde")]
    pub id_token_lifetime: Duration,

    /// Scope whose presence makes the code exchange issue a refresh token.
    pub offline_access_scope: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            id_token_lifetime: Duration::from_secs(3600),
            offline_access_scope: "offline_access".to_string(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "RS256", "RS384"
    pub algorithm: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty or not an absolute URL
    /// - A lifetime is zero
    /// - A lifetime or the clock skew exceeds [`MAX_DURATION`]
    /// - The offline access scope is empty
    /// - The signing algorithm is not supported
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer must not be empty".to_string(),
            ));
        }

        if url::Url::parse(&self.issuer).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "issuer must be an absolute URL, got '{}'",
                self.issuer
            )));
        }

        if self.session.session_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session_lifetime must be > 0".to_string(),
            ));
        }

        if self.session.key_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "key_lifetime must be > 0".to_string(),
            ));
        }

        if self.tokens.id_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "id_token_lifetime must be > 0".to_string(),
            ));
        }

        for (name, value) in [
            ("session_lifetime", self.session.session_lifetime),
            ("key_lifetime", self.session.key_lifetime),
            ("clock_skew", self.session.clock_skew),
            ("id_token_lifetime", self.tokens.id_token_lifetime),
        ] {
            if value > MAX_DURATION {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must not exceed 365 days"
                )));
            }
        }

        if self.tokens.offline_access_scope.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "offline_access_scope must not be empty".to_string(),
            ));
        }

        if !["RS256", "RS384"].contains(&self.signing.algorithm.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported signing algorithm '{}'",
                self.signing.algorithm
            )));
        }

        Ok(())
    }
}

/// Loads configuration from an optional TOML file plus `IDGATE__*`
/// environment overrides, then validates it.
///
/// A missing file is not an error; defaults apply.
///
/// # Errors
///
/// Returns `ConfigError::Load` if a source cannot be parsed and
/// `ConfigError::InvalidValue` if the merged configuration is invalid.
pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path
        && path.exists()
    {
        builder = builder.add_source(File::from(path));
    }

    builder = builder.add_source(
        Environment::with_prefix("IDGATE")
            .try_parsing(true)
            .separator("__"),
    );

    let merged: AuthConfig = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    merged.validate()?;
    Ok(merged)
}
