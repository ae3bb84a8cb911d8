//! TOML configuration for a [`JwtAuth`] engine
//!
//! ```toml
//! algorithm = "ES256"
//! base_url = "https://auth.example.org"
//! issuer = "https://auth.example.org"
//! audience = "https://api.example.org"
//! expiry = 3600
//! leeway = 30
//! private_key_file = "/run/secrets/private_key.pem"
//! ```
use std::{
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
};

use secrecy::{
    ExposeSecret,
    SecretString,
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    Algorithm,
    auth::JwtAuth,
    crypto::{
        PublicKey,
        SigningKey,
    },
    error::KeyError,
    validation::AudiencePolicy,
};

/// Errors raised while loading configuration or the key material it names
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration or key file could not be read
    #[error("failed to read {}", path.display())]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid TOML for [`AuthConfig`]
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),

    /// Neither or both of the inline and file sources were given for a key
    #[error("exactly one of `{0}` and `{0}_file` must be set")]
    KeySource(&'static str),

    /// Key material was rejected
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The configured public key is not the public half of the private key
    #[error("public key does not belong to the private key")]
    KeyPairMismatch,

    /// The configured `key_id` is not the thumbprint of the key
    #[error("key id `{0}` is not the thumbprint of the configured key")]
    KeyIdMismatch(String),

    /// An audience list was configured empty
    #[error("at least one audience must be configured")]
    EmptyAudience,
}

/// Engine configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Signature algorithm
    pub algorithm: Algorithm,
    /// Base URL the JWKS document is published under
    pub base_url: String,
    /// `iss` of issued tokens, and the only issuer accepted
    pub issuer: String,
    /// `aud` of issued tokens and the accepted audiences: a string or a list
    pub audience: AudiencePolicy,
    /// Lifetime of issued tokens, in seconds
    #[serde(default)]
    pub expiry: u64,
    /// Clock skew tolerance, in seconds
    #[serde(default)]
    pub leeway: u64,
    /// Expected `kid`, checked against the key thumbprint when present
    #[serde(default)]
    pub key_id: Option<String>,
    /// Inline private key PEM
    #[serde(default)]
    pub private_key: Option<SecretString>,
    /// Path to the private key PEM
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,
    /// Inline public key PEM, checked against the private key
    #[serde(default)]
    pub public_key: Option<String>,
    /// Path to the public key PEM, checked against the private key
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,
    /// Maximum accepted token length, in bytes
    #[serde(default)]
    pub max_token_size: Option<usize>,
}

impl AuthConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] when `toml` is not a valid configuration
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Reads and parses the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] when the file cannot be read
    /// - [`ConfigError::Parse`] when it is not a valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Loads the private key for the configured algorithm.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::KeySource`] unless exactly one private key source is set
    /// - [`ConfigError::Io`] when the key file cannot be read
    /// - [`ConfigError::Key`] when the key is invalid or of another algorithm
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        let key = match (&self.private_key, &self.private_key_file) {
            (Some(pem), None) => SigningKey::from_pem(pem.expose_secret(), self.algorithm)?,
            (None, Some(path)) => SigningKey::from_pem(read(path)?, self.algorithm)?,
            _ => return Err(ConfigError::KeySource("private_key")),
        };
        Ok(key)
    }

    /// Loads the configured public key, if any.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::KeySource`] when both public key sources are set
    /// - [`ConfigError::Io`] when the key file cannot be read
    /// - [`ConfigError::Key`] when the key is invalid or of another algorithm
    pub fn public_key(&self) -> Result<Option<PublicKey>, ConfigError> {
        let key = match (&self.public_key, &self.public_key_file) {
            (None, None) => None,
            (Some(pem), None) => Some(PublicKey::from_pem(pem, self.algorithm)?),
            (None, Some(path)) => Some(PublicKey::from_pem(read(path)?, self.algorithm)?),
            (Some(_), Some(_)) => return Err(ConfigError::KeySource("public_key")),
        };
        Ok(key)
    }
}

impl JwtAuth {
    /// Builds an engine from `config`, loading and checking its key material.
    ///
    /// # Errors
    ///
    /// - Any error of [`AuthConfig::signing_key`] or [`AuthConfig::public_key`]
    /// - [`ConfigError::KeyPairMismatch`] when the public key is not derived from
    ///   the private key
    /// - [`ConfigError::KeyIdMismatch`] when `key_id` is set to anything but
    ///   the key thumbprint
    /// - [`ConfigError::EmptyAudience`] when `audience` is an empty list
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let signing_key = config.signing_key()?;
        if let Some(public) = config.public_key()?
            && public.kid() != signing_key.kid()
        {
            return Err(ConfigError::KeyPairMismatch);
        }
        if let Some(key_id) = &config.key_id
            && key_id != signing_key.kid()
        {
            return Err(ConfigError::KeyIdMismatch(key_id.clone()));
        }

        let mut builder = Self::builder(signing_key, config.issuer.clone(), config.audience.clone())
            .with_base_url(config.base_url.clone())
            .with_expiry(config.expiry)
            .with_leeway(config.leeway);
        if let Some(size_limit) = config.max_token_size {
            builder = builder.with_max_token_size(size_limit);
        }
        builder.build()
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })
}
