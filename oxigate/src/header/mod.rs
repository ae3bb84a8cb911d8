//! JWS header types for issued and presented tokens
mod rfc7515;

use serde::{
    Deserialize,
    Serialize,
};

pub use rfc7515::{
    Alg,
    Kid,
};

use crate::{
    Algorithm,
    jwks::JWKS_PATH,
};

/// Header attached to every token issued by an engine.
///
/// Built once from the configured key material and shared read-only by the
/// issuance path, the verification path, and JWKS discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JwtHeader {
    alg: Algorithm,
    typ: &'static str,
    kid: String,
    jku: String,
    #[serde(skip)]
    base_url: String,
}

impl JwtHeader {
    /// Creates a header for `algorithm` and `key_id`, with `jku` pointing at the
    /// JWKS document published under `base_url`.
    #[must_use]
    pub fn new(
        algorithm: Algorithm,
        base_url: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let jku = format!("{}{JWKS_PATH}", base_url.trim_end_matches('/'));
        Self {
            alg: algorithm,
            typ: "JWT",
            kid: key_id.into(),
            jku,
            base_url,
        }
    }

    /// Configured signing algorithm
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// Key identifier of the signing key
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.kid
    }

    /// Base URL the JWKS reference was derived from
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute address of the JWKS document (`jku` header parameter)
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jku
    }
}

impl Alg for JwtHeader {
    fn alg(&self) -> Option<Algorithm> {
        Some(self.alg)
    }
}

impl Kid for JwtHeader {
    fn kid(&self) -> Option<&str> {
        Some(&self.kid)
    }
}

/// Header as read from a presented token.
///
/// `alg` is kept as the raw string so that algorithms outside the supported set
/// surface as an algorithm mismatch instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    typ: Option<String>,
    #[serde(default)]
    jku: Option<String>,
}

impl TokenHeader {
    /// `alg` exactly as declared by the token
    #[must_use]
    pub fn declared_alg(&self) -> &str {
        &self.alg
    }

    /// `typ` header parameter, if present
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// `jku` header parameter, if present. Never used to fetch keys.
    #[must_use]
    pub fn jku(&self) -> Option<&str> {
        self.jku.as_deref()
    }
}

impl Alg for TokenHeader {
    fn alg(&self) -> Option<Algorithm> {
        self.alg.parse().ok()
    }
}

impl Kid for TokenHeader {
    fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }
}
