use serde::{
    Deserialize,
    Serialize,
};
use serde_with::{
    OneOrMany,
    formats::PreferOne,
    serde_as,
};
use uuid::Uuid;

use crate::claims::{
    Aud,
    Exp,
    Iat,
    Iss,
    Jti,
    Sub,
};

/// `aud` claim value.
///
/// Serialized as a bare string when it holds a single audience, and accepted
/// as either a string or an array when read back.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Audience(#[serde_as(as = "OneOrMany<_, PreferOne>")] Vec<String>);

impl Audience {
    /// Audience values in declaration order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `audience` is one of the values
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        self.values().any(|aud| aud == audience)
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Self(vec![value.to_owned()])
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for Audience {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// Registered claims stamped on every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetClaims {
    iss: String,
    aud: Audience,
    sub: String,
    iat: i64,
    exp: i64,
    jti: String,
}

impl PresetClaims {
    /// Creates the registered claims for a token issued at `iat` that lives for
    /// `expiry` seconds. `jti` is a fresh random UUID.
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<Audience>,
        subject: impl Into<String>,
        iat: i64,
        expiry: u64,
    ) -> Self {
        let lifetime = i64::try_from(expiry).unwrap_or(i64::MAX);
        Self {
            iss: issuer.into(),
            aud: audience.into(),
            sub: subject.into(),
            iat,
            exp: iat.saturating_add(lifetime),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Replaces the generated `jti` with a caller-chosen token id
    #[must_use]
    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = jti.into();
        self
    }

    /// Full `aud` value
    #[must_use]
    pub const fn audience(&self) -> &Audience {
        &self.aud
    }
}

impl Iss for PresetClaims {
    fn iss(&self) -> &str {
        &self.iss
    }
}

impl Sub for PresetClaims {
    fn sub(&self) -> &str {
        &self.sub
    }
}

impl Aud for PresetClaims {
    fn aud(&self) -> impl Iterator<Item = impl AsRef<str>> {
        self.aud.values()
    }
}

impl Exp for PresetClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

impl Iat for PresetClaims {
    fn iat(&self) -> i64 {
        self.iat
    }
}

impl Jti for PresetClaims {
    fn jti(&self) -> &str {
        &self.jti
    }
}
