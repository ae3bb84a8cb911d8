//! JSON Web Key export (RFC 7517) and key identifiers (RFC 7638 thumbprints)
use base64_simd::URL_SAFE_NO_PAD as b64;
use openssl::sha::sha256;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    Algorithm,
    error::KeyError,
};

/// Path of the JWKS document relative to the configured base URL
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Public JSON Web Key
///
/// Only the members needed for the supported algorithms are modeled; `kid` is
/// always the RFC 7638 thumbprint of the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `RSA`, `EC` or `OKP`
    pub kty: String,
    /// Key ID
    pub kid: String,
    /// Intended algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use, `sig` for every exported key
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Curve name for `EC` and `OKP` keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Curve point x-coordinate, or the raw public key for `OKP`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Curve point y-coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    pub(crate) fn rsa(n: &[u8], e: &[u8]) -> Self {
        let (n, e) = (b64.encode_to_string(n), b64.encode_to_string(e));
        let kid = thumbprint(&format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#));
        Self {
            n: Some(n),
            e: Some(e),
            ..Self::empty(Algorithm::RS256, kid)
        }
    }

    pub(crate) fn ec(alg: Algorithm, x: &[u8], y: &[u8]) -> Self {
        let crv = alg.curve().unwrap_or_default();
        let (x, y) = (b64.encode_to_string(x), b64.encode_to_string(y));
        let kid = thumbprint(&format!(
            r#"{{"crv":"{crv}","kty":"EC","x":"{x}","y":"{y}"}}"#
        ));
        Self {
            crv: Some(crv.to_owned()),
            x: Some(x),
            y: Some(y),
            ..Self::empty(alg, kid)
        }
    }

    pub(crate) fn okp(x: &[u8]) -> Self {
        let crv = Algorithm::EdDSA.curve().unwrap_or_default();
        let x = b64.encode_to_string(x);
        let kid = thumbprint(&format!(r#"{{"crv":"{crv}","kty":"OKP","x":"{x}"}}"#));
        Self {
            crv: Some(crv.to_owned()),
            x: Some(x),
            ..Self::empty(Algorithm::EdDSA, kid)
        }
    }

    fn empty(alg: Algorithm, kid: String) -> Self {
        Self {
            kty: alg.key_type().to_owned(),
            kid,
            alg: Some(alg.to_string()),
            key_use: Some("sig".to_owned()),
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Algorithm implied by `kty` and `crv`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidJwk`] when the key type or curve is unsupported, or
    ///   when a declared `alg` disagrees with the key type
    pub fn algorithm(&self) -> Result<Algorithm, KeyError> {
        let implied = match self.kty.as_str() {
            "RSA" => Algorithm::RS256,
            "EC" | "OKP" => self
                .crv
                .as_deref()
                .and_then(Algorithm::from_curve)
                .filter(|alg| alg.key_type() == self.kty)
                .ok_or(KeyError::InvalidJwk("unsupported curve"))?,
            _ => return Err(KeyError::InvalidJwk("unsupported key type")),
        };
        match self.alg.as_deref() {
            Some(declared) if declared != implied.to_string() => {
                Err(KeyError::InvalidJwk("alg does not match key type"))
            }
            _ => Ok(implied),
        }
    }

    pub(crate) fn component(
        value: Option<&str>,
        missing: &'static str,
    ) -> Result<Vec<u8>, KeyError> {
        let value = value.ok_or(KeyError::InvalidJwk(missing))?;
        b64.decode_to_vec(value)
            .map_err(|_| KeyError::InvalidJwk("component is not base64url"))
    }
}

/// JSON Web Key Set document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Published keys
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Finds a key by `kid`
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<T: IntoIterator<Item = Jwk>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// base64url(SHA-256(canonical JWK JSON))
fn thumbprint(canonical: &str) -> String {
    b64.encode_to_string(sha256(canonical.as_bytes()))
}
