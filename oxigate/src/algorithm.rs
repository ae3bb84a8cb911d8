use std::{
    fmt::Display,
    str::FromStr,
};

use openssl::nid::Nid;

/// JWS signature algorithm.
///
/// The set is closed: every signing and verification path matches on this tag
/// and there is no open-ended extension point.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Algorithm {
    /// `RSASSA-PKCS1-v1_5` using `SHA-256`
    #[default]
    RS256,

    /// `ECDSA` using `P-256` (`secp256r1`) curve and `SHA-256` digest
    ES256,

    /// `ECDSA` using `secp256k1` curve and `SHA-256` digest
    ES256K,

    // Ref: https://www.ietf.org/archive/id/draft-ietf-jose-fully-specified-algorithms-13.html#name-fully-specified-jose-algori
    /// `EdDSA` using Ed25519 curve
    EdDSA,
}

impl Algorithm {
    /// Every supported algorithm, in declaration order.
    pub const ALL: [Self; 4] = [Self::RS256, Self::ES256, Self::ES256K, Self::EdDSA];

    /// JWK `kty` (key type) for keys of this algorithm family.
    #[must_use]
    pub const fn key_type(self) -> &'static str {
        match self {
            Self::RS256 => "RSA",
            Self::ES256 | Self::ES256K => "EC",
            Self::EdDSA => "OKP",
        }
    }

    /// JWK `crv` (curve) for curve-based algorithms.
    #[must_use]
    pub const fn curve(self) -> Option<&'static str> {
        match self {
            Self::RS256 => None,
            Self::ES256 => Some("P-256"),
            Self::ES256K => Some("secp256k1"),
            Self::EdDSA => Some("Ed25519"),
        }
    }

    pub(crate) const fn ec_nid(self) -> Option<Nid> {
        match self {
            Self::ES256 => Some(Nid::X9_62_PRIME256V1),
            Self::ES256K => Some(Nid::SECP256K1),
            Self::RS256 | Self::EdDSA => None,
        }
    }

    pub(crate) fn from_ec_nid(nid: Nid) -> Option<Self> {
        match nid {
            Nid::X9_62_PRIME256V1 => Some(Self::ES256),
            Nid::SECP256K1 => Some(Self::ES256K),
            _ => None,
        }
    }

    pub(crate) fn from_curve(crv: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.curve() == Some(crv))
    }

    /// Exact signature length in bytes for the fixed-size families.
    pub(crate) const fn fixed_siglen(self) -> Option<usize> {
        match self {
            Self::ES256 | Self::ES256K | Self::EdDSA => Some(64),
            Self::RS256 => None,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RS256 => write!(f, "RS256"),
            Self::ES256 => write!(f, "ES256"),
            Self::ES256K => write!(f, "ES256K"),
            Self::EdDSA => write!(f, "EdDSA"),
        }
    }
}

/// Error returned when parsing an algorithm name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.to_string() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_owned()))
    }
}
