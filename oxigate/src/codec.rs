//! One-shot token codec over a single key pair.
//!
//! [`encode`] and [`decode`] are the building blocks [`JwtAuth`] is made of;
//! use them directly when no engine configuration is wanted.
//!
//! [`JwtAuth`]: crate::auth::JwtAuth
use std::sync::Arc;

use openssl::error::ErrorStack;

use crate::{
    claims::ClaimSet,
    crypto::{
        PublicKey,
        SigningKey,
    },
    encoding::{
        self,
        EncodingError,
    },
    error::JwtError,
    header::{
        JwtHeader,
        TokenHeader,
    },
    validation::{
        AudiencePolicy,
        Clock,
        StaticKeyProvider,
        SystemClock,
        ValidationPipeline,
    },
};

/// Signs `claims` under `header` with `key` and returns the compact token.
///
/// # Errors
///
/// - [`EncodingError::WrongAlgorithm`] when `header` names another algorithm than `key`
/// - [`EncodingError::SigningError`] when the crypto backend fails to sign
pub fn encode(
    header: &JwtHeader,
    claims: &ClaimSet,
    key: &SigningKey,
) -> Result<String, EncodingError<ErrorStack>> {
    encoding::encode(key, header, claims)
}

/// Verifies `token` against `public_key` and returns its claims.
///
/// The accepted algorithm is the one `public_key` was parsed for; the token's
/// `kid` is not consulted. Checks run in the order `exp`, `iss`, `aud`, `iat`,
/// with `leeway` seconds of tolerance on both temporal checks.
///
/// # Errors
///
/// Any [`JwtError`] raised by [`ValidationPipeline::verify`].
pub fn decode(
    token: &str,
    public_key: &PublicKey,
    issuer: &str,
    audience: impl Into<AudiencePolicy>,
    leeway: u64,
) -> Result<ClaimSet, JwtError> {
    decode_with_clock(token, public_key, issuer, audience, leeway, Arc::new(SystemClock))
}

/// [`decode`] with the current time read from `clock`.
///
/// # Errors
///
/// Any [`JwtError`] raised by [`ValidationPipeline::verify`].
pub fn decode_with_clock(
    token: &str,
    public_key: &PublicKey,
    issuer: &str,
    audience: impl Into<AudiencePolicy>,
    leeway: u64,
    clock: Arc<dyn Clock>,
) -> Result<ClaimSet, JwtError> {
    let pipeline = ValidationPipeline::<TokenHeader, ClaimSet, _>::builder(
        StaticKeyProvider::new(public_key.clone()),
        public_key.algorithm(),
    )
    .with_clock(clock)
    .with_expiration_validator(leeway)
    .with_issuer_validator(issuer)
    .with_audience_validator(audience)
    .with_issued_at_validator(leeway)
    .build();
    let (_, claims) = pipeline.verify(token.as_bytes())?;
    Ok(claims)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::{
        decode,
        decode_with_clock,
        encode,
    };
    use crate::{
        Algorithm,
        claims::{
            ClaimSet,
            PresetClaims,
        },
        crypto::{
            SigningKey,
            keygen::KeypairGenerator,
        },
        encoding::EncodingError,
        error::JwtError,
        header::JwtHeader,
        validation::{
            Clock,
            FixedClock,
            SystemClock,
        },
    };

    fn key(alg: Algorithm) -> SigningKey {
        KeypairGenerator::generate(alg)
            .unwrap()
            .signing_key(alg)
            .unwrap()
    }

    fn claims(iat: i64, expiry: u64) -> ClaimSet {
        ClaimSet::new(PresetClaims::new(
            "http://testapi",
            "http://testapi",
            "user",
            iat,
            expiry,
        ))
        .with_claim("name", "Jane")
        .unwrap()
    }

    #[test]
    fn decode_returns_encoded_claims() {
        let key = key(Algorithm::EdDSA);
        let header = JwtHeader::new(Algorithm::EdDSA, "http://testapi", key.kid());
        let claims = claims(SystemClock.now(), 60);

        let token = encode(&header, &claims, &key).unwrap();
        let decoded = decode(
            &token,
            key.public_key(),
            "http://testapi",
            "http://testapi",
            0,
        )
        .unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn header_must_match_key() {
        let key = key(Algorithm::ES256);
        let header = JwtHeader::new(Algorithm::ES256K, "http://testapi", key.kid());
        let err = encode(&header, &claims(0, 0), &key).unwrap_err();
        assert!(matches!(err, EncodingError::WrongAlgorithm));
    }

    #[test]
    fn leeway_boundary() {
        let key = key(Algorithm::ES256);
        let header = JwtHeader::new(Algorithm::ES256, "", key.kid());
        // exp = 1100
        let token = encode(&header, &claims(1000, 100), &key).unwrap();

        let at = |now: i64, leeway: u64| {
            decode_with_clock(
                &token,
                key.public_key(),
                "http://testapi",
                "http://testapi",
                leeway,
                Arc::new(FixedClock::new(now)) as Arc<dyn Clock>,
            )
        };
        assert!(at(1100, 0).is_ok());
        assert_eq!(at(1101, 0).unwrap_err(), JwtError::Expired);
        assert!(at(1130, 30).is_ok());
        assert_eq!(at(1131, 30).unwrap_err(), JwtError::Expired);
        assert_eq!(at(999, 0).unwrap_err(), JwtError::IssuedInFuture);
        assert!(at(999, 1).is_ok());
    }

    #[test]
    fn issuer_and_audience_checked_exactly() {
        let key = key(Algorithm::EdDSA);
        let header = JwtHeader::new(Algorithm::EdDSA, "", key.kid());
        let token = encode(&header, &claims(SystemClock.now(), 60), &key).unwrap();

        let err = decode(&token, key.public_key(), "http://testapi/", "http://testapi", 0);
        assert_eq!(err.unwrap_err(), JwtError::WrongIssuer);
        let err = decode(&token, key.public_key(), "http://testapi", "http://other", 0);
        assert_eq!(err.unwrap_err(), JwtError::WrongAudience);
    }
}
