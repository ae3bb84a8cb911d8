//! Token signing and compact serialization
use base64_simd::URL_SAFE_NO_PAD as b64;
use serde::Serialize;
use thiserror::Error;

use crate::{
    Algorithm,
    header::Alg,
};

/// JWT `Signer`, implemented on private key material.
pub trait Signer {
    /// Crypto backend error type wrapped by [`EncodingError::SigningError`]
    type Error: std::error::Error;

    /// The single algorithm this key signs with
    fn alg(&self) -> Algorithm;

    /// Exact size, in bytes, of the signatures produced by this key
    fn siglen(&self) -> usize;

    /// Signs the JWS signing input (`BASE64URL(header) || '.' || BASE64URL(payload)`)
    ///
    /// # Errors
    ///
    /// Any crypto backend failure while computing the signature.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// Errors that may be returned while encoding and signing a token
#[derive(Debug, Error)]
pub enum EncodingError<E>
where
    E: std::error::Error,
{
    /// Error raised when the JWT header cannot be serialized
    #[error("header could not be serialized")]
    HeaderSerialization(#[source] serde_json::Error),

    /// Error raised when the JWT claims cannot be serialized
    #[error("claims could not be serialized")]
    ClaimsSerialization(#[source] serde_json::Error),

    /// Error raised when the header `alg` does not match the signing key
    #[error("header 'alg' field did not match signing key algorithm")]
    WrongAlgorithm,

    /// Crypto backend failure while signing
    #[error("signing error")]
    SigningError(#[from] E),
}

/// Signs and encodes a JWT with the given `key`, `header`, and `claims`
///
/// # Errors
///
/// - [`EncodingError::WrongAlgorithm`] if the `header` algorithm is not the key algorithm
/// - [`EncodingError::HeaderSerialization`] when `header` cannot be serialized to JSON
/// - [`EncodingError::ClaimsSerialization`] when `claims` cannot be serialized to JSON
/// - [`EncodingError::SigningError`] when the key fails to sign
pub fn encode<H, C, S>(key: &S, header: &H, claims: &C) -> Result<String, EncodingError<S::Error>>
where
    S: Signer,
    H: Serialize + Alg,
    C: Serialize,
{
    if header.alg() != Some(key.alg()) {
        return Err(EncodingError::WrongAlgorithm);
    }

    let serialized_header =
        serde_json::to_vec(header).map_err(EncodingError::HeaderSerialization)?;
    let serialized_claims =
        serde_json::to_vec(claims).map_err(EncodingError::ClaimsSerialization)?;

    let mut jwt = String::with_capacity(
        b64.encoded_length(serialized_header.len())
            + 1
            + b64.encoded_length(serialized_claims.len())
            + 1
            + b64.encoded_length(key.siglen()),
    );

    #[cfg(debug_assertions)]
    let initial_cap = jwt.capacity();

    b64.encode_append(serialized_header, &mut jwt);
    jwt.push('.');
    b64.encode_append(serialized_claims, &mut jwt);
    let signature = key.sign(jwt.as_bytes())?;
    jwt.push('.');
    b64.encode_append(signature, &mut jwt);

    #[cfg(debug_assertions)]
    debug_assert_eq!(initial_cap, jwt.capacity());

    Ok(jwt)
}
