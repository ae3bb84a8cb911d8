//! Request-facing verification: bearer extraction, verification and projection
//! with failures collapsed into [`AuthError`].
use std::{
    fmt,
    marker::PhantomData,
};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{
    auth::AuthHandle,
    error::{
        AuthError,
        JwtError,
    },
};

const BEARER: &str = "bearer";

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively and surrounding whitespace is
/// ignored.
///
/// # Errors
///
/// - [`JwtError::MissingToken`] when the value is not a bearer credential or
///   the token is empty
pub fn extract_bearer(authorization: &str) -> Result<&str, JwtError> {
    let (scheme, token) = authorization
        .trim()
        .split_once(' ')
        .ok_or(JwtError::MissingToken)?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty() {
        Ok(token)
    } else {
        Err(JwtError::MissingToken)
    }
}

/// Per-request entry point projecting verified claims onto `T`.
///
/// Every call loads the current engine from its [`AuthHandle`], so verifiers
/// pick up key rotations without being rebuilt.
pub struct Verifier<T> {
    handle: AuthHandle,
    model: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Verifier<T> {
    /// Verifier over the engine behind `handle`
    #[must_use]
    pub const fn new(handle: AuthHandle) -> Self {
        Self {
            handle,
            model: PhantomData,
        }
    }

    /// Verifies a bare token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] carrying the [`FailureKind`] of the rejection
    ///
    /// [`FailureKind`]: crate::error::FailureKind
    pub fn verify(&self, token: &str) -> Result<T, AuthError> {
        self.handle.verify(token).map_err(reject)
    }

    /// Verifies the token carried by an `Authorization` header value, if any.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] carrying the [`FailureKind`] of the
    ///   rejection, [`FailureKind::MissingCredentials`] when no bearer token
    ///   was presented
    ///
    /// [`FailureKind`]: crate::error::FailureKind
    /// [`FailureKind::MissingCredentials`]: crate::error::FailureKind::MissingCredentials
    pub fn verify_authorization(&self, authorization: Option<&str>) -> Result<T, AuthError> {
        let token = authorization
            .ok_or(JwtError::MissingToken)
            .and_then(extract_bearer)
            .map_err(reject)?;
        self.verify(token)
    }
}

impl<T> Clone for Verifier<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            model: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Verifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("model", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

fn reject(err: JwtError) -> AuthError {
    let kind = err.kind();
    warn!(kind = kind.as_str(), "request unauthenticated");
    AuthError::Unauthenticated(kind)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde::Deserialize;

    use super::extract_bearer;
    use crate::{
        Algorithm,
        auth::{
            AuthHandle,
            JwtAuth,
        },
        crypto::keygen::KeypairGenerator,
        error::{
            AuthError,
            FailureKind,
            JwtError,
        },
    };

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer("  bearer   abc  "), Ok("abc"));
        assert_eq!(extract_bearer("BEARER x"), Ok("x"));
        for value in ["", "Bearer", "Bearer   ", "Basic dXNlcjpwYXNz", "abc.def.ghi"] {
            assert_eq!(extract_bearer(value), Err(JwtError::MissingToken), "{value:?}");
        }
    }

    #[derive(Debug, Deserialize)]
    struct Identity {
        sub: String,
    }

    fn handle() -> AuthHandle {
        let key = KeypairGenerator::generate(Algorithm::EdDSA)
            .unwrap()
            .signing_key(Algorithm::EdDSA)
            .unwrap();
        JwtAuth::builder(key, "http://testapi", "http://testapi")
            .with_expiry(60)
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn failures_are_classified_not_explained() {
        let verifier = handle().verifier::<Identity>();

        let err = verifier.verify("not-a-token").unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(FailureKind::Malformed));
        assert_eq!(err.to_string(), "unauthenticated");

        let err = verifier.verify_authorization(None).unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::MissingCredentials));
    }

    #[test]
    fn authorization_header_flow() {
        let handle = handle();
        let token = handle.load().issue("user-1").unwrap();
        let verifier = handle.verifier::<Identity>();

        let identity = verifier
            .verify_authorization(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(identity.sub, "user-1");

        let err = verifier.verify_authorization(Some(&token)).unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::MissingCredentials));
    }
}
