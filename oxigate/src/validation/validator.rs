// JUSTIFICATION: using `pub(crate)` makes it immediately obvious that an item
// is not exposed via the public API.
#![allow(clippy::redundant_pub_crate)]
use serde::Deserialize;

use crate::{
    JwtError,
    claims::{
        Aud,
        Exp,
        Iat,
        Iss,
    },
};

/// Trait for implementing custom token validator layers
///
/// Validators run after the signature has been verified, in the order they
/// were added to the pipeline. `now` is read once per verification, so every
/// validator in a run sees the same instant.
///
/// # Example Implementation
///
/// ```rust
/// use oxigate::{
///     claims::Sub,
///     error::JwtError,
///     validation::TokenValidator,
/// };
///
/// /// Rejects tokens issued to a suspended subject
/// struct SuspendedSubjects(Vec<String>);
///
/// impl<H, C: Sub> TokenValidator<H, C> for SuspendedSubjects {
///     fn validate(&self, _: &H, claims: &C, _now: i64) -> Result<(), JwtError> {
///         if self.0.iter().any(|sub| sub == claims.sub()) {
///             Err(JwtError::CustomValidationError("subject suspended"))
///         } else {
///             Ok(())
///         }
///     }
/// }
/// ```
pub trait TokenValidator<H: ?Sized, C: ?Sized> {
    /// Given the `header` and `claims` for a JWT, perform some validation step.
    ///
    /// # Errors
    ///
    /// This method MUST return a [`JwtError`] if the JWT `header` and/or `claims`
    /// do not pass the validation step performed by this [`TokenValidator`]
    /// implementation. (e.g. [`JwtError::Expired`] if `exp` is past `now`).
    fn validate(&self, header: &H, claims: &C, now: i64) -> Result<(), JwtError>;
}

/// Audiences a verifier accepts.
///
/// Deserializes from either a single string ([`AudiencePolicy::Exact`]) or an
/// array of strings ([`AudiencePolicy::AnyOf`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AudiencePolicy {
    /// The token's `aud` must contain this value
    Exact(String),
    /// The token's `aud` must contain at least one of these values
    AnyOf(Vec<String>),
}

impl AudiencePolicy {
    /// Whether a token carrying `aud` is accepted
    pub fn accepts(&self, mut aud: impl Iterator<Item = impl AsRef<str>>) -> bool {
        match self {
            Self::Exact(expected) => aud.any(|value| value.as_ref() == expected),
            Self::AnyOf(accepted) => {
                aud.any(|value| accepted.iter().any(|expected| expected == value.as_ref()))
            }
        }
    }

    /// Value placed in the `aud` claim of issued tokens: the exact audience, or
    /// the first accepted one
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Exact(expected) => Some(expected),
            Self::AnyOf(accepted) => accepted.first().map(String::as_str),
        }
    }
}

impl From<&str> for AudiencePolicy {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_owned())
    }
}

impl From<String> for AudiencePolicy {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<Vec<String>> for AudiencePolicy {
    fn from(value: Vec<String>) -> Self {
        Self::AnyOf(value)
    }
}

pub(crate) struct IssuerValidator {
    expected_issuer: String,
}
impl IssuerValidator {
    pub(crate) const fn new(expected_issuer: String) -> Self {
        Self { expected_issuer }
    }
}
impl<H, C> TokenValidator<H, C> for IssuerValidator
where
    C: Iss,
{
    fn validate(&self, _: &H, claims: &C, _: i64) -> Result<(), JwtError> {
        if claims.iss() == self.expected_issuer {
            Ok(())
        } else {
            Err(JwtError::WrongIssuer)
        }
    }
}

pub(crate) struct AudienceValidator {
    policy: AudiencePolicy,
}
impl AudienceValidator {
    pub(crate) const fn new(policy: AudiencePolicy) -> Self {
        Self { policy }
    }
}
impl<H, C> TokenValidator<H, C> for AudienceValidator
where
    C: Aud,
{
    fn validate(&self, _: &H, claims: &C, _: i64) -> Result<(), JwtError> {
        if self.policy.accepts(claims.aud()) {
            Ok(())
        } else {
            Err(JwtError::WrongAudience)
        }
    }
}

/// Expired iff `now - exp > leeway`; a token is still accepted at exactly
/// `exp + leeway`.
pub(crate) struct ExpirationValidator {
    leeway: i64,
}
impl ExpirationValidator {
    pub(crate) fn new(leeway: u64) -> Self {
        Self {
            leeway: saturating_seconds(leeway),
        }
    }
}
impl<H, C> TokenValidator<H, C> for ExpirationValidator
where
    C: Exp,
{
    fn validate(&self, _: &H, claims: &C, now: i64) -> Result<(), JwtError> {
        if now.saturating_sub(claims.exp()) > self.leeway {
            Err(JwtError::Expired)
        } else {
            Ok(())
        }
    }
}

/// Not yet valid iff `iat - now > leeway`.
pub(crate) struct IssuedAtValidator {
    leeway: i64,
}
impl IssuedAtValidator {
    pub(crate) fn new(leeway: u64) -> Self {
        Self {
            leeway: saturating_seconds(leeway),
        }
    }
}
impl<H, C> TokenValidator<H, C> for IssuedAtValidator
where
    C: Iat,
{
    fn validate(&self, _: &H, claims: &C, now: i64) -> Result<(), JwtError> {
        if claims.iat().saturating_sub(now) > self.leeway {
            Err(JwtError::IssuedInFuture)
        } else {
            Ok(())
        }
    }
}

fn saturating_seconds(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}
