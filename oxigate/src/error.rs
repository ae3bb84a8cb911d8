use std::fmt::Display;

use thiserror::Error;

/// Errors raised during JWT decoding and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    /// Error raised when JWT is larger than the configured size limit
    #[error("jwt was above set size threshold")]
    OverSizeThreshold,

    /// Error raised when JWT contains an invalid number of dot-delimited sections
    #[error("jwt contained wrong number of dot-delimited sections")]
    InvalidSectionCount(#[from] SplitError),

    /// Error raised when a JWT section is not valid base64 url-safe encoded
    #[error("jwt must use base64 url safe encoding")]
    InvalidEncoding,

    /// Error raised when JWT header cannot be deserialized from JSON into the target type
    #[error("header could not be deserialized")]
    HeaderDeserialization,

    /// Error raised when JWT claims cannot be deserialized from JSON into the target type
    #[error("claims could not be deserialized")]
    ClaimsDeserialization,

    /// Error raised when the `alg` header field, or the algorithm of the resolved
    /// key, does not match the algorithm the verifier was configured with
    #[error("jwt 'alg' header field did not match the configured algorithm")]
    WrongAlgorithm,

    /// Error raised by a key provider when no key is bound to the token's `kid`
    #[error("verification key not found in keystore")]
    VerificationKeyNotFound,

    /// Error raised when the signature does not verify under the resolved key
    #[error("invalid signature")]
    InvalidSignature,

    /// Error raised when the crypto backend fails while handling the key itself
    #[error("signature validation was unable to be performed with provided key")]
    KeyError,

    /// Error raised when `exp` (Expiration Time) indicates the JWT is expired
    #[error("jwt 'exp' claim indicates token is expired")]
    Expired,

    /// Error raised when `iat` (Issued At) lies in the future beyond the leeway
    #[error("jwt 'iat' claim indicates token was issued in the future")]
    IssuedInFuture,

    /// Error raised when `iss` (Issuer) does not equal the expected issuer
    #[error("jwt 'iss' claim did not match expected issuer")]
    WrongIssuer,

    /// Error raised when `aud` (Audience) does not contain an accepted audience
    #[error("jwt 'aud' claim did not contain expected audience")]
    WrongAudience,

    /// Error raised when validated claims cannot be projected onto the target type
    #[error("claims did not match the projection schema")]
    ClaimProjection,

    /// Error raised when no bearer token was presented
    #[error("no bearer token was presented")]
    MissingToken,

    /// Generic error raised by any custom [`TokenValidator`]
    ///
    /// [`TokenValidator`]: crate::validation::TokenValidator
    #[error("custom field validation error")]
    CustomValidationError(&'static str),
}

impl JwtError {
    /// Classifies the error into the failure taxonomy exposed for logging and metrics.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::OverSizeThreshold
            | Self::InvalidSectionCount(_)
            | Self::InvalidEncoding
            | Self::HeaderDeserialization
            | Self::ClaimsDeserialization => FailureKind::Malformed,
            Self::WrongAlgorithm => FailureKind::AlgorithmMismatch,
            Self::VerificationKeyNotFound => FailureKind::UnknownKey,
            Self::InvalidSignature | Self::KeyError => FailureKind::InvalidSignature,
            Self::CustomValidationError(_) => FailureKind::ClaimRejected,
            Self::Expired => FailureKind::Expired,
            Self::IssuedInFuture => FailureKind::NotYetValid,
            Self::WrongIssuer => FailureKind::IssuerMismatch,
            Self::WrongAudience => FailureKind::AudienceMismatch,
            Self::ClaimProjection => FailureKind::ClaimProjection,
            Self::MissingToken => FailureKind::MissingCredentials,
        }
    }
}

/// Errors raised during compact-encoded JWT split process
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
    /// Error raised when compact-encoded JWS contains less than three sections
    #[error("token contained less than three sections")]
    Undersized,

    /// Error raised when compact-encoded JWS contains more than three sections
    #[error("token contained more than three sections")]
    Oversized,
}

/// Classified verification failure.
///
/// This is the only detail of a rejected token that leaves the engine; it is
/// meant for logs and metrics, never for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Token structure, encoding, or JSON is invalid
    Malformed,
    /// Header algorithm differs from the configured algorithm
    AlgorithmMismatch,
    /// No trusted key is bound to the token's `kid`
    UnknownKey,
    /// Signature does not verify
    InvalidSignature,
    /// `exp` is in the past by more than the leeway
    Expired,
    /// `iat` is in the future by more than the leeway
    NotYetValid,
    /// `iss` differs from the expected issuer
    IssuerMismatch,
    /// `aud` does not contain the expected audience
    AudienceMismatch,
    /// A custom claim validator rejected the token
    ClaimRejected,
    /// Claims do not fit the caller's projection type
    ClaimProjection,
    /// No bearer token was presented
    MissingCredentials,
}

impl FailureKind {
    /// Stable snake-case label, suitable as a log field or metric tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::UnknownKey => "unknown_key",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::AudienceMismatch => "audience_mismatch",
            Self::ClaimRejected => "claim_rejected",
            Self::ClaimProjection => "claim_projection",
            Self::MissingCredentials => "missing_credentials",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while generating, parsing, or exporting key material
#[derive(Debug, Error)]
pub enum KeyError {
    /// The crypto backend failed to generate a key pair
    #[error("key generation failed")]
    Generation(#[source] openssl::error::ErrorStack),

    /// The PEM document could not be parsed as a key
    #[error("key is not a valid PEM encoded key")]
    InvalidPem(#[source] openssl::error::ErrorStack),

    /// The key is of a type, size, or curve outside the supported algorithms
    #[error("key type is not supported")]
    UnsupportedKey,

    /// The key family does not match the configured algorithm
    #[error("key is a {found} key but {expected} was configured")]
    AlgorithmMismatch {
        /// Configured algorithm
        expected: crate::Algorithm,
        /// Algorithm implied by the key
        found: crate::Algorithm,
    },

    /// A JWK could not be converted to a key
    #[error("invalid jwk: {0}")]
    InvalidJwk(&'static str),

    /// The crypto backend failed while exporting public key components
    #[error("key export failed")]
    Export(#[source] openssl::error::ErrorStack),

    /// Reading or writing key files failed
    #[error("key file i/o failed")]
    Io(#[from] std::io::Error),
}

/// Errors raised while assembling a claim set
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    /// A custom claim uses a registered claim name
    #[error("custom claim '{0}' collides with a registered claim")]
    ReservedClaim(String),

    /// Custom claims did not serialize to a JSON object
    #[error("custom claims must serialize to a JSON object")]
    NotAnObject,
}

/// Errors raised while issuing a token
#[derive(Debug, Error)]
pub enum IssueError {
    /// Custom claims were rejected
    #[error(transparent)]
    Claims(#[from] ClaimsError),

    /// Serializing or signing the token failed
    #[error(transparent)]
    Encoding(#[from] crate::encoding::EncodingError<openssl::error::ErrorStack>),
}

/// Boundary error handed to the request-handling layer.
///
/// [`Display`] never reveals why a token was rejected; use [`AuthError::kind`]
/// for internal logging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The presented token was rejected
    #[error("unauthenticated")]
    Unauthenticated(FailureKind),

    /// A caller-supplied login was rejected by the embedding application
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    /// Internal failure kind, if the error came from token verification.
    #[must_use]
    pub const fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Unauthenticated(kind) => Some(*kind),
            Self::InvalidCredentials => None,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        Self::Unauthenticated(err.kind())
    }
}
