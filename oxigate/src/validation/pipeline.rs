use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    Algorithm,
    claims::{
        Aud,
        Exp,
        Iat,
        Iss,
    },
    decoding::CompactToken,
    error::JwtError,
    header::Alg,
    validation::{
        AudiencePolicy,
        Clock,
        KeyProvider,
        SystemClock,
        VerificationKey,
        validator::{
            AudienceValidator,
            ExpirationValidator,
            IssuedAtValidator,
            IssuerValidator,
            TokenValidator,
        },
    },
};

type BoxedValidator<H, C> = Box<dyn TokenValidator<H, C> + Send + Sync>;

/// Builder for a [`ValidationPipeline`]
pub struct ValidationPipelineBuilder<H, C, KP>
where
    KP: KeyProvider<H, C>,
{
    validators: Vec<BoxedValidator<H, C>>,
    key_provider: KP,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
    size_limit: Option<usize>,
}

impl<H, C, KP> ValidationPipelineBuilder<H, C, KP>
where
    H: DeserializeOwned + Alg,
    C: DeserializeOwned,
    KP: KeyProvider<H, C> + Send + Sync + 'static,
{
    pub(crate) fn new(key_provider: KP, algorithm: Algorithm) -> Self {
        Self {
            validators: Vec::new(),
            key_provider,
            algorithm,
            clock: Arc::new(SystemClock),
            size_limit: None,
        }
    }

    /// Caps accepted JWT size to `size_limit` bytes
    ///
    /// JWTs above this size will return a [`JwtError::OverSizeThreshold`]
    #[must_use]
    pub const fn with_max_size(mut self, size_limit: usize) -> Self {
        self.size_limit = Some(size_limit);
        self
    }

    /// Reads the current time from `clock` instead of the system clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Rejects JWTs where the `iss` field does not equal `iss`.
    #[must_use]
    pub fn with_issuer_validator(mut self, iss: impl Into<String>) -> Self
    where
        C: Iss,
    {
        self.validators
            .push(Box::new(IssuerValidator::new(iss.into())));
        self
    }

    /// Rejects JWTs whose `aud` is not accepted by `policy`.
    #[must_use]
    pub fn with_audience_validator(mut self, policy: impl Into<AudiencePolicy>) -> Self
    where
        C: Aud,
    {
        self.validators
            .push(Box::new(AudienceValidator::new(policy.into())));
        self
    }

    /// Rejects JWTs whose `exp` lies more than `leeway` seconds in the past.
    #[must_use]
    pub fn with_expiration_validator(mut self, leeway: u64) -> Self
    where
        C: Exp,
    {
        self.validators
            .push(Box::new(ExpirationValidator::new(leeway)));
        self
    }

    /// Rejects JWTs whose `iat` lies more than `leeway` seconds in the future.
    #[must_use]
    pub fn with_issued_at_validator(mut self, leeway: u64) -> Self
    where
        C: Iat,
    {
        self.validators
            .push(Box::new(IssuedAtValidator::new(leeway)));
        self
    }

    /// Adds a custom validator to the validation pipeline.
    /// This method may be chained to add multiple custom validators.
    #[must_use]
    pub fn with(mut self, validator: impl TokenValidator<H, C> + Send + Sync + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Finalizes the validation pipeline construction.
    #[must_use]
    pub fn build(self) -> ValidationPipeline<H, C, KP> {
        ValidationPipeline {
            validators: self.validators,
            key_provider: self.key_provider,
            algorithm: self.algorithm,
            clock: self.clock,
            size_limit: self.size_limit,
        }
    }
}

/// Validation pipeline that, once built, can decode and validate compact-encoded JWTs
///
/// A token passes through four stages, stopping at the first failure:
///
/// 1. parsing: size limit, section split, base64url and JSON decoding
/// 2. algorithm: the header `alg` and the resolved key must both equal the
///    configured [`Algorithm`]
/// 3. signature
/// 4. claims: every validator, in the order added
pub struct ValidationPipeline<H, C, KP> {
    validators: Vec<BoxedValidator<H, C>>,
    key_provider: KP,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
    size_limit: Option<usize>,
}

impl<H, C, KP> ValidationPipeline<H, C, KP>
where
    H: DeserializeOwned + Alg,
    C: DeserializeOwned,
    KP: KeyProvider<H, C> + Send + Sync + 'static,
{
    /// Returns a new [`ValidationPipelineBuilder`] accepting only `algorithm`.
    pub fn builder(key_provider: KP, algorithm: Algorithm) -> ValidationPipelineBuilder<H, C, KP> {
        ValidationPipelineBuilder::new(key_provider, algorithm)
    }

    /// Algorithm this pipeline accepts
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Verifies a JWT using the validation pipeline's key provider and validators.
    ///
    /// # Errors
    ///
    /// - [`JwtError::OverSizeThreshold`] when a `size_limit` has been specified
    ///   and the raw JWT size, in bytes, is greater than that limit.
    /// - [`JwtError::InvalidSectionCount`] when the number of dot-delimited
    ///   sections in the JWT does not match the expected count
    /// - [`JwtError::InvalidEncoding`] when any section of the JWT is not
    ///   valid base-64 URL-safe encoded.
    /// - [`JwtError::HeaderDeserialization`] when the header cannot be
    ///   deserialized from JSON into the specified header struct (i.e. `H` generic)
    /// - [`JwtError::WrongAlgorithm`] when the header `alg` field, or the
    ///   [`VerificationKey`] algorithm, is not the configured algorithm
    /// - [`JwtError::ClaimsDeserialization`] when the claims cannot be
    ///   deserialized from JSON into the specified claims struct (i.e. `C` generic)
    /// - [`JwtError::VerificationKeyNotFound`] when the [`KeyProvider`] cannot
    ///   resolve a key to be used for cryptographic operations.
    /// - [`JwtError::InvalidSignature`] when the JWT signature is invalid per
    ///   the [`VerificationKey`]
    /// - Any other [`JwtError`] raised by a [`TokenValidator`] which is included
    ///   in the validation pipeline
    pub fn verify(&self, token: &[u8]) -> Result<(H, C), JwtError> {
        if let Some(size_limit) = self.size_limit
            && token.len() > size_limit
        {
            return Err(rejected("parse", JwtError::OverSizeThreshold));
        }
        let compact = CompactToken::parse(token).map_err(|err| rejected("parse", err))?;
        let header = compact
            .header::<H>()
            .map_err(|err| rejected("parse", err))?;

        // alg is pinned by configuration, never chosen by the token
        if header.alg() != Some(self.algorithm) {
            return Err(rejected("algorithm", JwtError::WrongAlgorithm));
        }
        let claims = compact
            .claims::<C>()
            .map_err(|err| rejected("parse", err))?;

        let key = self
            .key_provider
            .resolve_key(&header, &claims)
            .map_err(|err| rejected("key", err))?;
        if key.alg() != Some(self.algorithm) {
            return Err(rejected("algorithm", JwtError::WrongAlgorithm));
        }

        key.verify(compact.signing_input(), compact.signature())
            .map_err(|err| rejected("signature", err))?;

        self.run_validators(&header, &claims, self.clock.now())
            .map_err(|err| rejected("claims", err))?;

        Ok((header, claims))
    }

    fn run_validators(&self, header: &H, claims: &C, now: i64) -> Result<(), JwtError> {
        for v in &self.validators {
            v.validate(header, claims, now)?;
        }
        Ok(())
    }
}

fn rejected(stage: &'static str, err: JwtError) -> JwtError {
    debug!(stage, kind = err.kind().as_str(), error = %err, "token rejected");
    err
}
