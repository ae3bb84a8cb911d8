//! The authentication engine: issuance, verification and JWKS discovery over
//! one immutable set of key material.
use std::{
    fmt,
    sync::Arc,
};

use arc_swap::ArcSwap;
use serde::{
    Serialize,
    de::DeserializeOwned,
};
use tracing::info;

use crate::{
    Algorithm,
    claims::{
        ClaimSet,
        PresetClaims,
    },
    codec,
    config::ConfigError,
    crypto::{
        PublicKey,
        SigningKey,
    },
    error::{
        IssueError,
        JwtError,
    },
    header::{
        JwtHeader,
        TokenHeader,
    },
    jwks::{
        Jwk,
        JwkSet,
    },
    validation::{
        AudiencePolicy,
        Clock,
        KeySet,
        SystemClock,
        ValidationPipeline,
    },
    verifier::Verifier,
};

/// Builder for a [`JwtAuth`] engine
pub struct JwtAuthBuilder {
    signing_key: SigningKey,
    issuer: String,
    audience: AudiencePolicy,
    base_url: String,
    expiry: u64,
    leeway: u64,
    max_token_size: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl JwtAuthBuilder {
    /// Sets the base URL the JWKS document is published under
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Lifetime of issued tokens, in seconds
    #[must_use]
    pub const fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = expiry;
        self
    }

    /// Clock skew tolerated on `exp` and `iat`, in seconds
    #[must_use]
    pub const fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Rejects presented tokens longer than `max_token_size` bytes
    #[must_use]
    pub const fn with_max_token_size(mut self, max_token_size: usize) -> Self {
        self.max_token_size = Some(max_token_size);
        self
    }

    /// Reads the current time from `clock` for both issuance and verification
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Finalizes the engine. The `kid` is always the RFC 7638 thumbprint of
    /// the signing key.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyAudience`] when the audience policy accepts nothing
    pub fn build(self) -> Result<JwtAuth, ConfigError> {
        if self.audience.primary().is_none() {
            return Err(ConfigError::EmptyAudience);
        }
        let algorithm = self.signing_key.algorithm();
        let header = JwtHeader::new(algorithm, self.base_url, self.signing_key.kid());

        let mut keys = KeySet::empty();
        keys.add_key(header.key_id(), self.signing_key.public_key().clone());
        let mut pipeline = ValidationPipeline::<TokenHeader, ClaimSet, _>::builder(keys, algorithm)
            .with_clock(Arc::clone(&self.clock))
            .with_expiration_validator(self.leeway)
            .with_issuer_validator(self.issuer.clone())
            .with_audience_validator(self.audience.clone())
            .with_issued_at_validator(self.leeway);
        if let Some(size_limit) = self.max_token_size {
            pipeline = pipeline.with_max_size(size_limit);
        }

        info!(
            %algorithm,
            kid = header.key_id(),
            issuer = %self.issuer,
            expiry = self.expiry,
            leeway = self.leeway,
            "jwt engine ready"
        );
        Ok(JwtAuth {
            signing_key: self.signing_key,
            header,
            issuer: self.issuer,
            audience: self.audience,
            expiry: self.expiry,
            leeway: self.leeway,
            clock: self.clock,
            pipeline: pipeline.build(),
        })
    }
}

/// JWT issuance and verification engine.
///
/// Immutable once built. Share it behind an [`Arc`], or behind an
/// [`AuthHandle`] when keys must be rotated without restarting.
pub struct JwtAuth {
    signing_key: SigningKey,
    header: JwtHeader,
    issuer: String,
    audience: AudiencePolicy,
    expiry: u64,
    leeway: u64,
    clock: Arc<dyn Clock>,
    pipeline: ValidationPipeline<TokenHeader, ClaimSet, KeySet>,
}

impl JwtAuth {
    /// Starts building an engine signing with `signing_key` and accepting only
    /// tokens from `issuer` for `audience`.
    ///
    /// The algorithm is the one `signing_key` was parsed for. Issued tokens
    /// expire immediately unless [`JwtAuthBuilder::with_expiry`] is set.
    #[must_use]
    pub fn builder(
        signing_key: SigningKey,
        issuer: impl Into<String>,
        audience: impl Into<AudiencePolicy>,
    ) -> JwtAuthBuilder {
        JwtAuthBuilder {
            signing_key,
            issuer: issuer.into(),
            audience: audience.into(),
            base_url: String::new(),
            expiry: 0,
            leeway: 0,
            max_token_size: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Signing algorithm
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.header.algorithm()
    }

    /// `kid` of issued tokens
    #[must_use]
    pub fn key_id(&self) -> &str {
        self.header.key_id()
    }

    /// Header attached to issued tokens
    #[must_use]
    pub const fn header(&self) -> &JwtHeader {
        &self.header
    }

    /// Expected issuer
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Accepted audiences
    #[must_use]
    pub const fn audience(&self) -> &AudiencePolicy {
        &self.audience
    }

    /// Lifetime of issued tokens, in seconds
    #[must_use]
    pub const fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Clock skew tolerance, in seconds
    #[must_use]
    pub const fn leeway(&self) -> u64 {
        self.leeway
    }

    /// Verification half of the signing key
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        self.signing_key.public_key()
    }

    /// Fresh registered claims for `subject`: `iat` from the engine clock,
    /// `exp` after the configured expiry, and a random `jti`.
    #[must_use]
    pub fn new_claims(&self, subject: impl Into<String>) -> ClaimSet {
        ClaimSet::new(PresetClaims::new(
            self.issuer.clone(),
            self.audience.primary().unwrap_or_default(),
            subject,
            self.clock.now(),
            self.expiry,
        ))
    }

    /// Issues a token for `subject` carrying only the registered claims.
    ///
    /// # Errors
    ///
    /// - [`IssueError::Encoding`] when signing fails
    pub fn issue(&self, subject: impl Into<String>) -> Result<String, IssueError> {
        self.issue_claims(&self.new_claims(subject))
    }

    /// Issues a token for `subject` with every field of `custom` added as a
    /// custom claim.
    ///
    /// # Errors
    ///
    /// - [`IssueError::Claims`] when `custom` is not an object or uses a
    ///   registered claim name
    /// - [`IssueError::Encoding`] when signing fails
    pub fn issue_with_claims<T>(
        &self,
        subject: impl Into<String>,
        custom: &T,
    ) -> Result<String, IssueError>
    where
        T: Serialize + ?Sized,
    {
        let claims = self.new_claims(subject).with_claims(custom)?;
        self.issue_claims(&claims)
    }

    /// Signs an already assembled claim set as-is.
    ///
    /// # Errors
    ///
    /// - [`IssueError::Encoding`] when signing fails
    pub fn issue_claims(&self, claims: &ClaimSet) -> Result<String, IssueError> {
        Ok(codec::encode(&self.header, claims, &self.signing_key)?)
    }

    /// Verifies `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// Any [`JwtError`] raised by [`ValidationPipeline::verify`]; a token whose
    /// `kid` is not this engine's key id fails with
    /// [`JwtError::VerificationKeyNotFound`].
    pub fn verify_claims(&self, token: &str) -> Result<ClaimSet, JwtError> {
        let (_, claims) = self.pipeline.verify(token.as_bytes())?;
        Ok(claims)
    }

    /// Verifies `token` and projects its claims onto `T`.
    ///
    /// `T` sees every claim, registered and custom. Types deriving
    /// `#[serde(deny_unknown_fields)]` reject tokens carrying claims they do
    /// not declare.
    ///
    /// # Errors
    ///
    /// - Any error of [`JwtAuth::verify_claims`]
    /// - [`JwtError::ClaimProjection`] when the claims do not deserialize into `T`
    pub fn verify_token<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let claims = self.verify_claims(token)?;
        serde_json::to_value(&claims)
            .and_then(serde_json::from_value)
            .map_err(|_| JwtError::ClaimProjection)
    }

    /// JWKS document publishing the verification key under this engine's `kid`
    #[must_use]
    pub fn jwks(&self) -> JwkSet {
        std::iter::once(self.jwk()).collect()
    }

    /// Public JWK of the signing key
    #[must_use]
    pub fn jwk(&self) -> Jwk {
        self.public_key().to_jwk()
    }

    /// Absolute address of the JWKS document
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        self.header.jwks_url()
    }
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("header", &self.header)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry", &self.expiry)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

/// Shared, atomically swappable reference to the current [`JwtAuth`].
///
/// Cloning is cheap and every clone observes rotations. A verification that
/// already loaded the engine finishes against that snapshot.
#[derive(Debug, Clone)]
pub struct AuthHandle {
    current: Arc<ArcSwap<JwtAuth>>,
}

impl AuthHandle {
    /// Wraps `engine` as the current engine
    #[must_use]
    pub fn new(engine: JwtAuth) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(engine)),
        }
    }

    /// Snapshot of the current engine
    #[must_use]
    pub fn load(&self) -> Arc<JwtAuth> {
        self.current.load_full()
    }

    /// Replaces the current engine with `engine`, returning the previous one.
    pub fn rotate(&self, engine: JwtAuth) -> Arc<JwtAuth> {
        let next_kid = engine.key_id().to_owned();
        let previous = self.current.swap(Arc::new(engine));
        info!(
            previous_kid = previous.key_id(),
            kid = %next_kid,
            "jwt engine rotated"
        );
        previous
    }

    /// Verifies `token` against the current engine and projects its claims onto `T`.
    ///
    /// # Errors
    ///
    /// Same as [`JwtAuth::verify_token`].
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        self.current.load().verify_token(token)
    }

    /// Request-facing [`Verifier`] projecting onto `T`
    #[must_use]
    pub fn verifier<T: DeserializeOwned>(&self) -> Verifier<T> {
        Verifier::new(self.clone())
    }
}

impl From<JwtAuth> for AuthHandle {
    fn from(value: JwtAuth) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    use super::{
        AuthHandle,
        JwtAuth,
    };
    use crate::{
        Algorithm,
        claims::{
            ClaimSet,
            Exp,
            Iat,
            Jti,
            Sub,
        },
        crypto::{
            SigningKey,
            keygen::KeypairGenerator,
        },
        error::{
            ClaimsError,
            IssueError,
            JwtError,
        },
        config::ConfigError,
        header::{
            Kid,
            TokenHeader,
        },
        validation::{
            AudiencePolicy,
            FixedClock,
            KeySet,
            ValidationPipeline,
        },
    };

    fn key(alg: Algorithm) -> SigningKey {
        KeypairGenerator::generate(alg)
            .unwrap()
            .signing_key(alg)
            .unwrap()
    }

    fn engine(alg: Algorithm) -> JwtAuth {
        JwtAuth::builder(key(alg), "http://testapi", "http://testapi")
            .with_base_url("http://testapi/")
            .with_expiry(3600)
            .build()
            .unwrap()
    }

    #[test]
    fn issued_claims_follow_configuration() {
        let clock = Arc::new(FixedClock::new(1_700_000_000));
        let auth = JwtAuth::builder(key(Algorithm::ES256), "http://testapi", "http://testapi")
            .with_expiry(3600)
            .with_clock(clock)
            .build()
            .unwrap();

        let claims = auth.new_claims("user-1");
        assert_eq!(claims.sub(), "user-1");
        assert_eq!(claims.iat(), 1_700_000_000);
        assert_eq!(claims.exp(), 1_700_003_600);
        assert_ne!(claims.preset().jti(), auth.new_claims("user-1").preset().jti());
    }

    #[test]
    fn verify_returns_issued_claims() {
        let auth = engine(Algorithm::EdDSA);
        let token = auth
            .issue_with_claims("user-1", &json!({"role": "admin"}))
            .unwrap();
        let claims = auth.verify_claims(&token).unwrap();
        assert_eq!(claims.sub(), "user-1");
        assert_eq!(claims.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn reserved_custom_claim_rejected_at_issue() {
        let auth = engine(Algorithm::EdDSA);
        let err = auth
            .issue_with_claims("user-1", &json!({"exp": 0}))
            .unwrap_err();
        assert!(matches!(
            err,
            IssueError::Claims(ClaimsError::ReservedClaim(name)) if name == "exp"
        ));
    }

    #[test]
    fn projection() {
        #[derive(Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        #[allow(dead_code)]
        struct Strict {
            iss: String,
            aud: String,
            sub: String,
            iat: i64,
            exp: i64,
            jti: String,
        }

        #[derive(Debug, Deserialize)]
        struct Loose {
            sub: String,
        }

        let auth = engine(Algorithm::ES256K);
        let plain = auth.issue("user-1").unwrap();
        let strict: Strict = auth.verify_token(&plain).unwrap();
        assert_eq!(strict.sub, "user-1");

        let extra = auth
            .issue_with_claims("user-1", &json!({"role": "admin"}))
            .unwrap();
        assert_eq!(
            auth.verify_token::<Strict>(&extra).unwrap_err(),
            JwtError::ClaimProjection
        );
        assert_eq!(auth.verify_token::<Loose>(&extra).unwrap().sub, "user-1");
    }

    #[test]
    fn kid_must_match_engine() {
        let issuer = engine(Algorithm::ES256);
        let verifier = engine(Algorithm::ES256);
        assert_ne!(issuer.key_id(), verifier.key_id());

        let token = issuer.issue("user-1").unwrap();
        issuer.verify_claims(&token).unwrap();
        assert_eq!(
            verifier.verify_claims(&token).unwrap_err(),
            JwtError::VerificationKeyNotFound
        );
    }

    #[test]
    fn jwks_publishes_engine_kid() {
        let auth = engine(Algorithm::RS256);
        assert_eq!(auth.key_id(), auth.public_key().kid());
        assert_eq!(auth.jwks_url(), "http://testapi/.well-known/jwks.json");

        let jwks = auth.jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kid, auth.key_id());
        assert_eq!(jwks.keys[0].alg.as_deref(), Some("RS256"));
    }

    #[test]
    fn published_jwks_verifies_issued_tokens() {
        for alg in Algorithm::ALL {
            let auth = engine(alg);
            let token = auth.issue("user-1").unwrap();

            let keys = KeySet::try_from(&auth.jwks()).unwrap();
            let pipeline = ValidationPipeline::<TokenHeader, ClaimSet, _>::builder(keys, alg)
                .with_issuer_validator("http://testapi")
                .with_audience_validator("http://testapi")
                .with_expiration_validator(0)
                .build();
            let (header, claims) = pipeline.verify(token.as_bytes()).unwrap();
            assert_eq!(header.kid(), Some(auth.key_id()));
            assert_eq!(claims.sub(), "user-1");
        }
    }

    #[test]
    fn empty_audience_rejected_at_build() {
        let err = JwtAuth::builder(
            key(Algorithm::EdDSA),
            "http://testapi",
            AudiencePolicy::AnyOf(Vec::new()),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAudience));
    }

    #[test]
    fn rotation_swaps_whole_engine() {
        let old = engine(Algorithm::ES256);
        let old_token = old.issue("user-1").unwrap();
        let handle = AuthHandle::new(old);
        let snapshot = handle.load();

        let new = engine(Algorithm::EdDSA);
        let new_token = new.issue("user-1").unwrap();
        let previous = handle.rotate(new);

        assert!(Arc::ptr_eq(&previous, &snapshot));
        assert_eq!(handle.load().algorithm(), Algorithm::EdDSA);
        handle.verify::<serde_json::Value>(&new_token).unwrap();
        assert_eq!(
            handle.verify::<serde_json::Value>(&old_token).unwrap_err(),
            JwtError::WrongAlgorithm
        );
        // in-flight snapshot still verifies against the old key
        snapshot.verify_claims(&old_token).unwrap();
    }

    #[test]
    fn oversized_tokens_rejected() {
        let auth = JwtAuth::builder(key(Algorithm::EdDSA), "http://testapi", "http://testapi")
            .with_expiry(60)
            .with_max_token_size(64)
            .build()
            .unwrap();
        let token = auth.issue("user-1").unwrap();
        assert_eq!(
            auth.verify_claims(&token).unwrap_err(),
            JwtError::OverSizeThreshold
        );
    }

    #[test]
    fn debug_hides_key() {
        let auth = engine(Algorithm::EdDSA);
        let debug = format!("{auth:?}");
        assert!(debug.contains("JwtAuth"));
        assert!(!debug.contains("PRIVATE"));
    }
}
