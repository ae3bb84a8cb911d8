#![allow(clippy::unwrap_used)]
use std::collections::HashSet;

use oxigate::{
    Algorithm,
    JwtAuth,
    claims::ClaimSet,
    crypto::keygen::KeypairGenerator,
    error::JwtError,
    header::TokenHeader,
    jwks::JwkSet,
    validation::{
        KeySet,
        TokenValidator,
        ValidationPipeline,
    },
};
use serde_json::json;

// ANCHOR: impl
struct RoleValidator {
    accepted_roles: HashSet<String>,
}
impl RoleValidator {
    fn new(accepted_roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let accepted_roles = accepted_roles.into_iter().map(Into::into).collect();
        Self { accepted_roles }
    }
}
impl<H> TokenValidator<H, ClaimSet> for RoleValidator {
    fn validate(&self, _: &H, claims: &ClaimSet, _now: i64) -> Result<(), JwtError> {
        match claims.get("role").and_then(serde_json::Value::as_str) {
            Some(role) if self.accepted_roles.contains(role) => Ok(()),
            _ => Err(JwtError::CustomValidationError("role not accepted")),
        }
    }
}
// ANCHOR_END: impl

fn main() {
    let pair = KeypairGenerator::generate(Algorithm::ES256).unwrap();
    let auth = JwtAuth::builder(
        pair.signing_key(Algorithm::ES256).unwrap(),
        "https://auth.example.org",
        "https://api.example.org",
    )
    .with_expiry(300)
    .build()
    .unwrap();

    let admin = auth
        .issue_with_claims("user-1", &json!({"role": "admin"}))
        .unwrap();
    let guest = auth
        .issue_with_claims("user-2", &json!({"role": "guest"}))
        .unwrap();

    // a relying party only sees the published JWKS document
    let document = serde_json::to_string(&auth.jwks()).unwrap();
    let published: JwkSet = serde_json::from_str(&document).unwrap();

    // ANCHOR: usage
    let validator = ValidationPipeline::<TokenHeader, ClaimSet, _>::builder(
        KeySet::try_from(&published).unwrap(),
        Algorithm::ES256,
    )
    .with_expiration_validator(30)
    .with_issuer_validator("https://auth.example.org")
    .with_audience_validator("https://api.example.org")
    .with(RoleValidator::new(["admin", "operator"]))
    .build();
    // ANCHOR_END: usage

    validator.verify(admin.as_bytes()).unwrap();
    let err = validator.verify(guest.as_bytes()).unwrap_err();
    assert_eq!(err, JwtError::CustomValidationError("role not accepted"));
    println!("JWT validated successfully");
}
