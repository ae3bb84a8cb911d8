use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::{
    claims::{
        Aud,
        Exp,
        Iat,
        Iss,
        Jti,
        PresetClaims,
        Sub,
    },
    error::ClaimsError,
};

/// Claim names registered by RFC 7519. Custom claims may not use them.
pub const RESERVED_CLAIMS: [&str; 7] = ["iss", "sub", "aud", "exp", "nbf", "iat", "jti"];

/// Registered claims merged with caller-supplied custom claims.
///
/// Custom claims never shadow a registered claim: [`ClaimSet::with_claim`] and
/// [`ClaimSet::with_claims`] reject any name in [`RESERVED_CLAIMS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(flatten)]
    preset: PresetClaims,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

impl ClaimSet {
    /// Claim set with no custom claims
    #[must_use]
    pub fn new(preset: PresetClaims) -> Self {
        Self {
            preset,
            custom: Map::new(),
        }
    }

    /// Adds a single custom claim.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::ReservedClaim`] when `name` is a registered claim name
    pub fn with_claim(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ClaimsError> {
        let name = name.into();
        check_name(&name)?;
        self.custom.insert(name, value.into());
        Ok(self)
    }

    /// Adds every field of `custom` as a custom claim.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::NotAnObject`] when `custom` does not serialize to a JSON object
    /// - [`ClaimsError::ReservedClaim`] when any field name is a registered claim
    ///   name; no claims are added in that case
    pub fn with_claims<T>(mut self, custom: &T) -> Result<Self, ClaimsError>
    where
        T: Serialize + ?Sized,
    {
        let Ok(Value::Object(fields)) = serde_json::to_value(custom) else {
            return Err(ClaimsError::NotAnObject);
        };
        if let Some(name) = fields.keys().find(|name| RESERVED_CLAIMS.contains(&name.as_str())) {
            return Err(ClaimsError::ReservedClaim(name.clone()));
        }
        self.custom.extend(fields);
        Ok(self)
    }

    /// Registered claims
    #[must_use]
    pub const fn preset(&self) -> &PresetClaims {
        &self.preset
    }

    /// Custom claims
    #[must_use]
    pub const fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Looks up a custom claim by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Full claim mapping as a JSON object.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // a struct of strings and integers flattened with a map always yields an object
            _ => Map::new(),
        }
    }
}

fn check_name(name: &str) -> Result<(), ClaimsError> {
    if RESERVED_CLAIMS.contains(&name) {
        Err(ClaimsError::ReservedClaim(name.to_owned()))
    } else {
        Ok(())
    }
}

impl Iss for ClaimSet {
    fn iss(&self) -> &str {
        self.preset.iss()
    }
}

impl Sub for ClaimSet {
    fn sub(&self) -> &str {
        self.preset.sub()
    }
}

impl Aud for ClaimSet {
    fn aud(&self) -> impl Iterator<Item = impl AsRef<str>> {
        self.preset.audience().values()
    }
}

impl Exp for ClaimSet {
    fn exp(&self) -> i64 {
        self.preset.exp()
    }
}

impl Iat for ClaimSet {
    fn iat(&self) -> i64 {
        self.preset.iat()
    }
}

impl Jti for ClaimSet {
    fn jti(&self) -> &str {
        self.preset.jti()
    }
}
