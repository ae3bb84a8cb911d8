//! Registered and custom claims carried by issued tokens
mod claim_set;
mod preset;
mod rfc7519;

pub use claim_set::{
    ClaimSet,
    RESERVED_CLAIMS,
};
pub use preset::{
    Audience,
    PresetClaims,
};
pub use rfc7519::{
    Aud,
    Exp,
    Iat,
    Iss,
    Jti,
    Sub,
};
