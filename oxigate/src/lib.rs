#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![doc = include_str!("../README.md")]

pub mod auth;
pub mod claims;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod header;
pub mod jwks;
pub mod validation;
pub mod verifier;

/// Error enums
pub mod error;

// WARNING: The decoding module is not considered part of the public API
// and is subject to breaking changes outside SemVer restrictions. It is
// marked `pub` purely for benchmarking purposes.
#[doc(hidden)]
pub mod decoding;

pub use algorithm::{
    Algorithm,
    UnknownAlgorithm,
};
pub use auth::{
    AuthHandle,
    JwtAuth,
};
pub use config::AuthConfig;
pub use verifier::Verifier;

mod algorithm;
use error::JwtError;
