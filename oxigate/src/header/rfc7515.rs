//! JWT header accessor traits based on RFC 7515 header parameters

use crate::Algorithm;

/// `alg` (Algorithm) Header Parameter
///
/// Ref: [RFC 7515 4.1.1](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.1>)
pub trait Alg {
    /// Return `alg` (Algorithm) parameter from JWS header, or [`None`] when the
    /// header names an algorithm outside the supported set (including `none`).
    fn alg(&self) -> Option<Algorithm>;
}

/// `kid` (Key ID) Header Parameter
///
/// Ref: [RFC 7515 4.1.4](<https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.4>)
pub trait Kid {
    /// Return `kid` (Key ID) parameter from JWS header, if present
    fn kid(&self) -> Option<&str>;
}
