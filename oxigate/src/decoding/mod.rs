//! Compact JWS parsing
use base64_simd::URL_SAFE_NO_PAD as b64;
use memchr::memchr_iter;
use serde::de::DeserializeOwned;

use crate::error::{
    JwtError,
    SplitError,
};

/// A compact-serialized token split into its three sections and base64url-decoded.
///
/// Nothing here is verified; the pipeline uses [`CompactToken::signing_input`]
/// and [`CompactToken::signature`] to check the signature before trusting the
/// header or claims.
#[derive(Debug)]
pub struct CompactToken<'a> {
    raw: &'a [u8],
    signing_input_len: usize,
    decoded: Vec<u8>,
    header_end: usize,
    claims_end: usize,
}

impl<'a> CompactToken<'a> {
    /// Splits `raw` on its two `.` separators and decodes every section.
    ///
    /// # Errors
    ///
    /// - [`JwtError::InvalidSectionCount`] when `raw` does not have exactly three
    ///   dot-delimited sections
    /// - [`JwtError::InvalidEncoding`] when any section is not unpadded base64url
    pub fn parse(raw: &'a [u8]) -> Result<Self, JwtError> {
        let mut dots = memchr_iter(b'.', raw);
        let header_len = dots.next().ok_or(SplitError::Undersized)?;
        let signing_input_len = dots.next().ok_or(SplitError::Undersized)?;
        if dots.next().is_some() {
            return Err(SplitError::Oversized.into());
        }

        let sections = [
            &raw[..header_len],
            &raw[header_len + 1..signing_input_len],
            &raw[signing_input_len + 1..],
        ];
        let mut decoded = Vec::with_capacity(
            sections
                .iter()
                .map(|s| b64.estimated_decoded_length(s.len()))
                .sum(),
        );
        let mut ends = [0; 3];
        for (section, end) in sections.into_iter().zip(&mut ends) {
            b64.decode_append(section, &mut decoded)
                .map_err(|_| JwtError::InvalidEncoding)?;
            *end = decoded.len();
        }

        Ok(Self {
            raw,
            signing_input_len,
            decoded,
            header_end: ends[0],
            claims_end: ends[1],
        })
    }

    /// `BASE64URL(header) || '.' || BASE64URL(payload)`, the bytes covered by the signature
    ///
    /// Ref: [RFC 7515 5.2](<https://datatracker.ietf.org/doc/html/rfc7515#section-5.2>)
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        &self.raw[..self.signing_input_len]
    }

    /// Decoded header JSON
    #[must_use]
    pub fn header_json(&self) -> &[u8] {
        &self.decoded[..self.header_end]
    }

    /// Decoded claims JSON
    #[must_use]
    pub fn claims_json(&self) -> &[u8] {
        &self.decoded[self.header_end..self.claims_end]
    }

    /// Decoded signature
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.decoded[self.claims_end..]
    }

    /// Deserializes the header.
    ///
    /// # Errors
    ///
    /// - [`JwtError::HeaderDeserialization`] when the header is not valid JSON for `H`
    pub fn header<H: DeserializeOwned>(&self) -> Result<H, JwtError> {
        serde_json::from_slice(self.header_json()).map_err(|_| JwtError::HeaderDeserialization)
    }

    /// Deserializes the claims.
    ///
    /// # Errors
    ///
    /// - [`JwtError::ClaimsDeserialization`] when the claims are not valid JSON for `C`
    pub fn claims<C: DeserializeOwned>(&self) -> Result<C, JwtError> {
        serde_json::from_slice(self.claims_json()).map_err(|_| JwtError::ClaimsDeserialization)
    }
}
