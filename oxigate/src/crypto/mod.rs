//! [`openssl`]-backed key material
//!
//! [`SigningKey`] implements [`Signer`] and [`PublicKey`] implements
//! [`VerificationKey`]. Both are bound to a single [`Algorithm`] when they are
//! parsed, so a key can never be used with an algorithm of another family.
//!
//! [`Signer`]: crate::encoding::Signer
//! [`VerificationKey`]: crate::validation::VerificationKey

pub mod keygen;
mod sign;
mod verify;

use std::fmt;

use openssl::{
    bn::{
        BigNum,
        BigNumContext,
    },
    ec::{
        EcGroup,
        EcKey,
    },
    error::ErrorStack,
    pkey::{
        HasPublic,
        Id,
        PKey,
        PKeyRef,
        Private,
        Public,
    },
    rsa::Rsa,
};

use crate::{
    Algorithm,
    error::KeyError,
    jwks::Jwk,
};

/// Smallest RSA modulus accepted for RS256
pub const MIN_RSA_BITS: u32 = 2048;

/// Public half of a key pair, used to verify tokens and published via JWKS.
///
/// The key id is the RFC 7638 thumbprint of the key, computed once on construction.
#[derive(Debug, Clone)]
pub struct PublicKey {
    key: PKey<Public>,
    alg: Algorithm,
    jwk: Jwk,
}

impl PublicKey {
    /// Parses a SubjectPublicKeyInfo PEM document.
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidPem`] when `pem` is not a PEM encoded public key
    /// - [`KeyError::UnsupportedKey`] when the key is not RSA-2048+, P-256,
    ///   secp256k1 or Ed25519
    /// - [`KeyError::AlgorithmMismatch`] when the key belongs to another family
    ///   than `algorithm`
    pub fn from_pem(pem: impl AsRef<[u8]>, algorithm: Algorithm) -> Result<Self, KeyError> {
        let key = PKey::public_key_from_pem(pem.as_ref()).map_err(KeyError::InvalidPem)?;
        Self::from_pkey(key, algorithm)
    }

    pub(crate) fn from_pkey(key: PKey<Public>, expected: Algorithm) -> Result<Self, KeyError> {
        let alg = map_pkey_alg(&key).ok_or(KeyError::UnsupportedKey)?;
        if alg != expected {
            return Err(KeyError::AlgorithmMismatch {
                expected,
                found: alg,
            });
        }
        let jwk = export_jwk(&key, alg).map_err(KeyError::Export)?;
        Ok(Self { key, alg, jwk })
    }

    /// Algorithm this key verifies
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// RFC 7638 thumbprint, used as `kid`
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.jwk.kid
    }

    /// Public JWK for this key
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        self.jwk.clone()
    }

    /// SubjectPublicKeyInfo PEM encoding
    ///
    /// # Errors
    ///
    /// - [`KeyError::Export`] when the backend fails to encode the key
    pub fn to_pem(&self) -> Result<String, KeyError> {
        let pem = self.key.public_key_to_pem().map_err(KeyError::Export)?;
        Ok(String::from_utf8_lossy(&pem).into_owned())
    }
}

impl TryFrom<&Jwk> for PublicKey {
    type Error = KeyError;

    /// Rebuilds a verification key from a published JWK. The JWK `kid` must be
    /// the thumbprint of the rebuilt key.
    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        let alg = jwk.algorithm()?;
        let key = match alg {
            Algorithm::RS256 => {
                let n = Jwk::component(jwk.n.as_deref(), "missing 'n'")?;
                let e = Jwk::component(jwk.e.as_deref(), "missing 'e'")?;
                rsa_from_components(&n, &e)
            }
            Algorithm::ES256 | Algorithm::ES256K => {
                let x = Jwk::component(jwk.x.as_deref(), "missing 'x'")?;
                let y = Jwk::component(jwk.y.as_deref(), "missing 'y'")?;
                let nid = alg.ec_nid().ok_or(KeyError::UnsupportedKey)?;
                let group = EcGroup::from_curve_name(nid).map_err(KeyError::Export)?;
                ec_from_components(&group, &x, &y)
            }
            Algorithm::EdDSA => {
                let x = Jwk::component(jwk.x.as_deref(), "missing 'x'")?;
                PKey::public_key_from_raw_bytes(&x, Id::ED25519)
            }
        }
        .map_err(|_| KeyError::InvalidJwk("key components rejected"))?;

        let key = Self::from_pkey(key, alg)?;
        if key.kid() == jwk.kid {
            Ok(key)
        } else {
            Err(KeyError::InvalidJwk("kid is not the key thumbprint"))
        }
    }
}

/// Private half of a key pair, used to sign tokens.
///
/// `Debug` output never includes key material.
#[derive(Clone)]
pub struct SigningKey {
    key: PKey<Private>,
    public: PublicKey,
}

impl SigningKey {
    /// Parses a PEM private key (PKCS#8, PKCS#1 for RSA, or SEC1 for EC).
    ///
    /// # Errors
    ///
    /// - [`KeyError::InvalidPem`] when `pem` is not a PEM encoded private key
    /// - [`KeyError::UnsupportedKey`] when the key family is outside the supported set
    /// - [`KeyError::AlgorithmMismatch`] when the key belongs to another family
    ///   than `algorithm`
    pub fn from_pem(pem: impl AsRef<[u8]>, algorithm: Algorithm) -> Result<Self, KeyError> {
        let key = PKey::private_key_from_pem(pem.as_ref()).map_err(KeyError::InvalidPem)?;
        Self::from_pkey(key, algorithm)
    }

    pub(crate) fn from_pkey(key: PKey<Private>, algorithm: Algorithm) -> Result<Self, KeyError> {
        let der = key.public_key_to_der().map_err(KeyError::Export)?;
        let public = PKey::public_key_from_der(&der).map_err(KeyError::Export)?;
        let public = PublicKey::from_pkey(public, algorithm)?;
        Ok(Self { key, public })
    }

    /// Algorithm this key signs with
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.public.alg
    }

    /// Key id of the matching public key
    #[must_use]
    pub fn kid(&self) -> &str {
        self.public.kid()
    }

    /// Matching public key
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("alg", &self.algorithm())
            .field("kid", &self.kid())
            .finish_non_exhaustive()
    }
}

fn map_pkey_alg<T>(key: &PKeyRef<T>) -> Option<Algorithm>
where
    T: HasPublic,
{
    match key.id() {
        Id::RSA if key.bits() >= MIN_RSA_BITS => Some(Algorithm::RS256),
        Id::EC => Algorithm::from_ec_nid(key.ec_key().ok()?.group().curve_name()?),
        Id::ED25519 => Some(Algorithm::EdDSA),
        _ => None,
    }
}

fn export_jwk<T>(key: &PKeyRef<T>, alg: Algorithm) -> Result<Jwk, ErrorStack>
where
    T: HasPublic,
{
    match alg {
        Algorithm::RS256 => {
            let rsa = key.rsa()?;
            Ok(Jwk::rsa(&rsa.n().to_vec(), &rsa.e().to_vec()))
        }
        Algorithm::ES256 | Algorithm::ES256K => {
            let ec = key.ec_key()?;
            let group = ec.group();
            let mut ctx = BigNumContext::new()?;
            let mut x = BigNum::new()?;
            let mut y = BigNum::new()?;
            ec.public_key()
                .affine_coordinates(group, &mut x, &mut y, &mut ctx)?;
            let len = group.degree().div_ceil(8).cast_signed();
            Ok(Jwk::ec(alg, &x.to_vec_padded(len)?, &y.to_vec_padded(len)?))
        }
        Algorithm::EdDSA => Ok(Jwk::okp(&key.raw_public_key()?)),
    }
}

fn rsa_from_components(n: &[u8], e: &[u8]) -> Result<PKey<Public>, ErrorStack> {
    let rsa = Rsa::from_public_components(BigNum::from_slice(n)?, BigNum::from_slice(e)?)?;
    PKey::from_rsa(rsa)
}

fn ec_from_components(group: &EcGroup, x: &[u8], y: &[u8]) -> Result<PKey<Public>, ErrorStack> {
    let x = BigNum::from_slice(x)?;
    let y = BigNum::from_slice(y)?;
    let key = EcKey::from_public_key_affine_coordinates(group, &x, &y)?;
    key.check_key()?;
    PKey::from_ec_key(key)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use openssl::{
        ec::{
            EcGroup,
            EcKey,
        },
        nid::Nid,
        pkey::PKey,
        rsa::Rsa,
    };

    use super::{
        PublicKey,
        SigningKey,
        map_pkey_alg,
    };
    use crate::{
        Algorithm,
        crypto::keygen::KeypairGenerator,
        error::KeyError,
    };

    #[test]
    fn key_families() {
        let rsa = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&rsa), Some(Algorithm::RS256));

        let p256 = EcKey::generate(&EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap());
        let p256 = PKey::from_ec_key(p256.unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&p256), Some(Algorithm::ES256));

        let k1 = EcKey::generate(&EcGroup::from_curve_name(Nid::SECP256K1).unwrap());
        let k1 = PKey::from_ec_key(k1.unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&k1), Some(Algorithm::ES256K));

        let ed = PKey::generate_ed25519().unwrap();
        assert_eq!(map_pkey_alg(&ed), Some(Algorithm::EdDSA));
    }

    #[test]
    fn unsupported_keys() {
        let small_rsa = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&small_rsa), None);

        let p384 = EcKey::generate(&EcGroup::from_curve_name(Nid::SECP384R1).unwrap());
        let p384 = PKey::from_ec_key(p384.unwrap()).unwrap();
        assert_eq!(map_pkey_alg(&p384), None);
        let pem = p384.private_key_to_pem_pkcs8().unwrap();
        let err = SigningKey::from_pem(pem, Algorithm::ES256).unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedKey));

        let ed448 = PKey::generate_ed448().unwrap();
        assert_eq!(map_pkey_alg(&ed448), None);
    }

    #[test]
    fn algorithm_bound_at_parse_time() {
        let pair = KeypairGenerator::generate_eddsa_keypair().unwrap();
        let err = PublicKey::from_pem(pair.public_pem(), Algorithm::ES256).unwrap_err();
        assert!(matches!(
            err,
            KeyError::AlgorithmMismatch {
                expected: Algorithm::ES256,
                found: Algorithm::EdDSA,
            }
        ));
    }

    #[test]
    fn garbage_pem_rejected() {
        let err = PublicKey::from_pem("not a key", Algorithm::RS256).unwrap_err();
        assert!(matches!(err, KeyError::InvalidPem(_)));
        let err = SigningKey::from_pem(b"", Algorithm::RS256).unwrap_err();
        assert!(matches!(err, KeyError::InvalidPem(_)));
    }

    #[test]
    fn kid_is_stable_and_shared() {
        for alg in Algorithm::ALL {
            let pair = KeypairGenerator::generate(alg).unwrap();
            let signing = pair.signing_key(alg).unwrap();
            let public = PublicKey::from_pem(pair.public_pem(), alg).unwrap();
            assert_eq!(signing.kid(), public.kid(), "{alg}");
            assert_eq!(signing.kid().len(), 43, "{alg}");

            let reparsed = PublicKey::from_pem(public.to_pem().unwrap(), alg).unwrap();
            assert_eq!(reparsed.kid(), public.kid(), "{alg}");
        }
    }

    #[test]
    fn jwk_import_round_trip() {
        for alg in Algorithm::ALL {
            let pair = KeypairGenerator::generate(alg).unwrap();
            let public = PublicKey::from_pem(pair.public_pem(), alg).unwrap();
            let jwk = public.to_jwk();
            let imported = PublicKey::try_from(&jwk).unwrap();
            assert_eq!(imported.kid(), public.kid(), "{alg}");
            assert_eq!(imported.algorithm(), alg);
        }
    }

    #[test]
    fn jwk_import_checks_kid() {
        let pair = KeypairGenerator::generate_ecdsa_keypair().unwrap();
        let public = PublicKey::from_pem(pair.public_pem(), Algorithm::ES256).unwrap();
        let mut jwk = public.to_jwk();
        jwk.kid = "forged".into();
        let err = PublicKey::try_from(&jwk).unwrap_err();
        assert!(matches!(err, KeyError::InvalidJwk(_)));

        let mut jwk = public.to_jwk();
        jwk.y = None;
        let err = PublicKey::try_from(&jwk).unwrap_err();
        assert!(matches!(err, KeyError::InvalidJwk("missing 'y'")));
    }

    #[test]
    fn jwk_import_rejects_point_off_curve() {
        let pair = KeypairGenerator::generate_ecdsa_keypair().unwrap();
        let public = PublicKey::from_pem(pair.public_pem(), Algorithm::ES256).unwrap();
        let mut jwk = public.to_jwk();
        jwk.y = jwk.x.clone();
        assert!(PublicKey::try_from(&jwk).is_err());
    }

    #[test]
    fn signing_key_debug_hides_material() {
        let pair = KeypairGenerator::generate_eddsa_keypair().unwrap();
        let key = pair.signing_key(Algorithm::EdDSA).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.starts_with("SigningKey { alg: EdDSA, kid: "));
        assert!(!debug.contains("PRIVATE"));
    }
}
