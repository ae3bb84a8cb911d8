use openssl::{
    bn::BigNum,
    ec::EcKeyRef,
    ecdsa::EcdsaSig,
    hash::{
        MessageDigest,
        hash,
    },
    pkey::{
        HasPublic,
        PKeyRef,
    },
    sign::Verifier,
};

use crate::{
    Algorithm,
    crypto::PublicKey,
    error::JwtError,
    validation::VerificationKey,
};

impl VerificationKey for PublicKey {
    fn alg(&self) -> Option<Algorithm> {
        Some(self.alg)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), JwtError> {
        if let Some(siglen) = self.alg.fixed_siglen()
            && signature.len() != siglen
        {
            return Err(JwtError::InvalidSignature);
        }
        match self.alg {
            Algorithm::RS256 => {
                verify_with_digest(&self.key, MessageDigest::sha256(), message, signature)
            }
            Algorithm::ES256 | Algorithm::ES256K => {
                let eckey = self.key.ec_key().map_err(|_| JwtError::KeyError)?;
                verify_ecdsa_with_digest(&eckey, MessageDigest::sha256(), message, signature)
            }
            Algorithm::EdDSA => verify_ed(&self.key, message, signature),
        }
    }
}

fn verify_ed<T>(key: &PKeyRef<T>, message: &[u8], signature: &[u8]) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let mut verifier = Verifier::new_without_digest(key).map_err(|_| JwtError::KeyError)?;
    if verifier
        .verify_oneshot(signature, message)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

fn verify_with_digest<T>(
    key: &PKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let mut verifier = Verifier::new(digest, key).map_err(|_| JwtError::KeyError)?;
    verifier.update(message).map_err(|_| JwtError::KeyError)?;
    if verifier
        .verify(signature)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

fn verify_ecdsa_with_digest<T>(
    key: &EcKeyRef<T>,
    digest: MessageDigest,
    message: &[u8],
    signature: &[u8],
) -> Result<(), JwtError>
where
    T: HasPublic,
{
    let plen = key.group().order_bits().div_ceil(8) as usize;
    if signature.len() != plen * 2 {
        return Err(JwtError::InvalidSignature);
    }
    let (r, s) = signature.split_at(plen);
    let sig = EcdsaSig::from_private_components(
        BigNum::from_slice(r).map_err(|_| JwtError::InvalidSignature)?,
        BigNum::from_slice(s).map_err(|_| JwtError::InvalidSignature)?,
    )
    .map_err(|_| JwtError::InvalidSignature)?;

    let digest = hash(digest, message).map_err(|_| JwtError::KeyError)?;
    if sig
        .verify(&digest, key)
        .map_err(|_| JwtError::InvalidSignature)?
    {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{
        Algorithm,
        crypto::{
            PublicKey,
            keygen::KeypairGenerator,
        },
        encoding::Signer,
        error::JwtError,
        validation::VerificationKey,
    };

    fn keys(alg: Algorithm) -> (crate::crypto::SigningKey, PublicKey) {
        let signing = KeypairGenerator::generate(alg)
            .unwrap()
            .signing_key(alg)
            .unwrap();
        let public = signing.public_key().clone();
        (signing, public)
    }

    #[test]
    fn verifies_own_signature_and_rejects_tampering() {
        for alg in Algorithm::ALL {
            let (signing, public) = keys(alg);
            let message = b"eyJhbGciOiJFUzI1NiJ9.e30";
            let signature = signing.sign(message).unwrap();
            public.verify(message, &signature).unwrap();

            let err = public
                .verify(b"eyJhbGciOiJFUzI1NiJ9.e31", &signature)
                .unwrap_err();
            assert_eq!(err, JwtError::InvalidSignature, "{alg}");
        }
    }

    #[test]
    fn wrong_length_signatures() {
        for alg in Algorithm::ALL {
            let (_, public) = keys(alg);
            let sigs: [&[u8]; 4] = [&[], &[0xFF; 63], &[0xFF; 65], &[0x01; 600]];
            for sig in sigs {
                let err = public.verify(b"hello world", sig).unwrap_err();
                assert_eq!(err, JwtError::InvalidSignature, "{alg} len {}", sig.len());
            }
        }
    }

    #[test]
    fn ecdsa_right_size_but_invalid() {
        let (_, public) = keys(Algorithm::ES256);
        for sig in [[0xFF; 64], [0x00; 64]] {
            let err = public.verify(b"hello world", &sig).unwrap_err();
            assert_eq!(err, JwtError::InvalidSignature);
        }
    }

    #[test]
    fn signature_from_unrelated_key() {
        for alg in Algorithm::ALL {
            let (signing, _) = keys(alg);
            let (_, other) = keys(alg);
            let signature = signing.sign(b"msg").unwrap();
            let err = other.verify(b"msg", &signature).unwrap_err();
            assert_eq!(err, JwtError::InvalidSignature, "{alg}");
        }
    }
}
