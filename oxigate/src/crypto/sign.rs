use openssl::{
    ec::EcKeyRef,
    ecdsa::EcdsaSig,
    error::ErrorStack,
    hash::{
        MessageDigest,
        hash,
    },
    pkey::{
        HasPrivate,
        PKeyRef,
    },
    sign::Signer,
};

use crate::{
    Algorithm,
    crypto::SigningKey,
    encoding::Signer as JwtSigner,
};

impl JwtSigner for SigningKey {
    type Error = ErrorStack;

    fn alg(&self) -> Algorithm {
        self.algorithm()
    }

    fn siglen(&self) -> usize {
        self.algorithm()
            .fixed_siglen()
            .unwrap_or_else(|| self.key.size())
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ErrorStack> {
        match self.algorithm() {
            Algorithm::RS256 => rsa_sign(MessageDigest::sha256(), &self.key, message),
            Algorithm::ES256 | Algorithm::ES256K => {
                let ec = self.key.ec_key()?;
                ec_sign(MessageDigest::sha256(), &ec, message)
            }
            Algorithm::EdDSA => ed_sign(&self.key, message),
        }
    }
}

fn ed_sign<T>(key: &PKeyRef<T>, message: &[u8]) -> Result<Vec<u8>, ErrorStack>
where
    T: HasPrivate,
{
    let mut signer = Signer::new_without_digest(key)?;
    signer.sign_oneshot_to_vec(message)
}

/// ECDSA signature in the JWS form: `r || s`, each left-padded to the curve order size
fn ec_sign<T>(
    digest: MessageDigest,
    key: &EcKeyRef<T>,
    message: &[u8],
) -> Result<Vec<u8>, ErrorStack>
where
    T: HasPrivate,
{
    let digest = hash(digest, message)?;
    let rsig = EcdsaSig::sign(&digest, key)?;
    let plen = key.group().order_bits().div_ceil(8).cast_signed();
    let mut signature = rsig.r().to_vec_padded(plen)?;
    signature.append(&mut rsig.s().to_vec_padded(plen)?);
    Ok(signature)
}

/// RSASSA-PKCS1-v1_5
fn rsa_sign<T>(
    digest: MessageDigest,
    key: &PKeyRef<T>,
    message: &[u8],
) -> Result<Vec<u8>, ErrorStack>
where
    T: HasPrivate,
{
    let mut signer = Signer::new(digest, key)?;
    signer.update(message)?;
    signer.sign_to_vec()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{
        Algorithm,
        crypto::keygen::KeypairGenerator,
        encoding::Signer,
    };

    #[test]
    fn signature_lengths() {
        for (alg, expected) in [
            (Algorithm::RS256, 256),
            (Algorithm::ES256, 64),
            (Algorithm::ES256K, 64),
            (Algorithm::EdDSA, 64),
        ] {
            let key = KeypairGenerator::generate(alg)
                .unwrap()
                .signing_key(alg)
                .unwrap();
            assert_eq!(key.siglen(), expected, "{alg}");
            // ECDSA r and s are padded, so short values never shrink the output
            for _ in 0..8 {
                assert_eq!(key.sign(b"e30.e30").unwrap().len(), expected, "{alg}");
            }
        }
    }

    #[test]
    fn rsa_4096_siglen_follows_modulus() {
        let pair = KeypairGenerator::generate_rsa_keypair_with_size(4096).unwrap();
        let key = pair.signing_key(Algorithm::RS256).unwrap();
        assert_eq!(key.siglen(), 512);
        assert_eq!(key.sign(b"msg").unwrap().len(), 512);
    }
}
