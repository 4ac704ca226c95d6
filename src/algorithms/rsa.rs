//! RSA signature algorithms.
//!
//! # PKCS#1 v1.5 (RS256, RS384, RS512)
//! RSASSA-PKCS1-v1_5 signatures via [rsa::pkcs1v15]. The signature is
//! deterministic for a given key and message.
//!
//! # PSS (PS256, PS384, PS512)
//! RSASSA-PSS signatures via [rsa::pss], randomized with [`OsRng`].
//!
//! A key of 2048 bits or larger must be used with these algorithms;
//! the upper bound is 16384 bits in 64-bit increments. The signature
//! size equals the key size in whole bytes.

use rand_core::OsRng;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::RsaPrivateKey;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::CryptoError;
use crate::key::{validate_key, KeyType, SecretKey};
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, JoseAlgorithm, SignatureAlgorithm};

const KEY_SIZES: &[KeySizes] = &[KeySizes::range(2048, 16384, 64)];

#[derive(Debug, Clone, Copy)]
enum RsaPadding {
    Pkcs1v15,
    Pss,
}

#[derive(Debug, Clone, Copy)]
enum RsaDigest {
    Sha256,
    Sha384,
    Sha512,
}

/// An RSA signature algorithm: one padding scheme, one hash.
#[derive(Debug, Clone)]
pub struct RsaSignature {
    code: &'static str,
    padding: RsaPadding,
    digest: RsaDigest,
}

impl RsaSignature {
    /// RSASSA-PKCS1-v1_5 with SHA-256 (`RS256`).
    pub fn rs256() -> Self {
        RsaSignature {
            code: "RS256",
            padding: RsaPadding::Pkcs1v15,
            digest: RsaDigest::Sha256,
        }
    }

    /// RSASSA-PKCS1-v1_5 with SHA-384 (`RS384`).
    pub fn rs384() -> Self {
        RsaSignature {
            code: "RS384",
            padding: RsaPadding::Pkcs1v15,
            digest: RsaDigest::Sha384,
        }
    }

    /// RSASSA-PKCS1-v1_5 with SHA-512 (`RS512`).
    pub fn rs512() -> Self {
        RsaSignature {
            code: "RS512",
            padding: RsaPadding::Pkcs1v15,
            digest: RsaDigest::Sha512,
        }
    }

    /// RSASSA-PSS with SHA-256 (`PS256`).
    pub fn ps256() -> Self {
        RsaSignature {
            code: "PS256",
            padding: RsaPadding::Pss,
            digest: RsaDigest::Sha256,
        }
    }

    /// RSASSA-PSS with SHA-384 (`PS384`).
    pub fn ps384() -> Self {
        RsaSignature {
            code: "PS384",
            padding: RsaPadding::Pss,
            digest: RsaDigest::Sha384,
        }
    }

    /// RSASSA-PSS with SHA-512 (`PS512`).
    pub fn ps512() -> Self {
        RsaSignature {
            code: "PS512",
            padding: RsaPadding::Pss,
            digest: RsaDigest::Sha512,
        }
    }

    fn sign_bytes(&self, key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signature = match (self.padding, self.digest) {
            (RsaPadding::Pkcs1v15, RsaDigest::Sha256) => {
                rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone())
                    .try_sign(data)
                    .map(|s| s.to_vec())
            }
            (RsaPadding::Pkcs1v15, RsaDigest::Sha384) => {
                rsa::pkcs1v15::SigningKey::<Sha384>::new(key.clone())
                    .try_sign(data)
                    .map(|s| s.to_vec())
            }
            (RsaPadding::Pkcs1v15, RsaDigest::Sha512) => {
                rsa::pkcs1v15::SigningKey::<Sha512>::new(key.clone())
                    .try_sign(data)
                    .map(|s| s.to_vec())
            }
            (RsaPadding::Pss, RsaDigest::Sha256) => rsa::pss::SigningKey::<Sha256>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, data)
                .map(|s| s.to_vec()),
            (RsaPadding::Pss, RsaDigest::Sha384) => rsa::pss::SigningKey::<Sha384>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, data)
                .map(|s| s.to_vec()),
            (RsaPadding::Pss, RsaDigest::Sha512) => rsa::pss::SigningKey::<Sha512>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, data)
                .map(|s| s.to_vec()),
        };
        signature.map_err(CryptoError::Signature)
    }

    fn verify_bytes(
        &self,
        key: &RsaPrivateKey,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let public = key.to_public_key();
        let verified = match (self.padding, self.digest) {
            (RsaPadding::Pkcs1v15, RsaDigest::Sha256) => {
                rsa::pkcs1v15::Signature::try_from(signature).and_then(|sig| {
                    rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public).verify(data, &sig)
                })
            }
            (RsaPadding::Pkcs1v15, RsaDigest::Sha384) => {
                rsa::pkcs1v15::Signature::try_from(signature).and_then(|sig| {
                    rsa::pkcs1v15::VerifyingKey::<Sha384>::new(public).verify(data, &sig)
                })
            }
            (RsaPadding::Pkcs1v15, RsaDigest::Sha512) => {
                rsa::pkcs1v15::Signature::try_from(signature).and_then(|sig| {
                    rsa::pkcs1v15::VerifyingKey::<Sha512>::new(public).verify(data, &sig)
                })
            }
            (RsaPadding::Pss, RsaDigest::Sha256) => rsa::pss::Signature::try_from(signature)
                .and_then(|sig| rsa::pss::VerifyingKey::<Sha256>::new(public).verify(data, &sig)),
            (RsaPadding::Pss, RsaDigest::Sha384) => rsa::pss::Signature::try_from(signature)
                .and_then(|sig| rsa::pss::VerifyingKey::<Sha384>::new(public).verify(data, &sig)),
            (RsaPadding::Pss, RsaDigest::Sha512) => rsa::pss::Signature::try_from(signature)
                .and_then(|sig| rsa::pss::VerifyingKey::<Sha512>::new(public).verify(data, &sig)),
        };
        verified.map_err(|_| CryptoError::Integrity("RSA signature mismatch"))
    }
}

impl Algorithm for RsaSignature {
    fn code(&self) -> &str {
        self.code
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::DigitalSignature
    }

    fn key_sizes(&self) -> &[KeySizes] {
        KEY_SIZES
    }

    fn key_type(&self) -> KeyType {
        KeyType::Rsa
    }
}

impl SignatureAlgorithm for RsaSignature {
    fn signature_size_bytes(&self, key: &SecretKey) -> Result<usize, CryptoError> {
        validate_key(key, KeyType::Rsa, KEY_SIZES)?;
        Ok(key.key_size_bytes() as usize)
    }

    fn sign(&self, key: &SecretKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        validate_key(key, KeyType::Rsa, KEY_SIZES)?;
        self.sign_bytes(key.rsa_key()?, data)
    }

    fn verify(&self, key: &SecretKey, data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        validate_key(key, KeyType::Rsa, KEY_SIZES)?;
        self.verify_bytes(key.rsa_key()?, data, signature)
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    [
        RsaSignature::rs256(),
        RsaSignature::rs384(),
        RsaSignature::rs512(),
        RsaSignature::ps256(),
        RsaSignature::ps384(),
        RsaSignature::ps512(),
    ]
    .into_iter()
    .map(|alg| JoseAlgorithm::Signature(std::sync::Arc::new(alg)))
}

#[cfg(test)]
pub(crate) mod jwk_reader {
    use crate::base64data;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn to_biguint(v: &serde_json::Value) -> Option<rsa::BigUint> {
        let val = strip_whitespace(v.as_str()?);
        Some(rsa::BigUint::from_bytes_be(
            base64data::decode(&val).ok()?.as_slice(),
        ))
    }

    pub(crate) fn rsa(key: &serde_json::Value) -> rsa::RsaPrivateKey {
        let primes = vec![
            to_biguint(&key["p"]).expect("p"),
            to_biguint(&key["q"]).expect("q"),
        ];

        rsa::RsaPrivateKey::from_components(
            to_biguint(&key["n"]).expect("n"),
            to_biguint(&key["e"]).expect("e"),
            to_biguint(&key["d"]).expect("d"),
            primes,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::base64data;
    use crate::key::KeyMetadata;
    use serde_json::json;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn rfc7515_a2_key() -> SecretKey {
        let pkey = jwk_reader::rsa(&json!( {"kty":"RSA",
              "n":"ofgWCuLjybRlzo0tZWJjNiuSfb4p4fAkd_wWJcyQoTbji9k0l8W26mPddx
             HmfHQp-Vaw-4qPCJrcS2mJPMEzP1Pt0Bm4d4QlL-yRT-SFd2lZS-pCgNMs
             D1W_YpRPEwOWvG6b32690r2jZ47soMZo9wGzjb_7OMg0LOL-bSf63kpaSH
             SXndS5z5rexMdbBYUsLA9e-KXBdQOS-UTo7WTBEMa2R2CapHg665xsmtdV
             MTBQY4uDZlxvb3qCo5ZwKh9kG4LT6_I5IhlJH7aGhyxXFvUK-DWNmoudF8
             NAco9_h9iaGNj8q2ethFkMLs91kzk2PAcDTW9gb54h4FRWyuXpoQ",
              "e":"AQAB",
              "d":"Eq5xpGnNCivDflJsRQBXHx1hdR1k6Ulwe2JZD50LpXyWPEAeP88vLNO97I
             jlA7_GQ5sLKMgvfTeXZx9SE-7YwVol2NXOoAJe46sui395IW_GO-pWJ1O0
             BkTGoVEn2bKVRUCgu-GjBVaYLU6f3l9kJfFNS3E0QbVdxzubSu3Mkqzjkn
             439X0M_V51gfpRLI9JYanrC4D4qAdGcopV_0ZHHzQlBjudU2QvXt4ehNYT
             CBr6XCLQUShb1juUO1ZdiYoFaFQT5Tw8bGUl_x_jTj3ccPDVZFD9pIuhLh
             BOneufuBiB4cS98l2SR_RQyGWSeWjnczT0QU91p1DhOVRuOopznQ",
              "p":"4BzEEOtIpmVdVEZNCqS7baC4crd0pqnRH_5IB3jw3bcxGn6QLvnEtfdUdi
             YrqBdss1l58BQ3KhooKeQTa9AB0Hw_Py5PJdTJNPY8cQn7ouZ2KKDcmnPG
             BY5t7yLc1QlQ5xHdwW1VhvKn-nXqhJTBgIPgtldC-KDV5z-y2XDwGUc",
              "q":"uQPEfgmVtjL0Uyyx88GZFF1fOunH3-7cepKmtH4pxhtCoHqpWmT8YAmZxa
             ewHgHAjLYsp1ZSe7zFYHj7C6ul7TjeLQeZD_YwD66t62wDmpe_HlB-TnBA
             -njbglfIsRLtXlnDzQkv5dTltRJ11BKBBypeeF6689rjcJIDEz9RWdc"
             }
        ));
        SecretKey::rsa(pkey, KeyMetadata::default())
    }

    #[test]
    fn rfc7515_example_a2_signature() {
        let payload = strip_whitespace(
            "eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFt
        cGxlLmNvbS9pc19yb290Ijp0cnVlfQ",
        );
        let header = strip_whitespace("eyJhbGciOiJSUzI1NiJ9");
        let message = format!("{}.{}", header, payload);

        let key = rfc7515_a2_key();
        let algorithm = RsaSignature::rs256();

        let signature = algorithm.sign(&key, message.as_bytes()).unwrap();
        assert_eq!(
            base64data::encode(&signature),
            strip_whitespace(
                "
                cC4hiUPoj9Eetdgtv3hF80EGrhuB__dzERat0XF9g2VtQgr9PJbu3XOiZj5RZmh7
                AAuHIm4Bh-0Qc_lF5YKt_O8W2Fp5jujGbds9uJdbF9CUAr7t1dnZcAcQjbKBYNX4
                BAynRFdiuB--f_nZLgrnbyTyWzO75vRK5h6xBArLIARNPvkSjtQBMHlb1L07Qe7K
                0GarZRmB_eSN9383LcOLn6_dO--xi12jzDwusC-eOkHWEsqtFZESc6BfI7noOPqv
                hJ1phCnvWh6IeYI2w9QOYEUipUTI8np6LbgGY9Fs98rqVt5AXLIhWkWywlVmtVrB
                p0igcN_IoypGlUPQGe77Rw"
            )
        );

        algorithm
            .verify(&key, message.as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn pss_round_trip_and_tamper_rejection() {
        let key = rfc7515_a2_key();
        let algorithm = RsaSignature::ps256();

        let signature = algorithm.sign(&key, b"data").unwrap();
        assert_eq!(signature.len(), 256);
        algorithm.verify(&key, b"data", &signature).unwrap();

        let mut tampered = signature.clone();
        tampered[0] ^= 0x80;
        assert!(matches!(
            algorithm.verify(&key, b"data", &tampered),
            Err(CryptoError::Integrity(_))
        ));
        assert!(matches!(
            algorithm.verify(&key, b"other", &signature),
            Err(CryptoError::Integrity(_))
        ));
    }

    #[test]
    fn signature_size_follows_key() {
        let key = rfc7515_a2_key();
        assert_eq!(
            RsaSignature::rs256().signature_size_bytes(&key).unwrap(),
            256
        );
    }
}
