//! HMAC signing algorithms (HS256, HS384, HS512).
//!
//! Based on the [hmac](https://crates.io/crates/hmac) crate. Keys are
//! arbitrary symmetric bytes, but must be at least as large as the
//! hash output (NIST SP 800-107 guidance), in 8-bit increments.

use digest::Mac;
use hmac::SimpleHmac;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::CryptoError;
use crate::key::{validate_key, KeyType, SecretKey};
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, JoseAlgorithm, SignatureAlgorithm};

#[derive(Debug, Clone, Copy)]
enum HmacDigest {
    Sha256,
    Sha384,
    Sha512,
}

impl HmacDigest {
    fn output_bytes(self) -> usize {
        match self {
            HmacDigest::Sha256 => 32,
            HmacDigest::Sha384 => 48,
            HmacDigest::Sha512 => 64,
        }
    }

    fn mac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        // A fresh, one-shot digest per operation keeps the algorithm
        // value stateless and reusable across threads.
        match self {
            HmacDigest::Sha256 => {
                let mut mac: SimpleHmac<Sha256> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            HmacDigest::Sha384 => {
                let mut mac: SimpleHmac<Sha384> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            HmacDigest::Sha512 => {
                let mut mac: SimpleHmac<Sha512> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    fn verify(self, key: &[u8], data: &[u8], signature: &[u8]) -> Result<(), digest::MacError> {
        // Mac::verify_slice compares in constant time.
        match self {
            HmacDigest::Sha256 => {
                let mut mac: SimpleHmac<Sha256> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.verify_slice(signature)
            }
            HmacDigest::Sha384 => {
                let mut mac: SimpleHmac<Sha384> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.verify_slice(signature)
            }
            HmacDigest::Sha512 => {
                let mut mac: SimpleHmac<Sha512> =
                    SimpleHmac::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.verify_slice(signature)
            }
        }
    }
}

/// An HMAC signature algorithm for one of the SHA-2 hashes.
#[derive(Debug, Clone)]
pub struct HmacSignature {
    code: &'static str,
    digest: HmacDigest,
    key_sizes: [KeySizes; 1],
}

impl HmacSignature {
    fn new(code: &'static str, digest: HmacDigest) -> Self {
        let hash_bits = digest.output_bytes() as u32 * 8;
        HmacSignature {
            code,
            digest,
            // Key must be at least the hash output, any byte length up.
            key_sizes: [KeySizes::range(hash_bits, 65536, 8)],
        }
    }

    /// HMAC with SHA-256 (`HS256`).
    pub fn hs256() -> Self {
        Self::new("HS256", HmacDigest::Sha256)
    }

    /// HMAC with SHA-384 (`HS384`).
    pub fn hs384() -> Self {
        Self::new("HS384", HmacDigest::Sha384)
    }

    /// HMAC with SHA-512 (`HS512`).
    pub fn hs512() -> Self {
        Self::new("HS512", HmacDigest::Sha512)
    }
}

impl Algorithm for HmacSignature {
    fn code(&self) -> &str {
        self.code
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::DigitalSignature
    }

    fn key_sizes(&self) -> &[KeySizes] {
        &self.key_sizes
    }

    fn key_type(&self) -> KeyType {
        KeyType::Symmetric
    }
}

impl SignatureAlgorithm for HmacSignature {
    fn signature_size_bytes(&self, _key: &SecretKey) -> Result<usize, CryptoError> {
        Ok(self.digest.output_bytes())
    }

    fn sign(&self, key: &SecretKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        validate_key(key, KeyType::Symmetric, &self.key_sizes)?;
        Ok(self.digest.mac(key.symmetric_bytes()?, data))
    }

    fn verify(&self, key: &SecretKey, data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        validate_key(key, KeyType::Symmetric, &self.key_sizes)?;
        self.digest
            .verify(key.symmetric_bytes()?, data, signature)
            .map_err(|_| CryptoError::Integrity("HMAC signature mismatch"))
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    [
        HmacSignature::hs256(),
        HmacSignature::hs384(),
        HmacSignature::hs512(),
    ]
    .into_iter()
    .map(|alg| JoseAlgorithm::Signature(std::sync::Arc::new(alg)))
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

    fn rfc7515_a1_key() -> SecretKey {
        let pkey = json!({
            "kty":"oct",
            "k":"AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75
                aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"
        });

        let key_data = strip_whitespace(pkey["k"].as_str().unwrap());
        let bytes = base64data::decode(&key_data).unwrap();
        SecretKey::symmetric(bytes, KeyMetadata::default())
    }

    #[test]
    fn rfc7515_example_a1_signature() {
        let payload = strip_whitespace(
            "eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFt
        cGxlLmNvbS9pc19yb290Ijp0cnVlfQ",
        );
        let header = strip_whitespace("eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9");
        let message = format!("{}.{}", header, payload);

        let key = rfc7515_a1_key();
        let algorithm = HmacSignature::hs256();

        let signature = algorithm.sign(&key, message.as_bytes()).unwrap();
        assert_eq!(
            base64data::encode(&signature),
            strip_whitespace("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
        );

        algorithm
            .verify(&key, message.as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn verify_rejects_flipped_bits() {
        let key = rfc7515_a1_key();
        let algorithm = HmacSignature::hs512();

        let mut signature = algorithm.sign(&key, b"data").unwrap();
        assert_eq!(signature.len(), 64);
        signature[17] ^= 0x01;
        assert!(matches!(
            algorithm.verify(&key, b"data", &signature),
            Err(CryptoError::Integrity(_))
        ));
    }

    #[test]
    fn short_keys_are_illegal() {
        let key = SecretKey::symmetric(vec![0u8; 16], KeyMetadata::default());
        let algorithm = HmacSignature::hs256();
        assert!(matches!(
            algorithm.sign(&key, b"data"),
            Err(CryptoError::InvalidKeySize { bits: 128 })
        ));
    }
}
