//! The `none` signature algorithm (RFC 7518 §3.6).
//!
//! Produces a zero-length signature and verifies only a zero-length
//! signature. Tokens using it carry no integrity protection; the
//! compact serializer only accepts them when the header says so.

use crate::error::CryptoError;
use crate::key::{KeyType, SecretKey};
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, JoseAlgorithm, SignatureAlgorithm};

// Any symmetric key (including an empty one) satisfies "none".
const KEY_SIZES: &[KeySizes] = &[KeySizes::range(0, 65536, 0)];

/// The `none` signature algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneSignature;

impl NoneSignature {
    /// Create the algorithm.
    pub fn new() -> Self {
        NoneSignature
    }
}

impl Algorithm for NoneSignature {
    fn code(&self) -> &str {
        "none"
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::DigitalSignature
    }

    fn key_sizes(&self) -> &[KeySizes] {
        KEY_SIZES
    }

    fn key_type(&self) -> KeyType {
        KeyType::Symmetric
    }
}

impl SignatureAlgorithm for NoneSignature {
    fn signature_size_bytes(&self, _key: &SecretKey) -> Result<usize, CryptoError> {
        Ok(0)
    }

    fn sign(&self, _key: &SecretKey, _data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }

    fn verify(&self, _key: &SecretKey, _data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(CryptoError::Integrity(
                "'none' tokens must carry an empty signature",
            ))
        }
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    std::iter::once(JoseAlgorithm::Signature(std::sync::Arc::new(
        NoneSignature::new(),
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::KeyMetadata;

    #[test]
    fn verify_accepts_only_empty_signatures() {
        let alg = NoneSignature::new();
        let key = SecretKey::symmetric(Vec::new(), KeyMetadata::default());

        assert_eq!(alg.sign(&key, b"payload").unwrap(), Vec::<u8>::new());
        assert!(alg.verify(&key, b"payload", &[]).is_ok());
        assert!(matches!(
            alg.verify(&key, b"payload", &[0]),
            Err(CryptoError::Integrity(_))
        ));
    }
}
