//! Elliptic Curve Digital Signature Algorithm (ES256, ES384, ES512).
//!
//! Signatures are produced deterministically per [RFC 6979] by the
//! `p256`, `p384` and `p521` crates, serialized as the fixed-width `R ‖ S`
//! concatenation JOSE requires, not ASN.1 DER. The signature length
//! is `2 * ceil(curve_bits / 8)`: 64, 96, or 132 bytes.
//!
//! The key size is the curve modulus; ES512 uses P-521, whose 521-bit
//! modulus is the one curve size that is not a whole number of bytes.
//!
//! [RFC 6979]: https://tools.ietf.org/html/rfc6979

use signature::{Signer, Verifier};

use crate::error::CryptoError;
use crate::key::{validate_key, EccKeyPair, KeyType, SecretKey};
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, JoseAlgorithm, SignatureAlgorithm};

/// The curve an [`EcdsaSignature`] operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EcdsaCurve {
    P256,
    P384,
    P521,
}

impl EcdsaCurve {
    fn bits(self) -> u32 {
        match self {
            EcdsaCurve::P256 => 256,
            EcdsaCurve::P384 => 384,
            EcdsaCurve::P521 => 521,
        }
    }

    fn signature_bytes(self) -> usize {
        2 * (self.bits() as usize).div_ceil(8)
    }
}

/// An ECDSA signature algorithm for one NIST curve.
#[derive(Debug, Clone)]
pub struct EcdsaSignature {
    code: &'static str,
    curve: EcdsaCurve,
    key_sizes: [KeySizes; 1],
}

impl EcdsaSignature {
    fn new(code: &'static str, curve: EcdsaCurve) -> Self {
        EcdsaSignature {
            code,
            curve,
            key_sizes: [KeySizes::fixed(curve.bits())],
        }
    }

    /// ECDSA with P-256 and SHA-256 (`ES256`).
    pub fn es256() -> Self {
        Self::new("ES256", EcdsaCurve::P256)
    }

    /// ECDSA with P-384 and SHA-384 (`ES384`).
    pub fn es384() -> Self {
        Self::new("ES384", EcdsaCurve::P384)
    }

    /// ECDSA with P-521 and SHA-512 (`ES512`).
    pub fn es512() -> Self {
        Self::new("ES512", EcdsaCurve::P521)
    }

    fn check_curve(&self, key: &EccKeyPair) -> Result<(), CryptoError> {
        let matches = matches!(
            (self.curve, key),
            (EcdsaCurve::P256, EccKeyPair::P256(_))
                | (EcdsaCurve::P384, EccKeyPair::P384(_))
                | (EcdsaCurve::P521, EccKeyPair::P521(_))
        );
        if matches {
            Ok(())
        } else {
            Err(CryptoError::InvalidKeySize {
                bits: key.curve_bits(),
            })
        }
    }
}

impl Algorithm for EcdsaSignature {
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
        KeyType::Ecc
    }
}

impl SignatureAlgorithm for EcdsaSignature {
    fn signature_size_bytes(&self, key: &SecretKey) -> Result<usize, CryptoError> {
        validate_key(key, KeyType::Ecc, &self.key_sizes)?;
        Ok(self.curve.signature_bytes())
    }

    fn sign(&self, key: &SecretKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        validate_key(key, KeyType::Ecc, &self.key_sizes)?;
        let pair = key.ecc_key()?;
        self.check_curve(pair)?;

        let signature = match pair {
            EccKeyPair::P256(secret) => {
                let signing = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature =
                    signing.try_sign(data).map_err(CryptoError::Signature)?;
                signature.to_bytes().to_vec()
            }
            EccKeyPair::P384(secret) => {
                let signing = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature =
                    signing.try_sign(data).map_err(CryptoError::Signature)?;
                signature.to_bytes().to_vec()
            }
            EccKeyPair::P521(secret) => {
                // p521's ecdsa wrapper types take the scalar bytes, not
                // the SecretKey.
                let signing = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                    .map_err(CryptoError::Signature)?;
                let signature: p521::ecdsa::Signature =
                    signing.try_sign(data).map_err(CryptoError::Signature)?;
                signature.to_bytes().to_vec()
            }
        };
        Ok(signature)
    }

    fn verify(&self, key: &SecretKey, data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        validate_key(key, KeyType::Ecc, &self.key_sizes)?;
        let pair = key.ecc_key()?;
        self.check_curve(pair)?;

        if signature.len() != self.curve.signature_bytes() {
            return Err(CryptoError::InvalidSize {
                parameter: "signature",
            });
        }

        let verified = match pair {
            EccKeyPair::P256(secret) => {
                p256::ecdsa::Signature::from_slice(signature).and_then(|sig| {
                    p256::ecdsa::SigningKey::from(secret)
                        .verifying_key()
                        .verify(data, &sig)
                })
            }
            EccKeyPair::P384(secret) => {
                p384::ecdsa::Signature::from_slice(signature).and_then(|sig| {
                    p384::ecdsa::SigningKey::from(secret)
                        .verifying_key()
                        .verify(data, &sig)
                })
            }
            EccKeyPair::P521(secret) => {
                p521::ecdsa::Signature::from_slice(signature).and_then(|sig| {
                    let signing = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?;
                    p521::ecdsa::VerifyingKey::from(&signing).verify(data, &sig)
                })
            }
        };
        verified.map_err(|_| CryptoError::Integrity("ECDSA signature mismatch"))
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    [
        EcdsaSignature::es256(),
        EcdsaSignature::es384(),
        EcdsaSignature::es512(),
    ]
    .into_iter()
    .map(|alg| JoseAlgorithm::Signature(std::sync::Arc::new(alg)))
}
