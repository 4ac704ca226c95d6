//! JSON Web Algorithms (RFC 7518).
//!
//! Each algorithm carries exactly one capability (digital signature,
//! key management, authenticated encryption, or compression), expressed
//! as the closed [`JoseAlgorithm`] union. The registry
//! ([`AlgorithmCollection`]) maps stable algorithm codes (`"RS256"`,
//! `"A128GCM"`, `"A128KW"`, …) to these variants; callers never
//! downcast.
//!
//! Algorithms are stateless apart from their construction parameters
//! and safe for unbounded concurrent use.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::key::{KeyType, SecretKey};
use crate::sizes::KeySizes;

pub mod aescbc;
pub mod aesgcm;
pub mod compression;
pub mod ecdsa;
pub mod hmac;
pub mod keywrap;
pub mod none;
pub mod rsa;

mod collection;

pub use collection::{
    AlgorithmCollection, AlgorithmDataSource, CompositeAlgorithmDataSource,
    StaticAlgorithmDataSource,
};

/// The capability an algorithm provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    /// Signing and signature verification.
    DigitalSignature,
    /// Wrapping and unwrapping content-encryption keys.
    KeyManagement,
    /// Authenticated encryption with associated data.
    AuthenticatedEncryption,
    /// Payload compression (JWE `zip`).
    Compression,
}

/// Properties common to every algorithm.
pub trait Algorithm: Send + Sync {
    /// The stable, globally unique code, e.g. `"RS256"`.
    fn code(&self) -> &str;

    /// The single capability this algorithm provides.
    fn kind(&self) -> AlgorithmKind;

    /// Legal key sizes for this algorithm.
    fn key_sizes(&self) -> &[KeySizes];

    /// The concrete key type this algorithm expects.
    fn key_type(&self) -> KeyType;
}

/// A digital signature algorithm.
pub trait SignatureAlgorithm: Algorithm {
    /// The signature length in bytes for the given key.
    fn signature_size_bytes(&self, key: &SecretKey) -> Result<usize, CryptoError>;

    /// Sign `data`, returning the raw signature bytes.
    fn sign(&self, key: &SecretKey, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Verify `signature` over `data`.
    ///
    /// A mismatch is [`CryptoError::Integrity`]; comparisons never
    /// branch on partial equality.
    fn verify(&self, key: &SecretKey, data: &[u8], signature: &[u8]) -> Result<(), CryptoError>;
}

/// A key-management (key wrapping) algorithm.
pub trait KeyManagementAlgorithm: Algorithm {
    /// The wrapped length in bytes for a content key of `cek_len` bytes.
    fn wrapped_size_bytes(&self, cek_len: usize) -> usize;

    /// Wrap a content-encryption key under `kek`.
    fn wrap_key(&self, kek: &SecretKey, cek: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Unwrap a content-encryption key under `kek`.
    ///
    /// An integrity-check failure (RFC 3394 IV mismatch) is
    /// [`CryptoError::Integrity`].
    fn unwrap_key(&self, kek: &SecretKey, wrapped: &[u8])
        -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

/// Detached ciphertext and authentication tag from an AEAD encryption.
#[derive(Debug)]
pub struct AeadOutput {
    /// The ciphertext, without the tag.
    pub ciphertext: Vec<u8>,
    /// The authentication tag.
    pub tag: Vec<u8>,
}

/// An authenticated-encryption (AEAD) algorithm.
///
/// All parameters are validated for length before any cryptographic
/// work; violations are [`CryptoError::InvalidSize`] naming the
/// offending parameter, never a generic crypto failure.
pub trait AeadAlgorithm: Algorithm {
    /// Required content-encryption key length in bytes.
    fn key_size_bytes(&self) -> usize;

    /// Required nonce length in bytes.
    fn nonce_size_bytes(&self) -> usize;

    /// Authentication tag length in bytes.
    fn tag_size_bytes(&self) -> usize;

    /// Ciphertext length for a plaintext of `plaintext_len` bytes.
    fn ciphertext_length(&self, plaintext_len: usize) -> usize;

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    fn encrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadOutput, CryptoError>;

    /// Verify `tag` and decrypt `ciphertext`.
    ///
    /// Tag verification happens before any decryption; on mismatch the
    /// would-be plaintext is never produced.
    fn decrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

/// A payload compression algorithm (JWE `zip`).
pub trait CompressionAlgorithm: Algorithm {
    /// Compress `data`.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decompress `data`.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A registered algorithm: the closed union of capability-carrying
/// variants.
#[derive(Clone)]
pub enum JoseAlgorithm {
    /// A digital signature algorithm.
    Signature(Arc<dyn SignatureAlgorithm>),
    /// A key-management algorithm.
    KeyManagement(Arc<dyn KeyManagementAlgorithm>),
    /// An authenticated-encryption algorithm.
    AuthenticatedEncryption(Arc<dyn AeadAlgorithm>),
    /// A compression algorithm.
    Compression(Arc<dyn CompressionAlgorithm>),
}

impl JoseAlgorithm {
    /// The algorithm's code.
    pub fn code(&self) -> &str {
        self.base().code()
    }

    /// The algorithm's capability.
    pub fn kind(&self) -> AlgorithmKind {
        self.base().kind()
    }

    /// Legal key sizes.
    pub fn key_sizes(&self) -> &[KeySizes] {
        self.base().key_sizes()
    }

    /// Expected key type.
    pub fn key_type(&self) -> KeyType {
        self.base().key_type()
    }

    fn base(&self) -> &dyn Algorithm {
        match self {
            JoseAlgorithm::Signature(alg) => alg.as_ref(),
            JoseAlgorithm::KeyManagement(alg) => alg.as_ref(),
            JoseAlgorithm::AuthenticatedEncryption(alg) => alg.as_ref(),
            JoseAlgorithm::Compression(alg) => alg.as_ref(),
        }
    }

    /// The signature capability, when this algorithm carries it.
    pub fn as_signature(&self) -> Option<Arc<dyn SignatureAlgorithm>> {
        match self {
            JoseAlgorithm::Signature(alg) => Some(Arc::clone(alg)),
            _ => None,
        }
    }

    /// The key-management capability, when this algorithm carries it.
    pub fn as_key_management(&self) -> Option<Arc<dyn KeyManagementAlgorithm>> {
        match self {
            JoseAlgorithm::KeyManagement(alg) => Some(Arc::clone(alg)),
            _ => None,
        }
    }

    /// The AEAD capability, when this algorithm carries it.
    pub fn as_encryption(&self) -> Option<Arc<dyn AeadAlgorithm>> {
        match self {
            JoseAlgorithm::AuthenticatedEncryption(alg) => Some(Arc::clone(alg)),
            _ => None,
        }
    }

    /// The compression capability, when this algorithm carries it.
    pub fn as_compression(&self) -> Option<Arc<dyn CompressionAlgorithm>> {
        match self {
            JoseAlgorithm::Compression(alg) => Some(Arc::clone(alg)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for JoseAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoseAlgorithm")
            .field("code", &self.code())
            .field("kind", &self.kind())
            .finish()
    }
}
