//! AES Key Wrap key management (A128KW, A192KW, A256KW), RFC 3394.
//!
//! Wraps a content-encryption key in 64-bit blocks over 6 rounds with
//! the fixed `0xA6A6A6A6A6A6A6A6` initial value; unwrap fails with an
//! integrity error unless the recovered value equals that IV exactly.
//! The plaintext key must be at least 128 bits and a multiple of 64.
//!
//! Backed by the [`aes_kw`] crate, which implements the RFC's round
//! structure bit-for-bit.

use aes_kw::Kek;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::key::{validate_key, KeyType, SecretKey};
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, JoseAlgorithm, KeyManagementAlgorithm};

/// Wrapping adds one 64-bit block to the key data.
const SEMIBLOCK_BYTES: usize = 8;

/// An AES Key Wrap algorithm for one KEK size.
#[derive(Debug, Clone)]
pub struct AesKeyWrap {
    code: &'static str,
    kek_bytes: usize,
    key_sizes: [KeySizes; 1],
}

impl AesKeyWrap {
    fn new(code: &'static str, kek_bytes: usize) -> Self {
        AesKeyWrap {
            code,
            kek_bytes,
            key_sizes: [KeySizes::fixed(kek_bytes as u32 * 8)],
        }
    }

    /// AES-128 Key Wrap (`A128KW`).
    pub fn a128kw() -> Self {
        Self::new("A128KW", 16)
    }

    /// AES-192 Key Wrap (`A192KW`).
    pub fn a192kw() -> Self {
        Self::new("A192KW", 24)
    }

    /// AES-256 Key Wrap (`A256KW`).
    pub fn a256kw() -> Self {
        Self::new("A256KW", 32)
    }

    fn check_data(
        &self,
        data_len: usize,
        min_semiblocks: usize,
        parameter: &'static str,
    ) -> Result<(), CryptoError> {
        // Whole semiblocks only.
        if data_len < min_semiblocks * SEMIBLOCK_BYTES || data_len % SEMIBLOCK_BYTES != 0 {
            return Err(CryptoError::InvalidSize { parameter });
        }
        Ok(())
    }
}

impl Algorithm for AesKeyWrap {
    fn code(&self) -> &str {
        self.code
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::KeyManagement
    }

    fn key_sizes(&self) -> &[KeySizes] {
        &self.key_sizes
    }

    fn key_type(&self) -> KeyType {
        KeyType::Symmetric
    }
}

impl KeyManagementAlgorithm for AesKeyWrap {
    fn wrapped_size_bytes(&self, cek_len: usize) -> usize {
        cek_len + SEMIBLOCK_BYTES
    }

    fn wrap_key(&self, kek: &SecretKey, cek: &[u8]) -> Result<Vec<u8>, CryptoError> {
        validate_key(kek, KeyType::Symmetric, &self.key_sizes)?;
        // The plaintext key must be at least 128 bits.
        self.check_data(cek.len(), 2, "cek")?;

        let kek_bytes = kek.symmetric_bytes()?;
        let mut wrapped = vec![0u8; cek.len() + SEMIBLOCK_BYTES];
        let result = match self.kek_bytes {
            16 => Kek::<aes::Aes128>::try_from(kek_bytes).and_then(|k| k.wrap(cek, &mut wrapped)),
            24 => Kek::<aes::Aes192>::try_from(kek_bytes).and_then(|k| k.wrap(cek, &mut wrapped)),
            _ => Kek::<aes::Aes256>::try_from(kek_bytes).and_then(|k| k.wrap(cek, &mut wrapped)),
        };
        result.map_err(|_| CryptoError::Integrity("AES key wrap failed"))?;
        Ok(wrapped)
    }

    fn unwrap_key(
        &self,
        kek: &SecretKey,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        validate_key(kek, KeyType::Symmetric, &self.key_sizes)?;
        // A legal wrap of a 128-bit key is three semiblocks; anything
        // shorter cannot have come from wrap_key.
        self.check_data(wrapped.len(), 3, "wrapped")?;

        let kek_bytes = kek.symmetric_bytes()?;
        let mut cek = Zeroizing::new(vec![0u8; wrapped.len() - SEMIBLOCK_BYTES]);
        let result = match self.kek_bytes {
            16 => Kek::<aes::Aes128>::try_from(kek_bytes).and_then(|k| k.unwrap(wrapped, cek.as_mut_slice())),
            24 => Kek::<aes::Aes192>::try_from(kek_bytes).and_then(|k| k.unwrap(wrapped, cek.as_mut_slice())),
            _ => Kek::<aes::Aes256>::try_from(kek_bytes).and_then(|k| k.unwrap(wrapped, cek.as_mut_slice())),
        };
        result.map_err(|_| CryptoError::Integrity("AES key unwrap integrity check failed"))?;
        Ok(cek)
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    [
        AesKeyWrap::a128kw(),
        AesKeyWrap::a192kw(),
        AesKeyWrap::a256kw(),
    ]
    .into_iter()
    .map(|alg| JoseAlgorithm::KeyManagement(std::sync::Arc::new(alg)))
}
