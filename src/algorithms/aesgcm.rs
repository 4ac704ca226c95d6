//! AES-GCM content encryption (A128GCM, A192GCM, A256GCM).
//!
//! Standard GCM parameters: 96-bit nonce, 128-bit tag, ciphertext the
//! same length as the plaintext. The tag is detached, matching the JWE
//! compact form where it travels in its own segment.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::key::KeyType;
use crate::sizes::KeySizes;

use super::{AeadAlgorithm, AeadOutput, Algorithm, AlgorithmKind, JoseAlgorithm};

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

const NONCE_BYTES: usize = 12;
const TAG_BYTES: usize = 16;

/// An AES-GCM algorithm for one key size.
#[derive(Debug, Clone)]
pub struct AesGcmEncryption {
    code: &'static str,
    key_bytes: usize,
    key_sizes: [KeySizes; 1],
}

impl AesGcmEncryption {
    fn new(code: &'static str, key_bytes: usize) -> Self {
        AesGcmEncryption {
            code,
            key_bytes,
            key_sizes: [KeySizes::fixed(key_bytes as u32 * 8)],
        }
    }

    /// AES-128-GCM (`A128GCM`).
    pub fn a128gcm() -> Self {
        Self::new("A128GCM", 16)
    }

    /// AES-192-GCM (`A192GCM`).
    pub fn a192gcm() -> Self {
        Self::new("A192GCM", 24)
    }

    /// AES-256-GCM (`A256GCM`).
    pub fn a256gcm() -> Self {
        Self::new("A256GCM", 32)
    }

    fn check_parameters(&self, key: &[u8], nonce: &[u8]) -> Result<(), CryptoError> {
        if key.len() != self.key_bytes {
            return Err(CryptoError::InvalidSize { parameter: "key" });
        }
        if nonce.len() != NONCE_BYTES {
            return Err(CryptoError::InvalidSize { parameter: "nonce" });
        }
        Ok(())
    }
}

fn encrypt_with<A>(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<AeadOutput, CryptoError>
where
    A: AeadInPlace + KeyInit,
{
    let cipher = A::new_from_slice(key).map_err(|_| CryptoError::InvalidSize { parameter: "key" })?;
    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, &mut ciphertext)
        .map_err(|_| CryptoError::Integrity("AES-GCM encryption failed"))?;
    Ok(AeadOutput {
        ciphertext,
        tag: tag.to_vec(),
    })
}

fn decrypt_with<A>(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
    tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError>
where
    A: AeadInPlace + KeyInit,
{
    let cipher = A::new_from_slice(key).map_err(|_| CryptoError::InvalidSize { parameter: "key" })?;
    let mut plaintext = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            plaintext.as_mut_slice(),
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptoError::Integrity("AES-GCM tag mismatch"))?;
    Ok(plaintext)
}

impl Algorithm for AesGcmEncryption {
    fn code(&self) -> &str {
        self.code
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::AuthenticatedEncryption
    }

    fn key_sizes(&self) -> &[KeySizes] {
        &self.key_sizes
    }

    fn key_type(&self) -> KeyType {
        KeyType::Symmetric
    }
}

impl AeadAlgorithm for AesGcmEncryption {
    fn key_size_bytes(&self) -> usize {
        self.key_bytes
    }

    fn nonce_size_bytes(&self) -> usize {
        NONCE_BYTES
    }

    fn tag_size_bytes(&self) -> usize {
        TAG_BYTES
    }

    fn ciphertext_length(&self, plaintext_len: usize) -> usize {
        plaintext_len
    }

    fn encrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadOutput, CryptoError> {
        self.check_parameters(key, nonce)?;
        match self.key_bytes {
            16 => encrypt_with::<Aes128Gcm>(key, nonce, plaintext, aad),
            24 => encrypt_with::<Aes192Gcm>(key, nonce, plaintext, aad),
            _ => encrypt_with::<Aes256Gcm>(key, nonce, plaintext, aad),
        }
    }

    fn decrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.check_parameters(key, nonce)?;
        if tag.len() != TAG_BYTES {
            return Err(CryptoError::InvalidSize { parameter: "tag" });
        }
        match self.key_bytes {
            16 => decrypt_with::<Aes128Gcm>(key, nonce, ciphertext, aad, tag),
            24 => decrypt_with::<Aes192Gcm>(key, nonce, ciphertext, aad, tag),
            _ => decrypt_with::<Aes256Gcm>(key, nonce, ciphertext, aad, tag),
        }
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    [
        AesGcmEncryption::a128gcm(),
        AesGcmEncryption::a192gcm(),
        AesGcmEncryption::a256gcm(),
    ]
    .into_iter()
    .map(|alg| JoseAlgorithm::AuthenticatedEncryption(std::sync::Arc::new(alg)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_all_key_sizes() {
        for alg in [
            AesGcmEncryption::a128gcm(),
            AesGcmEncryption::a192gcm(),
            AesGcmEncryption::a256gcm(),
        ] {
            let key = vec![0x42u8; alg.key_size_bytes()];
            let nonce = vec![0x24u8; alg.nonce_size_bytes()];

            let output = alg.encrypt(&key, &nonce, b"plaintext", b"aad").unwrap();
            assert_eq!(output.ciphertext.len(), b"plaintext".len());
            assert_eq!(output.tag.len(), alg.tag_size_bytes());

            let plaintext = alg
                .decrypt(&key, &nonce, &output.ciphertext, b"aad", &output.tag)
                .unwrap();
            assert_eq!(&plaintext[..], b"plaintext");
        }
    }

    #[test]
    fn tampered_tag_or_aad_fails() {
        let alg = AesGcmEncryption::a256gcm();
        let key = vec![1u8; 32];
        let nonce = vec![2u8; 12];

        let output = alg.encrypt(&key, &nonce, b"secret", b"aad").unwrap();

        let mut bad_tag = output.tag.clone();
        bad_tag[0] ^= 1;
        assert!(matches!(
            alg.decrypt(&key, &nonce, &output.ciphertext, b"aad", &bad_tag),
            Err(CryptoError::Integrity(_))
        ));
        assert!(matches!(
            alg.decrypt(&key, &nonce, &output.ciphertext, b"other", &output.tag),
            Err(CryptoError::Integrity(_))
        ));
    }

    #[test]
    fn parameter_sizes_are_validated_first() {
        let alg = AesGcmEncryption::a128gcm();
        assert!(matches!(
            alg.encrypt(&[0u8; 15], &[0u8; 12], b"", b""),
            Err(CryptoError::InvalidSize { parameter: "key" })
        ));
        assert!(matches!(
            alg.encrypt(&[0u8; 16], &[0u8; 11], b"", b""),
            Err(CryptoError::InvalidSize { parameter: "nonce" })
        ));
        assert!(matches!(
            alg.decrypt(&[0u8; 16], &[0u8; 12], b"", b"", &[0u8; 15]),
            Err(CryptoError::InvalidSize { parameter: "tag" })
        ));
    }
}
