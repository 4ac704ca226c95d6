//! Secret key model.
//!
//! A [`SecretKey`] is typed key material plus JOSE metadata. The
//! material is a closed tagged union (symmetric bytes, an RSA key
//! pair, or a NIST elliptic-curve key pair), so capability checks are
//! explicit variant matches rather than downcasts.
//!
//! Key material is scope-bound: symmetric bytes zero themselves on
//! drop ([`zeroize::ZeroizeOnDrop`]), and the RustCrypto private key
//! types wrapped here do the same. Exported copies come back as
//! [`Zeroizing`] buffers so every exit path, including error paths,
//! wipes them.

use chrono::{DateTime, Utc};
use pkcs8::DecodePrivateKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::sizes::KeySizes;

mod provider;

pub use provider::{SecretKeyProvider, SecretKeyDataSource, StaticSecretKeyDataSource};

/// The intended use of a key, mirroring the JWK `use` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyUse {
    /// Signing and signature verification (`sig`).
    #[serde(rename = "sig")]
    Signature,
    /// Encryption and key management (`enc`).
    #[serde(rename = "enc")]
    Encryption,
}

/// The concrete shape of a key's material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Raw symmetric bytes (JWK `oct`).
    Symmetric,
    /// An RSA private key.
    Rsa,
    /// A NIST elliptic-curve private key.
    Ecc,
}

/// Metadata attached to a [`SecretKey`].
///
/// All fields are optional; a `None` use or algorithm means the key is
/// unrestricted in that dimension during credential selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Correlates to the JOSE `kid` header.
    pub key_id: Option<String>,
    /// Restricts the key to signing or encryption.
    pub key_use: Option<KeyUse>,
    /// Pins the key to a single algorithm code.
    pub algorithm: Option<String>,
    /// When the key stops being preferred for new operations.
    pub expires: Option<DateTime<Utc>>,
}

impl KeyMetadata {
    /// Metadata carrying only a key id.
    pub fn with_key_id(key_id: impl Into<String>) -> Self {
        KeyMetadata {
            key_id: Some(key_id.into()),
            ..Default::default()
        }
    }
}

/// Raw symmetric key bytes, zeroed on drop.
#[derive(Clone, PartialEq, Eq, zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: Vec<u8>,
}

impl SymmetricKey {
    /// Length of the key in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.key.len()
    }
}

impl<T> From<T> for SymmetricKey
where
    T: Into<Vec<u8>>,
{
    fn from(key: T) -> Self {
        Self { key: key.into() }
    }
}

impl AsRef<[u8]> for SymmetricKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &self.key.len())
            .finish()
    }
}

/// An elliptic-curve private key on one of the NIST curves.
///
/// `ES512` uses P-521, whose modulus is 521 bits, the one curve whose
/// size is not the hash size.
#[derive(Clone)]
pub enum EccKeyPair {
    /// NIST P-256 (`ES256`).
    P256(p256::SecretKey),
    /// NIST P-384 (`ES384`).
    P384(p384::SecretKey),
    /// NIST P-521 (`ES512`).
    P521(p521::SecretKey),
}

impl EccKeyPair {
    /// The curve modulus size in bits.
    pub fn curve_bits(&self) -> u32 {
        match self {
            EccKeyPair::P256(_) => 256,
            EccKeyPair::P384(_) => 384,
            EccKeyPair::P521(_) => 521,
        }
    }
}

impl std::fmt::Debug for EccKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let curve = match self {
            EccKeyPair::P256(_) => "P-256",
            EccKeyPair::P384(_) => "P-384",
            EccKeyPair::P521(_) => "P-521",
        };
        f.debug_struct("EccKeyPair").field("curve", &curve).finish()
    }
}

/// Key material, one variant per [`KeyType`].
#[derive(Clone)]
pub enum KeyMaterial {
    /// Raw symmetric bytes.
    Symmetric(SymmetricKey),
    /// An RSA private key (zeroed on drop by the `rsa` crate).
    Rsa(rsa::RsaPrivateKey),
    /// An elliptic-curve private key (zeroed on drop by the curve crates).
    Ecc(EccKeyPair),
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMaterial::Symmetric(key) => key.fmt(f),
            KeyMaterial::Rsa(_) => f.write_str("RsaKeyPair"),
            KeyMaterial::Ecc(key) => key.fmt(f),
        }
    }
}

/// A secret key with its JOSE metadata.
///
/// Immutable once constructed. Sensitive material is wiped when the
/// last reference drops; callers performing an operation hold their
/// own `Arc<SecretKey>` so a provider refresh cannot pull the material
/// out from under them.
#[derive(Debug, Clone)]
pub struct SecretKey {
    metadata: KeyMetadata,
    material: KeyMaterial,
}

impl SecretKey {
    /// Create a symmetric key from raw bytes.
    pub fn symmetric(key: impl Into<SymmetricKey>, metadata: KeyMetadata) -> Self {
        SecretKey {
            metadata,
            material: KeyMaterial::Symmetric(key.into()),
        }
    }

    /// Create a key from an already-parsed RSA private key.
    pub fn rsa(key: rsa::RsaPrivateKey, metadata: KeyMetadata) -> Self {
        SecretKey {
            metadata,
            material: KeyMaterial::Rsa(key),
        }
    }

    /// Create a key from an already-parsed elliptic-curve private key.
    pub fn ecc(key: EccKeyPair, metadata: KeyMetadata) -> Self {
        SecretKey {
            metadata,
            material: KeyMaterial::Ecc(key),
        }
    }

    /// Parse an asymmetric key from PKCS#8 DER bytes.
    ///
    /// Tries RSA first, then each NIST curve.
    pub fn from_pkcs8_der(der: &[u8], metadata: KeyMetadata) -> Result<Self, CryptoError> {
        if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
            return Ok(SecretKey::rsa(key, metadata));
        }
        if let Ok(key) = p256::SecretKey::from_pkcs8_der(der) {
            return Ok(SecretKey::ecc(EccKeyPair::P256(key), metadata));
        }
        if let Ok(key) = p384::SecretKey::from_pkcs8_der(der) {
            return Ok(SecretKey::ecc(EccKeyPair::P384(key), metadata));
        }
        if let Ok(key) = p521::SecretKey::from_pkcs8_der(der) {
            return Ok(SecretKey::ecc(EccKeyPair::P521(key), metadata));
        }
        Err(CryptoError::UnsupportedKey(
            "PKCS#8 document is not an RSA or NIST-curve private key",
        ))
    }

    /// Parse an asymmetric key from a PKCS#8 PEM document.
    pub fn from_pkcs8_pem(pem: &str, metadata: KeyMetadata) -> Result<Self, CryptoError> {
        let (_, document) = pkcs8::SecretDocument::from_pem(pem)
            .map_err(|_| CryptoError::UnsupportedKey("invalid PKCS#8 PEM document"))?;
        Self::from_pkcs8_der(document.as_bytes(), metadata)
    }

    /// The key id, when one was assigned.
    pub fn key_id(&self) -> Option<&str> {
        self.metadata.key_id.as_deref()
    }

    /// The key's metadata.
    pub fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    /// The key material variant.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// The concrete type of this key's material.
    pub fn key_type(&self) -> KeyType {
        match &self.material {
            KeyMaterial::Symmetric(_) => KeyType::Symmetric,
            KeyMaterial::Rsa(_) => KeyType::Rsa,
            KeyMaterial::Ecc(_) => KeyType::Ecc,
        }
    }

    /// The key size in bits.
    pub fn key_size_bits(&self) -> u32 {
        match &self.material {
            KeyMaterial::Symmetric(key) => key.len() as u32 * 8,
            KeyMaterial::Rsa(key) => {
                use rsa::traits::PublicKeyParts;
                key.n().bits() as u32
            }
            KeyMaterial::Ecc(key) => key.curve_bits(),
        }
    }

    /// The key size in whole bytes, `ceil(bits / 8)`.
    pub fn key_size_bytes(&self) -> u32 {
        self.key_size_bits().div_ceil(8)
    }

    /// Borrow the raw symmetric bytes for the duration of an operation.
    pub(crate) fn symmetric_bytes(&self) -> Result<&[u8], CryptoError> {
        match &self.material {
            KeyMaterial::Symmetric(key) => Ok(key.as_ref()),
            _ => Err(CryptoError::KeyTypeMismatch {
                expected: KeyType::Symmetric,
                actual: self.key_type(),
            }),
        }
    }

    /// Borrow the RSA private key for the duration of an operation.
    pub(crate) fn rsa_key(&self) -> Result<&rsa::RsaPrivateKey, CryptoError> {
        match &self.material {
            KeyMaterial::Rsa(key) => Ok(key),
            _ => Err(CryptoError::KeyTypeMismatch {
                expected: KeyType::Rsa,
                actual: self.key_type(),
            }),
        }
    }

    /// Borrow the elliptic-curve private key for the duration of an operation.
    pub(crate) fn ecc_key(&self) -> Result<&EccKeyPair, CryptoError> {
        match &self.material {
            KeyMaterial::Ecc(key) => Ok(key),
            _ => Err(CryptoError::KeyTypeMismatch {
                expected: KeyType::Ecc,
                actual: self.key_type(),
            }),
        }
    }

    /// Copy the symmetric key bytes into a caller-owned buffer.
    ///
    /// The buffer zeroes itself when dropped; the key never exposes a
    /// long-lived plaintext reference.
    pub fn export_symmetric(&self) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let mut out = Zeroizing::new(Vec::new());
        out.extend_from_slice(self.symmetric_bytes()?);
        Ok(out)
    }
}

/// The single gate every algorithm passes before touching key bytes:
/// the key's runtime type must match, then its size must be legal.
pub(crate) fn validate_key(
    key: &SecretKey,
    expected: KeyType,
    sizes: &[KeySizes],
) -> Result<(), CryptoError> {
    if key.key_type() != expected {
        return Err(CryptoError::KeyTypeMismatch {
            expected,
            actual: key.key_type(),
        });
    }
    let bits = key.key_size_bits();
    if !KeySizes::is_legal_size(sizes, bits) {
        return Err(CryptoError::InvalidKeySize { bits });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn symmetric_key_sizes() {
        let key = SecretKey::symmetric(vec![0u8; 32], KeyMetadata::default());
        assert_eq!(key.key_type(), KeyType::Symmetric);
        assert_eq!(key.key_size_bits(), 256);
        assert_eq!(key.key_size_bytes(), 32);
    }

    #[test]
    fn validate_gate_checks_type_before_size() {
        let key = SecretKey::symmetric(vec![0u8; 32], KeyMetadata::default());
        let err = validate_key(&key, KeyType::Rsa, &[KeySizes::fixed(256)]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyTypeMismatch { .. }));

        let err = validate_key(&key, KeyType::Symmetric, &[KeySizes::fixed(128)]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeySize { bits: 256 }));
    }

    #[test]
    fn export_is_a_fresh_copy() {
        let key = SecretKey::symmetric(vec![7u8; 16], KeyMetadata::with_key_id("k1"));
        let exported = key.export_symmetric().unwrap();
        assert_eq!(&exported[..], &[7u8; 16]);
        assert_eq!(key.key_id(), Some("k1"));
    }

    #[test]
    fn ecc_p521_reports_curve_modulus() {
        let key = SecretKey::ecc(
            EccKeyPair::P521(p521::SecretKey::random(&mut rand_core::OsRng)),
            KeyMetadata::default(),
        );
        assert_eq!(key.key_size_bits(), 521);
        assert_eq!(key.key_size_bytes(), 66);
    }
}
