//! Compact JOSE serialization.
//!
//! A compact token is dot-separated base64url segments: three for a
//! JWS (`header.payload.signature`) and five for a JWE
//! (`header.encrypted_key.nonce.ciphertext.tag`). [`CompactToken`]
//! classifies a string by segment count alone; the decoders do the
//! cryptography.
//!
//! Verification is fail-closed on `kid`: when the header names a key id
//! that resolves, only that key is tried, even if another key in the
//! set would verify. Without a resolving `kid` every candidate key is
//! tried in order. Payload bytes are only handed back after the
//! signature or authentication tag checks out.

use std::sync::Arc;

use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::algorithms::AlgorithmCollection;
use crate::base64data;
use crate::credentials::{JoseEncryptingCredentials, JoseSigningCredentials};
use crate::error::{CryptoError, TokenError};
use crate::jose::JoseHeader;
use crate::key::{KeyUse, SecretKey};

/// The undecoded segments of a three-part signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParts {
    /// The base64url protected header.
    pub header: String,
    /// The payload segment, base64url unless `b64` is false.
    pub payload: String,
    /// The base64url signature.
    pub signature: String,
}

/// The undecoded segments of a five-part encrypted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedParts {
    /// The base64url protected header.
    pub header: String,
    /// The base64url wrapped content-encryption key.
    pub encrypted_key: String,
    /// The base64url nonce (initialization vector).
    pub nonce: String,
    /// The base64url ciphertext.
    pub ciphertext: String,
    /// The base64url authentication tag.
    pub tag: String,
}

/// A compact token, classified by segment count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactToken {
    /// A JWS: `header.payload.signature`.
    Signed(SignedParts),
    /// A JWE: `header.encrypted_key.nonce.ciphertext.tag`.
    Encrypted(EncryptedParts),
}

impl CompactToken {
    /// Split a compact serialization into its segments.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        match segments.as_slice() {
            [header, payload, signature] => Ok(CompactToken::Signed(SignedParts {
                header: (*header).to_owned(),
                payload: (*payload).to_owned(),
                signature: (*signature).to_owned(),
            })),
            [header, encrypted_key, nonce, ciphertext, tag] => {
                Ok(CompactToken::Encrypted(EncryptedParts {
                    header: (*header).to_owned(),
                    encrypted_key: (*encrypted_key).to_owned(),
                    nonce: (*nonce).to_owned(),
                    ciphertext: (*ciphertext).to_owned(),
                    tag: (*tag).to_owned(),
                }))
            }
            _ => Err(TokenError::Malformed(format!(
                "expected 3 or 5 segments, found {}",
                segments.len()
            ))),
        }
    }
}

/// Sign a payload into a compact JWS.
///
/// The header's `alg` and `kid` are filled from the credentials before
/// the header is serialized, so the signed bytes always reflect the key
/// that produced them.
pub fn sign_compact(
    credentials: &JoseSigningCredentials,
    mut header: JoseHeader,
    payload: &[u8],
) -> Result<String, TokenError> {
    header.set_algorithm(credentials.algorithm().code());
    if let Some(key_id) = credentials.key().key_id() {
        header.set_key_id(key_id);
    }

    let header_segment = base64data::encode(&header.to_json()?);
    let payload_segment = if header.base64_payload() {
        base64data::encode(payload)
    } else {
        // RFC 7797: an unencoded payload travels verbatim, so it must
        // not contain the segment separator.
        let raw = std::str::from_utf8(payload)
            .map_err(|_| TokenError::Malformed("unencoded payload is not UTF-8".into()))?;
        if raw.contains('.') {
            return Err(TokenError::Malformed(
                "unencoded payload may not contain '.'".into(),
            ));
        }
        raw.to_owned()
    };

    let message = format!("{header_segment}.{payload_segment}");
    let signature = credentials
        .algorithm()
        .sign(credentials.key(), message.as_bytes())?;
    Ok(format!("{message}.{}", base64data::encode(&signature)))
}

/// A verified JWS: header plus the payload it authenticated.
#[derive(Debug, Clone)]
pub struct VerifiedJws {
    header: JoseHeader,
    payload: Vec<u8>,
    key: Option<Arc<SecretKey>>,
}

impl VerifiedJws {
    /// The protected header.
    pub fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// The authenticated payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The key that verified the signature; `None` for `alg: none`.
    pub fn key(&self) -> Option<&Arc<SecretKey>> {
        self.key.as_ref()
    }
}

/// Verifies compact JWS tokens against a key set.
#[derive(Debug, Clone)]
pub struct JwsDecoder {
    algorithms: Arc<AlgorithmCollection>,
    keys: Arc<Vec<Arc<SecretKey>>>,
}

impl JwsDecoder {
    /// Create a decoder over an algorithm collection and a key snapshot.
    pub fn new(algorithms: Arc<AlgorithmCollection>, keys: Arc<Vec<Arc<SecretKey>>>) -> Self {
        JwsDecoder { algorithms, keys }
    }

    /// Verify a compact JWS and return its payload.
    pub fn decode(&self, token: &str) -> Result<VerifiedJws, TokenError> {
        let CompactToken::Signed(parts) = CompactToken::parse(token)? else {
            return Err(TokenError::Malformed(
                "expected a signed token, found an encrypted one".into(),
            ));
        };

        let header = JoseHeader::from_json(&base64data::decode(&parts.header)?)?;
        let algorithm_code = header
            .algorithm()
            .ok_or_else(|| TokenError::Malformed("header is missing 'alg'".into()))?;
        let signature = base64data::decode(&parts.signature)?;

        // "none" carries no signature and needs no key.
        if algorithm_code == "none" {
            if !signature.is_empty() {
                return Err(TokenError::Crypto(CryptoError::Integrity(
                    "unexpected signature on an unsecured token",
                )));
            }
            let payload = decode_payload(&header, &parts.payload)?;
            return Ok(VerifiedJws {
                header,
                payload,
                key: None,
            });
        }

        let algorithm = self
            .algorithms
            .signature(algorithm_code)
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(algorithm_code.to_owned()))?;

        let message = format!("{}.{}", parts.header, parts.payload);
        let candidates = candidate_keys(&self.keys, KeyUse::Signature);

        let verified = match pinned_key(&candidates, header.key_id()) {
            Some(key) => {
                algorithm.verify(key, message.as_bytes(), &signature)?;
                Arc::clone(key)
            }
            None => candidates
                .iter()
                .find(|key| algorithm.verify(key, message.as_bytes(), &signature).is_ok())
                .map(Arc::clone)
                .ok_or(TokenError::NoMatchingKey)?,
        };

        let payload = decode_payload(&header, &parts.payload)?;
        Ok(VerifiedJws {
            header,
            payload,
            key: Some(verified),
        })
    }
}

fn decode_payload(header: &JoseHeader, segment: &str) -> Result<Vec<u8>, TokenError> {
    if header.base64_payload() {
        Ok(base64data::decode(segment)?)
    } else {
        Ok(segment.as_bytes().to_vec())
    }
}

fn candidate_keys(keys: &[Arc<SecretKey>], key_use: KeyUse) -> Vec<Arc<SecretKey>> {
    keys.iter()
        .filter(|key| key.metadata().key_use.map_or(true, |u| u == key_use))
        .map(Arc::clone)
        .collect()
}

/// The key pinned by the header `kid`, when it resolves.
fn pinned_key<'k>(keys: &'k [Arc<SecretKey>], key_id: Option<&str>) -> Option<&'k Arc<SecretKey>> {
    let key_id = key_id?;
    keys.iter().find(|key| key.key_id() == Some(key_id))
}

/// Encrypt a payload into a compact JWE.
///
/// A fresh content-encryption key and nonce are drawn from the system
/// RNG for every call. The protected header doubles as the AAD, so any
/// tampering with it fails the tag check on decrypt.
pub fn encrypt_compact(
    credentials: &JoseEncryptingCredentials,
    mut header: JoseHeader,
    plaintext: &[u8],
) -> Result<String, TokenError> {
    header.set_algorithm(credentials.key_management().code());
    header.set_encryption(credentials.encryption().code());
    if let Some(key_id) = credentials.key().key_id() {
        header.set_key_id(key_id);
    }

    let compressed;
    let mut content = plaintext;
    if let Some(compression) = credentials.compression() {
        header.set_compression(compression.code());
        compressed = compression.compress(plaintext)?;
        content = &compressed;
    }

    let encryption = credentials.encryption();
    let mut cek = Zeroizing::new(vec![0u8; encryption.key_size_bytes()]);
    OsRng.fill_bytes(cek.as_mut_slice());
    let mut nonce = vec![0u8; encryption.nonce_size_bytes()];
    OsRng.fill_bytes(&mut nonce);

    let encrypted_key = credentials
        .key_management()
        .wrap_key(credentials.key(), &cek)?;

    let header_segment = base64data::encode(&header.to_json()?);
    let output = encryption.encrypt(&cek, &nonce, content, header_segment.as_bytes())?;

    Ok(format!(
        "{header_segment}.{}.{}.{}.{}",
        base64data::encode(&encrypted_key),
        base64data::encode(&nonce),
        base64data::encode(&output.ciphertext),
        base64data::encode(&output.tag),
    ))
}

/// A decrypted JWE: header plus the plaintext it protected.
#[derive(Debug)]
pub struct DecryptedJwe {
    header: JoseHeader,
    plaintext: Zeroizing<Vec<u8>>,
    key: Arc<SecretKey>,
}

impl DecryptedJwe {
    /// The protected header.
    pub fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// The decrypted payload bytes.
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    /// The key-encryption key that unwrapped the content key.
    pub fn key(&self) -> &Arc<SecretKey> {
        &self.key
    }
}

/// Decrypts compact JWE tokens against a key set.
#[derive(Debug, Clone)]
pub struct JweDecoder {
    algorithms: Arc<AlgorithmCollection>,
    keys: Arc<Vec<Arc<SecretKey>>>,
}

impl JweDecoder {
    /// Create a decoder over an algorithm collection and a key snapshot.
    pub fn new(algorithms: Arc<AlgorithmCollection>, keys: Arc<Vec<Arc<SecretKey>>>) -> Self {
        JweDecoder { algorithms, keys }
    }

    /// Decrypt a compact JWE and return its plaintext.
    pub fn decode(&self, token: &str) -> Result<DecryptedJwe, TokenError> {
        let CompactToken::Encrypted(parts) = CompactToken::parse(token)? else {
            return Err(TokenError::Malformed(
                "expected an encrypted token, found a signed one".into(),
            ));
        };

        let header = JoseHeader::from_json(&base64data::decode(&parts.header)?)?;
        let wrap_code = header
            .algorithm()
            .ok_or_else(|| TokenError::Malformed("header is missing 'alg'".into()))?;
        let enc_code = header
            .encryption()
            .ok_or_else(|| TokenError::Malformed("header is missing 'enc'".into()))?;

        let key_management = self
            .algorithms
            .key_management(wrap_code)
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(wrap_code.to_owned()))?;
        let encryption = self
            .algorithms
            .encryption(enc_code)
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(enc_code.to_owned()))?;

        let encrypted_key = base64data::decode(&parts.encrypted_key)?;
        let nonce = base64data::decode(&parts.nonce)?;
        let ciphertext = base64data::decode(&parts.ciphertext)?;
        let tag = base64data::decode(&parts.tag)?;
        let aad = parts.header.as_bytes();

        let candidates = candidate_keys(&self.keys, KeyUse::Encryption);
        let decrypt_with = |key: &Arc<SecretKey>| -> Result<Zeroizing<Vec<u8>>, CryptoError> {
            let cek = key_management.unwrap_key(key, &encrypted_key)?;
            encryption.decrypt(&cek, &nonce, &ciphertext, aad, &tag)
        };

        let (plaintext, key) = match pinned_key(&candidates, header.key_id()) {
            Some(key) => (decrypt_with(key)?, Arc::clone(key)),
            None => candidates
                .iter()
                .find_map(|key| decrypt_with(key).ok().map(|pt| (pt, Arc::clone(key))))
                .ok_or(TokenError::NoMatchingKey)?,
        };

        let plaintext = match header.compression() {
            Some(zip_code) => {
                let compression = self
                    .algorithms
                    .compression(zip_code)
                    .ok_or_else(|| TokenError::UnsupportedAlgorithm(zip_code.to_owned()))?;
                Zeroizing::new(compression.decompress(&plaintext)?)
            }
            None => plaintext,
        };

        Ok(DecryptedJwe {
            header,
            plaintext,
            key,
        })
    }
}
