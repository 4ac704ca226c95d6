//! Credential selection.
//!
//! A credential pairs an algorithm with a compatible key. Selection
//! walks the caller's preferred algorithm codes in order and, for each,
//! scans keys by descending expiry so the freshest key wins; a key with
//! no expiry sorts first. A code that resolves to nothing is skipped
//! silently, so callers can list a broad preference order and let the
//! available keys decide.
//!
//! Selection never fails with an error when nothing matches; it returns
//! `Ok(None)`. Errors are reserved for broken inputs such as a disposed
//! key provider.

use std::sync::Arc;

use crate::algorithms::{
    AeadAlgorithm, AlgorithmCollection, CompressionAlgorithm, KeyManagementAlgorithm,
    SignatureAlgorithm,
};
use crate::error::CryptoError;
use crate::key::{KeyUse, SecretKey};
use crate::sizes::KeySizes;

/// A signing key paired with the algorithm that will use it.
#[derive(Clone)]
pub struct JoseSigningCredentials {
    key: Arc<SecretKey>,
    algorithm: Arc<dyn SignatureAlgorithm>,
}

impl JoseSigningCredentials {
    /// The selected signing key.
    pub fn key(&self) -> &Arc<SecretKey> {
        &self.key
    }

    /// The selected signature algorithm.
    pub fn algorithm(&self) -> &Arc<dyn SignatureAlgorithm> {
        &self.algorithm
    }
}

impl std::fmt::Debug for JoseSigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoseSigningCredentials")
            .field("algorithm", &self.algorithm.code())
            .field("key_id", &self.key.key_id())
            .finish()
    }
}

/// A key-encryption key with the algorithms for one JWE operation.
#[derive(Clone)]
pub struct JoseEncryptingCredentials {
    key: Arc<SecretKey>,
    key_management: Arc<dyn KeyManagementAlgorithm>,
    encryption: Arc<dyn AeadAlgorithm>,
    compression: Option<Arc<dyn CompressionAlgorithm>>,
}

impl JoseEncryptingCredentials {
    /// The selected key-encryption key.
    pub fn key(&self) -> &Arc<SecretKey> {
        &self.key
    }

    /// The selected key-management algorithm.
    pub fn key_management(&self) -> &Arc<dyn KeyManagementAlgorithm> {
        &self.key_management
    }

    /// The selected content-encryption algorithm.
    pub fn encryption(&self) -> &Arc<dyn AeadAlgorithm> {
        &self.encryption
    }

    /// The selected compression algorithm, when one resolved.
    pub fn compression(&self) -> Option<&Arc<dyn CompressionAlgorithm>> {
        self.compression.as_ref()
    }
}

impl std::fmt::Debug for JoseEncryptingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoseEncryptingCredentials")
            .field("key_management", &self.key_management.code())
            .field("encryption", &self.encryption.code())
            .field(
                "compression",
                &self.compression.as_ref().map(|alg| alg.code().to_owned()),
            )
            .field("key_id", &self.key.key_id())
            .finish()
    }
}

/// Resolves credentials from an algorithm collection and a key snapshot.
#[derive(Debug, Clone)]
pub struct CredentialSelector {
    algorithms: Arc<AlgorithmCollection>,
    keys: Arc<Vec<Arc<SecretKey>>>,
}

impl CredentialSelector {
    /// Create a selector over an algorithm collection and a key snapshot.
    pub fn new(algorithms: Arc<AlgorithmCollection>, keys: Arc<Vec<Arc<SecretKey>>>) -> Self {
        CredentialSelector { algorithms, keys }
    }

    /// Select a signing credential, honoring the caller's preference order.
    ///
    /// Returns `Ok(None)` when no preferred code resolves to an
    /// algorithm with a compatible key.
    pub fn signing_credentials(
        &self,
        preferred: &[&str],
    ) -> Result<Option<JoseSigningCredentials>, CryptoError> {
        for code in preferred {
            let Some(algorithm) = self.algorithms.signature(code) else {
                continue;
            };
            if let Some(key) = self.best_key(code, KeyUse::Signature, algorithm.key_sizes(), |key| {
                key.key_type() == algorithm.key_type()
            }) {
                return Ok(Some(JoseSigningCredentials { key, algorithm }));
            }
        }
        Ok(None)
    }

    /// Select an encrypting credential.
    ///
    /// The key-management and content-encryption codes resolve
    /// independently; both must succeed. Compression is best-effort and
    /// an unresolvable `zip_codes` list simply yields no compression.
    pub fn encrypting_credentials(
        &self,
        key_management_codes: &[&str],
        encryption_codes: &[&str],
        zip_codes: &[&str],
    ) -> Result<Option<JoseEncryptingCredentials>, CryptoError> {
        let mut wrapping = None;
        for code in key_management_codes {
            let Some(algorithm) = self.algorithms.key_management(code) else {
                continue;
            };
            if let Some(key) = self.best_key(code, KeyUse::Encryption, algorithm.key_sizes(), |key| {
                key.key_type() == algorithm.key_type()
            }) {
                wrapping = Some((key, algorithm));
                break;
            }
        }
        let Some((key, key_management)) = wrapping else {
            return Ok(None);
        };

        // Content encryption uses a fresh random CEK, so any registered
        // algorithm works; the first resolving code wins.
        let Some(encryption) = encryption_codes
            .iter()
            .find_map(|code| self.algorithms.encryption(code))
        else {
            return Ok(None);
        };

        let compression = zip_codes
            .iter()
            .find_map(|code| self.algorithms.compression(code));

        Ok(Some(JoseEncryptingCredentials {
            key,
            key_management,
            encryption,
            compression,
        }))
    }

    /// The most recently expiring compatible key for one algorithm code.
    fn best_key(
        &self,
        code: &str,
        key_use: KeyUse,
        sizes: &[KeySizes],
        type_matches: impl Fn(&SecretKey) -> bool,
    ) -> Option<Arc<SecretKey>> {
        let mut candidates: Vec<&Arc<SecretKey>> = self
            .keys
            .iter()
            .filter(|key| {
                let metadata = key.metadata();
                metadata.key_use.map_or(true, |u| u == key_use)
                    && metadata.algorithm.as_deref().map_or(true, |a| a == code)
                    && type_matches(key)
                    && KeySizes::is_legal_size(sizes, key.key_size_bits())
            })
            .collect();
        // No expiry means the key never rotates out; it sorts first.
        candidates.sort_by(|a, b| match (a.metadata().expires, b.metadata().expires) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(&a),
        });
        candidates.first().map(|key| Arc::clone(key))
    }
}
