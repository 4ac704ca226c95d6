//! Error taxonomy for the engine.
//!
//! Failures split into four kinds: size/shape validation, integrity,
//! lifecycle misuse, and malformed tokens. Resolution misses ("no
//! algorithm registered for this code") are not errors at all; lookups
//! return [`Option`] so that probing a preference list stays cheap.

use crate::key::KeyType;

/// Failure of a cryptographic operation or key validation.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A parameter had an illegal length. Checked before any
    /// cryptographic work; the parameter name identifies the offender.
    #[error("parameter '{parameter}' has an illegal size")]
    InvalidSize {
        /// Name of the offending parameter.
        parameter: &'static str,
    },

    /// The key's bit size is not legal for the algorithm.
    #[error("key size of {bits} bits is not legal for this algorithm")]
    InvalidKeySize {
        /// The key size that was rejected.
        bits: u32,
    },

    /// The key is not of the type the algorithm expects.
    #[error("key type mismatch: expected a {expected:?} key, found {actual:?}")]
    KeyTypeMismatch {
        /// Key type the algorithm requires.
        expected: KeyType,
        /// Key type actually supplied.
        actual: KeyType,
    },

    /// An authentication tag, key-wrap IV, or signature did not match.
    ///
    /// Deliberately distinct from [`CryptoError::InvalidSize`] and from
    /// malformed-input errors so callers can tell tampering from
    /// corruption. The platform error, if any, is wrapped and never
    /// surfaced raw.
    #[error("integrity check failed: {0}")]
    Integrity(&'static str),

    /// A disposed provider or algorithm source was accessed.
    #[error("{0} has been disposed")]
    Disposed(&'static str),

    /// Two algorithms with the same code were registered.
    #[error("duplicate algorithm code {0:?}")]
    DuplicateAlgorithmCode(String),

    /// Key material could not be interpreted.
    #[error("unsupported key material: {0}")]
    UnsupportedKey(&'static str),

    /// The underlying signing implementation failed.
    #[error("signing operation failed")]
    Signature(#[source] signature::Error),
}

/// Failure while encoding or decoding a compact JOSE token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token does not have a valid compact shape.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token names an algorithm the collection does not carry with
    /// the required capability.
    #[error("no algorithm registered for code {0:?}")]
    UnsupportedAlgorithm(String),

    /// No supplied key verified or decrypted the token.
    #[error("no key in the collection matched the token")]
    NoMatchingKey,

    /// A segment was not valid base64url.
    #[error("invalid base64url segment: {0}")]
    Base64(#[from] base64ct::Error),

    /// A JSON header or payload failed to parse or serialize.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A cryptographic step failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
