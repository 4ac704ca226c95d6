//! Proof Key for Code Exchange challenges, RFC 7636.
//!
//! The `S256` method hashes the verifier with SHA-256 and base64url
//! encodes the digest; `plain` uses the verifier as the challenge
//! directly. Verification compares in constant time so a timing oracle
//! cannot narrow down a challenge byte by byte.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::base64data;

/// The challenge transformation method, RFC 7636 §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeChallengeMethod {
    /// `S256`: challenge = base64url(SHA-256(verifier)).
    #[default]
    S256,
    /// `plain`: challenge = verifier.
    Plain,
}

/// Compute the `S256` challenge for a verifier.
pub fn code_challenge_s256(verifier: &str) -> String {
    base64data::encode(&Sha256::digest(verifier.as_bytes()))
}

/// Check a verifier against a previously issued challenge.
pub fn verify(verifier: &str, method: CodeChallengeMethod, challenge: &str) -> bool {
    let expected = match method {
        CodeChallengeMethod::S256 => code_challenge_s256(verifier),
        CodeChallengeMethod::Plain => verifier.to_owned(),
    };
    expected.as_bytes().ct_eq(challenge.as_bytes()).into()
}
