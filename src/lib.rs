//! # JOSE engine
//!
//! Signing, verification, encryption and decryption of compact JOSE
//! tokens (JWS and JWE), built on top of the [RustCrypto][] ecosystem.
//!
//! The pieces compose bottom-up:
//!
//! - [`key`] models secret keys: typed material (symmetric, RSA or
//!   NIST-curve) plus JOSE metadata, with providers that snapshot and
//!   hot-reload key sets.
//! - [`algorithms`] is the registry: every algorithm is a
//!   [`JoseAlgorithm`](algorithms::JoseAlgorithm) with exactly one
//!   capability (signature, key management, content encryption or
//!   compression), looked up by its JWA code.
//! - [`credentials`] pairs algorithms with compatible keys, honoring
//!   the caller's preference order and key metadata.
//! - [`token`] is the compact codec: three-segment JWS and
//!   five-segment JWE serialization with fail-closed `kid` handling.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use jose_engine::algorithms::AlgorithmCollection;
//! use jose_engine::credentials::CredentialSelector;
//! use jose_engine::jose::JoseHeader;
//! use jose_engine::key::{KeyMetadata, SecretKey};
//! use jose_engine::token::{sign_compact, JwsDecoder};
//!
//! # fn main() -> Result<(), jose_engine::TokenError> {
//! let algorithms = Arc::new(AlgorithmCollection::standard());
//! let keys: Arc<Vec<_>> = Arc::new(vec![Arc::new(SecretKey::symmetric(
//!     vec![0x5a; 32],
//!     KeyMetadata::with_key_id("demo"),
//! ))]);
//!
//! let selector = CredentialSelector::new(Arc::clone(&algorithms), Arc::clone(&keys));
//! let credentials = selector.signing_credentials(&["HS256"])?.unwrap();
//!
//! let token = sign_compact(&credentials, JoseHeader::new(), b"{\"sub\":\"demo\"}")?;
//! let verified = JwsDecoder::new(algorithms, keys).decode(&token)?;
//! assert_eq!(verified.payload(), b"{\"sub\":\"demo\"}");
//! # Ok(())
//! # }
//! ```
//!
//! [RustCrypto]: https://github.com/RustCrypto

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithms;
pub mod base64data;
pub mod change;
pub mod claims;
pub mod credentials;
pub mod error;
pub mod jose;
pub mod key;
pub mod pkce;
pub mod sizes;
pub mod token;

pub use claims::{Claims, RegisteredClaims};
pub use credentials::{CredentialSelector, JoseEncryptingCredentials, JoseSigningCredentials};
pub use error::{CryptoError, TokenError};
pub use jose::JoseHeader;
pub use key::{KeyMetadata, SecretKey, SecretKeyProvider};
pub use sizes::KeySizes;
pub use token::{CompactToken, JweDecoder, JwsDecoder};
