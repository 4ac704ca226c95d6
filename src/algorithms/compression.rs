//! Payload compression (`DEF`), RFC 7516 §4.1.3.
//!
//! JWE `zip: "DEF"` is raw DEFLATE (RFC 1951) with no zlib or gzip
//! framing. Compression is advisory; decompression of a tampered or
//! truncated stream surfaces as an integrity error.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::CryptoError;
use crate::key::KeyType;
use crate::sizes::KeySizes;

use super::{Algorithm, AlgorithmKind, CompressionAlgorithm, JoseAlgorithm};

/// The DEFLATE compression algorithm (`DEF`).
#[derive(Debug, Clone, Default)]
pub struct Deflate {
    _private: (),
}

impl Deflate {
    /// The `DEF` algorithm.
    pub fn new() -> Self {
        Deflate::default()
    }
}

impl Algorithm for Deflate {
    fn code(&self) -> &str {
        "DEF"
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Compression
    }

    fn key_sizes(&self) -> &[KeySizes] {
        &[]
    }

    fn key_type(&self) -> KeyType {
        KeyType::Symmetric
    }
}

impl CompressionAlgorithm for Deflate {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|_| CryptoError::Integrity("DEFLATE compression failed"))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut output = Vec::new();
        DeflateDecoder::new(data)
            .read_to_end(&mut output)
            .map_err(|_| CryptoError::Integrity("DEFLATE stream is corrupt"))?;
        Ok(output)
    }
}

pub(crate) fn algorithms() -> impl Iterator<Item = JoseAlgorithm> {
    std::iter::once(JoseAlgorithm::Compression(std::sync::Arc::new(
        Deflate::new(),
    )))
}
