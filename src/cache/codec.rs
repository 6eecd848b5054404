//! Compression Codec
//!
//! Reversible encoding applied to oversized payloads before storage.

use std::fmt::Debug;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{CacheError, Result};

// == Codec Trait ==
/// A reversible byte transform. `decode(encode(x)) == x` must hold.
///
/// Output is not required to be smaller than the input; the store counts
/// every applied encoding, not the bytes saved.
pub trait Codec: Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;
}

// == Gzip Codec ==
/// DEFLATE compression in a gzip container.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: Compression::fast(),
        }
    }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(input.len() / 2), self.level);
        encoder.write_all(input).map_err(codec_error)?;
        encoder.finish().map_err(codec_error)
    }

    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(input);
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).map_err(codec_error)?;
        Ok(output)
    }
}

fn codec_error(e: std::io::Error) -> CacheError {
    CacheError::Codec(e.to_string())
}
