//! Compression for serialized slice payloads
//!
//! Payload bytes inside a stored blob may be compressed before they hit the
//! key-value engine. The method used is recorded in the blob envelope, so a
//! reader never depends on store configuration to decode what it finds.
//! Segmentation masks are mostly long runs of a single label and compress
//! extremely well with RLE; image slices do better with Deflate or Zstd.

use crate::error::{Result, SliceDbError};
use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression as FlateCompression;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Compression methods recorded in the blob envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionMethod {
    /// No compression
    None = 0,
    /// Deflate/ZIP compression
    Deflate = 1,
    /// Run-length encoding
    RLE = 2,
    /// Zstandard compression
    Zstd = 3,
}

impl CompressionMethod {
    /// Get the method from its envelope tag byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionMethod::None),
            1 => Some(CompressionMethod::Deflate),
            2 => Some(CompressionMethod::RLE),
            3 => Some(CompressionMethod::Zstd),
            _ => None,
        }
    }
}

/// Compression level (0-9, where 0 is no compression and 9 is maximum)
#[derive(Debug, Clone, Copy)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    pub fn none() -> Self {
        Self(0)
    }

    pub fn fast() -> Self {
        Self(1)
    }

    pub fn best() -> Self {
        Self(9)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(6)
    }
}

/// Trait for compression/decompression operations
pub trait Compressor: Send + Sync {
    /// Compress data
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>>;

    /// Decompress data
    fn decompress(&self, data: &[u8], expected_size: Option<usize>) -> Result<Vec<u8>>;

    /// Get the compression method
    fn method(&self) -> CompressionMethod;
}

/// No compression
#[derive(Debug, Default)]
pub struct NoneCompressor;

impl Compressor for NoneCompressor {
    fn compress(&self, data: &[u8], _level: CompressionLevel) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], _expected_size: Option<usize>) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::None
    }
}

/// Deflate compression
#[derive(Debug, Default)]
pub struct DeflateCompressor;

impl Compressor for DeflateCompressor {
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(data, FlateCompression::new(level.value() as u32));
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| SliceDbError::Compression(e.to_string()))?;
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8], expected_size: Option<usize>) -> Result<Vec<u8>> {
        let mut decoder = DeflateDecoder::new(data);
        let mut decompressed = if let Some(size) = expected_size {
            Vec::with_capacity(size)
        } else {
            Vec::new()
        };
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| SliceDbError::Decompression(e.to_string()))?;
        Ok(decompressed)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }
}

/// Zstandard compression
#[derive(Debug, Default)]
pub struct ZstdCompressor;

impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
        zstd::encode_all(data, level.value() as i32)
            .map_err(|e| SliceDbError::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], _expected_size: Option<usize>) -> Result<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| SliceDbError::Decompression(e.to_string()))
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Zstd
    }
}

/// Run-length encoding compressor.
///
/// The encoded stream is a flat sequence of `(count, value)` byte pairs,
/// with runs capped at 255 so the count always fits one byte.
#[derive(Debug, Default)]
pub struct RLECompressor;

impl RLECompressor {
    fn encode_runs(data: &[u8]) -> Vec<u8> {
        let mut encoded = Vec::new();
        let mut rest = data;
        while let Some(&value) = rest.first() {
            let run = rest.iter().take(255).take_while(|&&b| b == value).count();
            encoded.push(run as u8);
            encoded.push(value);
            rest = &rest[run..];
        }
        encoded
    }

    fn decode_runs(data: &[u8]) -> Result<Vec<u8>> {
        if data.len() % 2 != 0 {
            return Err(SliceDbError::Decompression(
                "RLE stream must be a sequence of (count, value) pairs".to_string(),
            ));
        }

        let mut decoded = Vec::with_capacity(data.len());
        for pair in data.chunks_exact(2) {
            let (count, value) = (pair[0] as usize, pair[1]);
            decoded.resize(decoded.len() + count, value);
        }
        Ok(decoded)
    }
}

impl Compressor for RLECompressor {
    fn compress(&self, data: &[u8], _level: CompressionLevel) -> Result<Vec<u8>> {
        Ok(Self::encode_runs(data))
    }

    fn decompress(&self, data: &[u8], _expected_size: Option<usize>) -> Result<Vec<u8>> {
        Self::decode_runs(data)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::RLE
    }
}

/// Get a compressor for a given method
pub fn get_compressor(method: CompressionMethod) -> Box<dyn Compressor> {
    match method {
        CompressionMethod::None => Box::new(NoneCompressor),
        CompressionMethod::Deflate => Box::new(DeflateCompressor),
        CompressionMethod::RLE => Box::new(RLECompressor),
        CompressionMethod::Zstd => Box::new(ZstdCompressor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mask-like payload: background zeros with a solid block of one label
    fn mask_payload() -> Vec<u8> {
        let mut mask = vec![0u8; 400];
        mask[120..180].fill(3);
        mask
    }

    #[test]
    fn test_no_compression() {
        let compressor = NoneCompressor;
        let data = b"raw slice bytes";
        let compressed = compressor
            .compress(data, CompressionLevel::default())
            .unwrap();
        assert_eq!(compressed, data);
        let decompressed = compressor.decompress(&compressed, None).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_deflate() {
        let compressor = DeflateCompressor;
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let compressed = compressor
            .compress(&data, CompressionLevel::default())
            .unwrap();
        assert!(compressed.len() < data.len());
        let decompressed = compressor
            .decompress(&compressed, Some(data.len()))
            .unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_zstd() {
        let compressor = ZstdCompressor;
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let compressed = compressor
            .compress(&data, CompressionLevel::default())
            .unwrap();
        assert!(compressed.len() < data.len());
        let decompressed = compressor.decompress(&compressed, None).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_rle_mask() {
        let compressor = RLECompressor;
        let mask = mask_payload();
        let compressed = compressor
            .compress(&mask, CompressionLevel::default())
            .unwrap();
        assert!(compressed.len() < mask.len());
        let decompressed = compressor.decompress(&compressed, None).unwrap();
        assert_eq!(decompressed, mask);
    }

    #[test]
    fn test_rle_splits_long_runs() {
        let compressor = RLECompressor;
        let data = vec![7u8; 300];
        let compressed = compressor
            .compress(&data, CompressionLevel::default())
            .unwrap();
        assert_eq!(compressed, vec![255, 7, 45, 7]);
        let decompressed = compressor.decompress(&compressed, None).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_rle_rejects_odd_length_stream() {
        let compressor = RLECompressor;
        let err = compressor.decompress(&[4, 1, 9], None).unwrap_err();
        assert!(matches!(err, SliceDbError::Decompression(_)));
    }

    #[test]
    fn test_method_tags_round_trip() {
        for method in [
            CompressionMethod::None,
            CompressionMethod::Deflate,
            CompressionMethod::RLE,
            CompressionMethod::Zstd,
        ] {
            assert_eq!(CompressionMethod::from_u8(method as u8), Some(method));
        }
        assert_eq!(CompressionMethod::from_u8(4), None);
        assert_eq!(CompressionMethod::from_u8(0xFF), None);
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(CompressionLevel::new(12).value(), 9);
        assert_eq!(CompressionLevel::none().value(), 0);
        assert_eq!(CompressionLevel::fast().value(), 1);
        assert_eq!(CompressionLevel::best().value(), 9);
        assert_eq!(CompressionLevel::default().value(), 6);
    }
}
