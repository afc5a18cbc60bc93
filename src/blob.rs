//! Binary blob codec for 2-D slice payloads
//!
//! A stored value is a small envelope followed by the serialized slice
//! record:
//!
//! ```text
//! [format_version: u8][compression_tag: u8][compressed bincode body]
//! ```
//!
//! The body is the bincode serialization of [`SliceBlob`]; the tag names the
//! [`CompressionMethod`] applied to it. Values are self-describing — a reader
//! decodes whatever it finds without consulting store configuration, and
//! rejects unknown versions or tags instead of guessing.

use crate::compression::{get_compressor, CompressionLevel, CompressionMethod};
use crate::error::{Result, SliceDbError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Current blob envelope format version
pub const BLOB_FORMAT_VERSION: u8 = 1;

/// Envelope header length in bytes (version + compression tag)
const ENVELOPE_LEN: usize = 2;

/// Pixel payload of one slice, tagged by sample type.
///
/// The two shapes are mutually exclusive per record; a record never mixes
/// byte and float samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PixelData {
    /// Unsigned 8-bit samples
    U8(Vec<u8>),
    /// Floating-point samples
    F32(Vec<f32>),
}

impl PixelData {
    /// Number of samples in the payload
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(samples) => samples.len(),
            PixelData::F32(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stored 2-D slice: dimensions plus the flat row-major payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceBlob {
    /// Number of rows
    pub height: u32,
    /// Number of columns
    pub width: u32,
    /// Channels per sample; always 1 for grayscale slices
    pub channels: u32,
    /// Flat payload, row-major, `height * width` samples
    pub data: PixelData,
}

impl SliceBlob {
    /// Build a single-channel byte-sample blob
    pub fn from_bytes(height: u32, width: u32, pixels: Vec<u8>) -> Self {
        SliceBlob {
            height,
            width,
            channels: 1,
            data: PixelData::U8(pixels),
        }
    }

    /// Build a single-channel float-sample blob
    pub fn from_floats(height: u32, width: u32, values: Vec<f32>) -> Self {
        SliceBlob {
            height,
            width,
            channels: 1,
            data: PixelData::F32(values),
        }
    }

    /// Serialize this record into its enveloped wire form.
    pub fn encode(&self, method: CompressionMethod) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let compressed = get_compressor(method).compress(&body, CompressionLevel::default())?;
        let mut raw = Vec::with_capacity(ENVELOPE_LEN + compressed.len());
        raw.push(BLOB_FORMAT_VERSION);
        raw.push(method as u8);
        raw.extend_from_slice(&compressed);
        Ok(raw)
    }

    /// Decode an enveloped wire value back into a record.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < ENVELOPE_LEN {
            return Err(SliceDbError::Deserialization(format!(
                "blob of {} bytes is shorter than the envelope header",
                raw.len()
            )));
        }
        if raw[0] != BLOB_FORMAT_VERSION {
            return Err(SliceDbError::Deserialization(format!(
                "unsupported blob format version {}",
                raw[0]
            )));
        }
        let method = CompressionMethod::from_u8(raw[1]).ok_or_else(|| {
            SliceDbError::Deserialization(format!("unknown compression tag {}", raw[1]))
        })?;
        let body = get_compressor(method).decompress(&raw[ENVELOPE_LEN..], None)?;
        bincode::deserialize(&body).map_err(|e| SliceDbError::Deserialization(e.to_string()))
    }

    /// Reshape the flat payload into a 2-D array of `(height, width)`.
    ///
    /// Fails when the record cannot describe a grayscale slice: more than
    /// one channel, or a payload whose sample count disagrees with the
    /// declared dimensions.
    pub fn into_array(self) -> Result<SliceArray> {
        if self.channels != 1 {
            return Err(SliceDbError::Deserialization(format!(
                "expected a single-channel slice, record declares {} channels",
                self.channels
            )));
        }
        let rows = self.height as usize;
        let cols = self.width as usize;
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            SliceDbError::Deserialization(format!(
                "slice dimensions {}x{} overflow",
                self.height, self.width
            ))
        })?;
        if self.data.len() != expected {
            return Err(SliceDbError::Deserialization(format!(
                "payload holds {} samples but dimensions are {}x{}",
                self.data.len(),
                self.height,
                self.width
            )));
        }
        match self.data {
            PixelData::U8(samples) => Array2::from_shape_vec((rows, cols), samples)
                .map(SliceArray::U8)
                .map_err(|e| SliceDbError::Deserialization(e.to_string())),
            PixelData::F32(samples) => Array2::from_shape_vec((rows, cols), samples)
                .map(SliceArray::F32)
                .map_err(|e| SliceDbError::Deserialization(e.to_string())),
        }
    }
}

/// A decoded 2-D slice, tagged by sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceArray {
    U8(Array2<u8>),
    F32(Array2<f32>),
}

impl SliceArray {
    /// Slice shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let dim = match self {
            SliceArray::U8(arr) => arr.dim(),
            SliceArray::F32(arr) => arr.dim(),
        };
        (dim.0, dim.1)
    }

    pub fn as_u8(&self) -> Option<&Array2<u8>> {
        match self {
            SliceArray::U8(arr) => Some(arr),
            SliceArray::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Array2<f32>> {
        match self {
            SliceArray::U8(_) => None,
            SliceArray::F32(arr) => Some(arr),
        }
    }

    pub fn into_u8(self) -> Option<Array2<u8>> {
        match self {
            SliceArray::U8(arr) => Some(arr),
            SliceArray::F32(_) => None,
        }
    }

    pub fn into_f32(self) -> Option<Array2<f32>> {
        match self {
            SliceArray::U8(_) => None,
            SliceArray::F32(arr) => Some(arr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_blob_round_trip() {
        let blob = SliceBlob::from_bytes(2, 3, vec![0, 1, 2, 3, 4, 5]);
        let raw = blob.encode(CompressionMethod::None).unwrap();
        assert_eq!(raw[0], BLOB_FORMAT_VERSION);
        assert_eq!(raw[1], CompressionMethod::None as u8);
        let decoded = SliceBlob::decode(&raw).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_float_blob_round_trip_zstd() {
        let blob = SliceBlob::from_floats(2, 2, vec![0.0, 0.25, 0.5, 1.0]);
        let raw = blob.encode(CompressionMethod::Zstd).unwrap();
        assert_eq!(raw[1], CompressionMethod::Zstd as u8);
        let decoded = SliceBlob::decode(&raw).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_mask_blob_round_trip_rle() {
        let mut mask = vec![0u8; 64 * 64];
        mask[1000..2000].fill(1);
        let blob = SliceBlob::from_bytes(64, 64, mask);
        let raw = blob.encode(CompressionMethod::RLE).unwrap();
        let decoded = SliceBlob::decode(&raw).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_decode_rejects_truncated_envelope() {
        for raw in [&[][..], &[BLOB_FORMAT_VERSION][..]] {
            let err = SliceBlob::decode(raw).unwrap_err();
            assert!(matches!(err, SliceDbError::Deserialization(_)));
        }
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let blob = SliceBlob::from_bytes(1, 1, vec![42]);
        let mut raw = blob.encode(CompressionMethod::None).unwrap();
        raw[0] = 9;
        let err = SliceBlob::decode(&raw).unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_compression_tag() {
        let blob = SliceBlob::from_bytes(1, 1, vec![42]);
        let mut raw = blob.encode(CompressionMethod::None).unwrap();
        raw[1] = 0xEE;
        let err = SliceBlob::decode(&raw).unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }

    #[test]
    fn test_decode_rejects_garbage_body() {
        let raw = [BLOB_FORMAT_VERSION, CompressionMethod::None as u8, 0xFF];
        let err = SliceBlob::decode(&raw).unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }

    #[test]
    fn test_into_array_row_major() {
        let arr = SliceBlob::from_bytes(2, 3, vec![0, 1, 2, 3, 4, 5])
            .into_array()
            .unwrap();
        assert_eq!(arr.shape(), (2, 3));
        let arr = arr.into_u8().unwrap();
        assert_eq!(arr[[0, 0]], 0);
        assert_eq!(arr[[0, 2]], 2);
        assert_eq!(arr[[1, 0]], 3);
        assert_eq!(arr[[1, 2]], 5);
    }

    #[test]
    fn test_into_array_float() {
        let arr = SliceBlob::from_floats(2, 2, vec![0.0, 0.5, 0.75, 1.0])
            .into_array()
            .unwrap();
        assert_eq!(arr.shape(), (2, 2));
        let arr = arr.into_f32().unwrap();
        assert_eq!(arr[[1, 0]], 0.75);
    }

    #[test]
    fn test_into_array_rejects_length_mismatch() {
        // record lies about its dimensions
        let blob = SliceBlob::from_bytes(4, 4, vec![1, 2, 3]);
        let err = blob.into_array().unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }

    #[test]
    fn test_into_array_rejects_multi_channel() {
        let mut blob = SliceBlob::from_bytes(1, 2, vec![1, 2, 3, 4, 5, 6]);
        blob.channels = 3;
        let err = blob.into_array().unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }

    #[test]
    fn test_corrupt_record_survives_envelope_but_fails_reshape() {
        let blob = SliceBlob::from_bytes(8, 8, vec![7; 10]);
        let raw = blob.encode(CompressionMethod::Deflate).unwrap();
        let decoded = SliceBlob::decode(&raw).unwrap();
        let err = decoded.into_array().unwrap_err();
        assert!(matches!(err, SliceDbError::Deserialization(_)));
    }
}
