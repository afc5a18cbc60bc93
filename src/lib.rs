//! SliceDB - ordered slice store for volumetric medical scans
//!
//! Persists the 2-D slices of volumetric scans (and their segmentation
//! masks) into an ordered key-value store under fixed-width textual keys,
//! and reconstructs 3-D volumes from the stored slices on demand.
//!
//! # Features
//!
//! - Fixed-grammar 29-byte slice keys whose encoded byte order equals
//!   field-wise numeric order
//! - Batched atomic writes with a configurable auto-flush threshold
//! - Self-describing blob envelope (uncompressed, Deflate, RLE or Zstd)
//! - Byte and float slice payloads, dtype-tagged end to end
//! - Full-scan volume reconstruction with per-plane axis orientation
//!
//! # Example
//!
//! ```rust,ignore
//! use slicedb::{SliceKey, SliceKind, SlicePlane, SliceStore};
//!
//! fn example(slices: &[Vec<u8>]) -> slicedb::Result<()> {
//!     let mut store = SliceStore::open("/data/scan-slices")?;
//!
//!     let mut key = SliceKey::builder()
//!         .counter(0)?
//!         .group_id(17)?
//!         .kind(SliceKind::Image)
//!         .plane(SlicePlane::Xy)
//!         .position(0)?
//!         .build()?;
//!
//!     // stage one 512x512 slice per position, then flush
//!     for (position, pixels) in slices.iter().enumerate() {
//!         key.increment_counter()?;
//!         key.set_position(position as u32)?;
//!         store.add_batch(&key, pixels, 512, 512)?;
//!     }
//!     store.write()?;
//!
//!     let volume = store.read_volume(&key, 0)?;
//!     println!("reconstructed {:?}", volume.shape());
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod compression;
pub mod error;
pub mod key;
pub mod pgm;
pub mod store;
pub mod types;
pub mod volume;

// Re-exports
pub use blob::{PixelData, SliceArray, SliceBlob};
pub use compression::{CompressionMethod, Compressor};
pub use error::{Result, SliceDbError};
pub use key::{SliceKey, SliceKeyBuilder};
pub use store::{BatchState, SliceStore, StoreOptions};
pub use types::{SliceKind, SlicePlane};
pub use volume::Volume;

/// Version of the SliceDB implementation
pub const SLICEDB_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!SLICEDB_VERSION.is_empty());
    }
}
