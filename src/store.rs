//! Slice persistence over an ordered key-value store
//!
//! `SliceStore` wraps a rocksdb database whose keys are encoded
//! [`SliceKey`]s and whose values are enveloped slice blobs. Writes are
//! staged into an atomic batch and flushed either explicitly via
//! [`SliceStore::write`] or automatically once the staged count reaches the
//! configured threshold. Reads decode single slices by exact key;
//! [`SliceStore::read_volume`] reassembles a full 3-D volume from one
//! ordered pass over the keyspace.

use crate::blob::{SliceArray, SliceBlob};
use crate::compression::CompressionMethod;
use crate::error::{Result, SliceDbError};
use crate::key::SliceKey;
use crate::pgm;
use crate::volume::{self, Volume};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Default rocksdb write buffer size in bytes (256 MiB, favoring write
/// throughput over early flushes)
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 268_435_456;

/// Default number of staged puts that triggers an automatic flush
pub const DEFAULT_BATCH_THRESHOLD: usize = 1000;

/// Volume scans emit a trace event every this many records
const SCAN_TRACE_INTERVAL: usize = 200;

/// Configuration for opening a [`SliceStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Create the store directory if it does not exist yet
    pub create_if_missing: bool,
    /// rocksdb write buffer size hint in bytes
    pub write_buffer_size: usize,
    /// Staged-put count at which a batch flushes automatically
    pub batch_threshold: usize,
    /// Compression applied to blob bodies on write
    pub compression: CompressionMethod,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            compression: CompressionMethod::None,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }

    pub fn with_batch_threshold(mut self, threshold: usize) -> Self {
        self.batch_threshold = threshold;
        self
    }

    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }
}

/// Observable write-batch lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No batch is open
    Idle,
    /// A batch is open with this many staged puts
    Accumulating(usize),
    /// A batch is being committed
    Flushing,
}

/// Internal batch lifecycle; owns the open batch while accumulating.
enum WriteState {
    Idle,
    Accumulating { batch: WriteBatch, staged: usize },
    Flushing,
}

impl Default for WriteState {
    fn default() -> Self {
        WriteState::Idle
    }
}

impl WriteState {
    /// Stage one put, opening a batch if none is open. Returns the staged
    /// count after the put.
    fn stage(&mut self, key: &[u8], value: &[u8]) -> usize {
        let (mut batch, staged) = match mem::take(self) {
            WriteState::Idle | WriteState::Flushing => (WriteBatch::default(), 0),
            WriteState::Accumulating { batch, staged } => (batch, staged),
        };
        batch.put(key, value);
        let staged = staged + 1;
        *self = WriteState::Accumulating { batch, staged };
        staged
    }
}

/// Ordered slice store with batched writes and on-demand volume
/// reconstruction.
pub struct SliceStore {
    db: DB,
    state: WriteState,
    options: StoreOptions,
}

impl SliceStore {
    /// Open (creating if absent) a store at `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open a store at `path` with explicit options.
    pub fn open_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let mut db_options = Options::default();
        db_options.create_if_missing(options.create_if_missing);
        db_options.set_write_buffer_size(options.write_buffer_size);
        let db = DB::open(&db_options, path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened slice store");
        Ok(Self {
            db,
            state: WriteState::Idle,
            options,
        })
    }

    /// Stage a byte-sample slice for writing.
    ///
    /// `pixels` must hold exactly `width * height` samples in row-major
    /// order. The put lands in the open batch (opening one if needed);
    /// reaching the batch threshold flushes automatically.
    pub fn add_batch(
        &mut self,
        key: &SliceKey,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<()> {
        check_dimensions(pixels.len(), width, height)?;
        let blob = SliceBlob::from_bytes(height, width, pixels.to_vec());
        self.stage_blob(key, &blob)
    }

    /// Stage a float-sample slice for writing.
    ///
    /// Same contract as [`SliceStore::add_batch`]; float slices are expected
    /// normalized to `[0, 1]`.
    pub fn add_batch_float(
        &mut self,
        key: &SliceKey,
        values: &[f32],
        width: u32,
        height: u32,
    ) -> Result<()> {
        check_dimensions(values.len(), width, height)?;
        let blob = SliceBlob::from_floats(height, width, values.to_vec());
        self.stage_blob(key, &blob)
    }

    fn stage_blob(&mut self, key: &SliceKey, blob: &SliceBlob) -> Result<()> {
        let raw = blob.encode(self.options.compression)?;
        let staged = self.state.stage(key.encode().as_bytes(), &raw);
        trace!(key = %key, staged, "staged slice write");
        if staged >= self.options.batch_threshold {
            self.write()?;
        }
        Ok(())
    }

    /// Commit the open batch atomically; a no-op when nothing is staged.
    ///
    /// Must be called at the end of a write session to flush a partial
    /// batch. A failed commit consumes the batch and ends the session: the
    /// state resets to idle and the error propagates, nothing is retried.
    pub fn write(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, WriteState::Flushing) {
            WriteState::Idle | WriteState::Flushing => {
                self.state = WriteState::Idle;
                Ok(())
            }
            WriteState::Accumulating { batch, staged } => {
                let outcome = self.db.write(batch);
                self.state = WriteState::Idle;
                outcome?;
                debug!(staged, "committed write batch");
                Ok(())
            }
        }
    }

    /// Current write-batch lifecycle state.
    pub fn batch_state(&self) -> BatchState {
        match &self.state {
            WriteState::Idle => BatchState::Idle,
            WriteState::Accumulating { staged, .. } => BatchState::Accumulating(*staged),
            WriteState::Flushing => BatchState::Flushing,
        }
    }

    /// Decode a raw stored value into a 2-D slice array.
    pub fn decode_blob(raw: &[u8]) -> Result<SliceArray> {
        SliceBlob::decode(raw)?.into_array()
    }

    /// Fetch and decode the slice stored at `key`.
    pub fn read_image(&self, key: &SliceKey) -> Result<SliceArray> {
        let encoded = key.encode();
        match self.db.get(encoded.as_bytes())? {
            Some(raw) => Self::decode_blob(&raw),
            None => Err(SliceDbError::NotFound(format!(
                "no slice at key {}",
                encoded
            ))),
        }
    }

    /// Read the slice at `key` and write it as `<encoded key>.pgm` under
    /// `dir`, returning the written path.
    ///
    /// Float slices are quantized to 8-bit for dumping.
    pub fn dump_image<P: AsRef<Path>>(&self, key: &SliceKey, dir: P) -> Result<PathBuf> {
        let encoded = key.encode();
        let path = dir.as_ref().join(format!("{}.pgm", encoded));
        let gray = match self.read_image(key)? {
            SliceArray::U8(arr) => arr,
            // float slices are stored normalized to [0, 1]
            SliceArray::F32(arr) => arr.mapv(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8),
        };
        pgm::write_pgm(&path, &encoded, &gray)?;
        debug!(path = %path.display(), "dumped slice");
        Ok(path)
    }

    /// Reconstruct the volume selected by `key` and `sub_index`.
    ///
    /// Walks every record in the store in ascending key order (the cost is
    /// always proportional to the total record count, not the volume size),
    /// keeps records agreeing with the filter fields of `key` — kind, plane
    /// and `sub_index` — then accumulates those in `key`'s group, decodes
    /// them and stacks them by ascending position. `counter` and `position`
    /// on the input key are ignored. On repeated positions the
    /// last-scanned record wins.
    ///
    /// Stored keys that do not parse are corruption (the store owns its
    /// keyspace) and fail the scan with a malformed-key error.
    pub fn read_volume(&self, key: &SliceKey, sub_index: u32) -> Result<Volume> {
        let mut collected: BTreeMap<u32, SliceArray> = BTreeMap::new();
        let mut scanned = 0usize;

        for item in self.db.iterator(IteratorMode::Start) {
            let (stored_key, value) = item?;
            scanned += 1;
            if scanned % SCAN_TRACE_INTERVAL == 0 {
                trace!(scanned, matched = collected.len(), "volume scan progress");
            }

            let text = std::str::from_utf8(&stored_key).map_err(|_| {
                SliceDbError::MalformedKey(String::from_utf8_lossy(&stored_key).into_owned())
            })?;
            let candidate = SliceKey::decode(text)?;

            if candidate.sub_index() != sub_index {
                continue;
            }
            if candidate.plane() != key.plane() {
                continue;
            }
            if candidate.kind() != key.kind() {
                continue;
            }
            if candidate.group_id() != key.group_id() {
                continue;
            }

            let slice = Self::decode_blob(&value)?;
            collected.insert(candidate.position(), slice);
        }

        debug!(scanned, matched = collected.len(), "volume scan complete");
        if collected.is_empty() {
            return Err(SliceDbError::EmptyVolume(format!(
                "no slices matched group {} ({}/{}, sub-index {})",
                key.group_id(),
                key.kind(),
                key.plane(),
                sub_index
            )));
        }
        volume::assemble(key.plane(), collected)
    }
}

impl Drop for SliceStore {
    fn drop(&mut self) {
        if let WriteState::Accumulating { staged, .. } = &self.state {
            warn!(staged = *staged, "dropping store with staged writes never flushed");
        }
    }
}

fn check_dimensions(len: usize, width: u32, height: u32) -> Result<()> {
    let expected = (width as usize).checked_mul(height as usize);
    if expected != Some(len) {
        return Err(SliceDbError::InvalidDimensions(format!(
            "payload of {} samples does not fill a {}x{} slice",
            len, width, height
        )));
    }
    Ok(())
}
