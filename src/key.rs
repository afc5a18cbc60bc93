//! Fixed-width slice keys and their grammar
//!
//! Every record in the store is addressed by a 29-byte ASCII key of the form
//! `CCCCCCCC_GGGGG_K_O_PPPP_SS`:
//!
//! - `C` — 8-digit zero-padded sequence counter
//! - `G` — 5-digit zero-padded group id (one id per logical volume)
//! - `K` — slice kind token, `img` or `seg`
//! - `O` — slice plane token, `xy`, `xz` or `yz`
//! - `P` — 4-digit zero-padded position within the stack
//! - `S` — 2-digit zero-padded sub-index (resolution/variant tag)
//!
//! Zero padding makes lexicographic byte order on the encoded text equal to
//! field-wise numeric order, which is what gives the store its iteration
//! order. The field widths also bound each numeric field to its domain, so a
//! string that matches the grammar always parses into a valid key.

use crate::error::{Result, SliceDbError};
use crate::types::{SliceKind, SlicePlane};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Maximum sequence counter value (8 digits)
pub const MAX_COUNTER: u32 = 99_999_999;
/// Maximum group id (5 digits)
pub const MAX_GROUP_ID: u32 = 99_999;
/// Maximum slice position (4 digits)
pub const MAX_POSITION: u32 = 9_999;
/// Maximum sub-index (2 digits)
pub const MAX_SUB_INDEX: u32 = 99;

/// Byte length of every encoded key
pub const ENCODED_KEY_LEN: usize = 29;

/// Strict grammar for encoded keys. A key is accepted or rejected as a
/// whole before any field is read out of it.
static KEY_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{8}_[0-9]{5}_(img|seg)_(xy|xz|yz)_[0-9]{4}_[0-9]{2}$")
        .expect("key grammar regex is valid")
});

fn check_range(field: &'static str, value: u32, max: u32) -> Result<u32> {
    if value > max {
        return Err(SliceDbError::OutOfRange {
            field,
            value,
            min: 0,
            max,
        });
    }
    Ok(value)
}

/// A fully-populated, always-valid slice key.
///
/// A `SliceKey` can only be obtained through [`SliceKeyBuilder`] or
/// [`SliceKey::decode`], both of which validate every field, so encoding is
/// infallible. Fields are declared in wire order and the enums in token
/// order, so the derived `Ord` agrees with the byte order of encoded keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SliceKey {
    counter: u32,
    group_id: u32,
    kind: SliceKind,
    plane: SlicePlane,
    position: u32,
    sub_index: u32,
}

impl SliceKey {
    /// Start building a key field by field
    pub fn builder() -> SliceKeyBuilder {
        SliceKeyBuilder::default()
    }

    /// Decode an encoded key string.
    ///
    /// The text is first validated against the fixed grammar as a whole;
    /// only an accepted string is then split on `_` and parsed into typed
    /// fields. Anything that does not match the grammar exactly — wrong
    /// field width, unknown token, missing delimiter, trailing bytes — is
    /// rejected with a malformed-key error before any field is read.
    pub fn decode(text: &str) -> Result<Self> {
        if !KEY_GRAMMAR.is_match(text) {
            return Err(SliceDbError::MalformedKey(text.to_string()));
        }
        Self::parse_fields(text)
    }

    /// Split an accepted key string into its six typed fields.
    ///
    /// Grammar field widths already bound every numeric field to its
    /// domain, so no range re-check is needed here.
    fn parse_fields(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('_').collect();
        if parts.len() != 6 {
            return Err(SliceDbError::MalformedKey(text.to_string()));
        }
        let numeric = |raw: &str| -> Result<u32> {
            raw.parse::<u32>()
                .map_err(|_| SliceDbError::MalformedKey(text.to_string()))
        };
        Ok(SliceKey {
            counter: numeric(parts[0])?,
            group_id: numeric(parts[1])?,
            kind: parts[2].parse()?,
            plane: parts[3].parse()?,
            position: numeric(parts[4])?,
            sub_index: numeric(parts[5])?,
        })
    }

    /// Produce the fixed-width encoded form of this key.
    pub fn encode(&self) -> String {
        format!(
            "{:08}_{:05}_{}_{}_{:04}_{:02}",
            self.counter, self.group_id, self.kind, self.plane, self.position, self.sub_index
        )
    }

    /// Sequence counter
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Group id of the volume this slice belongs to
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    /// Slice kind (image or segmentation)
    pub fn kind(&self) -> SliceKind {
        self.kind
    }

    /// Slice plane (orientation of the 2-D cut)
    pub fn plane(&self) -> SlicePlane {
        self.plane
    }

    /// Position of this slice within its stack
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Resolution/variant sub-index
    pub fn sub_index(&self) -> u32 {
        self.sub_index
    }

    /// Set the sequence counter, validating its domain.
    pub fn set_counter(&mut self, value: u32) -> Result<()> {
        self.counter = check_range("counter", value, MAX_COUNTER)?;
        Ok(())
    }

    /// Set the group id, validating its domain.
    pub fn set_group_id(&mut self, value: u32) -> Result<()> {
        self.group_id = check_range("group_id", value, MAX_GROUP_ID)?;
        Ok(())
    }

    /// Set the slice kind.
    pub fn set_kind(&mut self, kind: SliceKind) {
        self.kind = kind;
    }

    /// Set the slice plane.
    pub fn set_plane(&mut self, plane: SlicePlane) {
        self.plane = plane;
    }

    /// Set the slice position, validating its domain.
    pub fn set_position(&mut self, value: u32) -> Result<()> {
        self.position = check_range("position", value, MAX_POSITION)?;
        Ok(())
    }

    /// Set the sub-index, validating its domain.
    pub fn set_sub_index(&mut self, value: u32) -> Result<()> {
        self.sub_index = check_range("sub_index", value, MAX_SUB_INDEX)?;
        Ok(())
    }

    /// Advance the sequence counter by one and return the new value.
    ///
    /// Fails with a range error when the increment would leave the counter
    /// domain; the key is unchanged in that case.
    pub fn increment_counter(&mut self) -> Result<u32> {
        let next = check_range("counter", self.counter + 1, MAX_COUNTER)?;
        self.counter = next;
        Ok(next)
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Field-by-field builder for [`SliceKey`].
///
/// Numeric setters validate their domain eagerly and fail with a range error
/// naming the field and its bounds; nothing is recorded on failure. The kind
/// and plane setters take the typed enums, so invalid values are
/// unrepresentable. [`SliceKeyBuilder::build`] fails with a missing-field
/// error if any required field was never set; `sub_index` alone is optional
/// and defaults to 0.
#[derive(Debug, Default, Clone)]
pub struct SliceKeyBuilder {
    counter: Option<u32>,
    group_id: Option<u32>,
    kind: Option<SliceKind>,
    plane: Option<SlicePlane>,
    position: Option<u32>,
    sub_index: Option<u32>,
}

impl SliceKeyBuilder {
    /// Set the sequence counter
    pub fn counter(mut self, value: u32) -> Result<Self> {
        self.counter = Some(check_range("counter", value, MAX_COUNTER)?);
        Ok(self)
    }

    /// Set the group id
    pub fn group_id(mut self, value: u32) -> Result<Self> {
        self.group_id = Some(check_range("group_id", value, MAX_GROUP_ID)?);
        Ok(self)
    }

    /// Set the slice kind
    pub fn kind(mut self, kind: SliceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the slice plane
    pub fn plane(mut self, plane: SlicePlane) -> Self {
        self.plane = Some(plane);
        self
    }

    /// Set the slice position
    pub fn position(mut self, value: u32) -> Result<Self> {
        self.position = Some(check_range("position", value, MAX_POSITION)?);
        Ok(self)
    }

    /// Set the sub-index (optional; defaults to 0)
    pub fn sub_index(mut self, value: u32) -> Result<Self> {
        self.sub_index = Some(check_range("sub_index", value, MAX_SUB_INDEX)?);
        Ok(self)
    }

    /// Finish building, failing if a required field is unset.
    pub fn build(self) -> Result<SliceKey> {
        Ok(SliceKey {
            counter: self.counter.ok_or(SliceDbError::MissingField("counter"))?,
            group_id: self
                .group_id
                .ok_or(SliceDbError::MissingField("group_id"))?,
            kind: self.kind.ok_or(SliceDbError::MissingField("kind"))?,
            plane: self.plane.ok_or(SliceDbError::MissingField("plane"))?,
            position: self
                .position
                .ok_or(SliceDbError::MissingField("position"))?,
            sub_index: self.sub_index.unwrap_or(0),
        })
    }
}
