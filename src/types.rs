//! Core data types for stored slices

use crate::error::SliceDbError;
use std::fmt;
use std::str::FromStr;

/// What a slice record contains: raw scan data or a segmentation mask.
///
/// The wire token (`img`/`seg`) is the third field of the encoded key.
/// Variants are declared in token order so that the derived `Ord` agrees
/// with the lexicographic order of encoded keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SliceKind {
    /// Scan intensity data
    Image,
    /// Segmentation mask
    Segmentation,
}

impl SliceKind {
    /// Wire token used in the encoded key
    pub fn as_str(&self) -> &'static str {
        match self {
            SliceKind::Image => "img",
            SliceKind::Segmentation => "seg",
        }
    }
}

impl fmt::Display for SliceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SliceKind {
    type Err = SliceDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "img" => Ok(SliceKind::Image),
            "seg" => Ok(SliceKind::Segmentation),
            other => Err(SliceDbError::InvalidKind(other.to_string())),
        }
    }
}

/// Which of the three axis-aligned 2-D cuts of a volume a slice represents.
///
/// The wire token (`xy`/`xz`/`yz`) is the fourth field of the encoded key.
/// Variants are declared in token order (see [`SliceKind`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlicePlane {
    /// Cut across the z axis; slices are (x, y) planes
    Xy,
    /// Cut across the y axis; slices are (x, z) planes
    Xz,
    /// Cut across the x axis; slices are (y, z) planes
    Yz,
}

impl SlicePlane {
    /// Wire token used in the encoded key
    pub fn as_str(&self) -> &'static str {
        match self {
            SlicePlane::Xy => "xy",
            SlicePlane::Xz => "xz",
            SlicePlane::Yz => "yz",
        }
    }

    /// Axis index that holds slice positions in a reconstructed volume
    /// after the per-plane axis swaps have been applied.
    pub fn depth_axis(&self) -> usize {
        match self {
            SlicePlane::Xy => 2,
            SlicePlane::Xz => 1,
            SlicePlane::Yz => 0,
        }
    }
}

impl fmt::Display for SlicePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlicePlane {
    type Err = SliceDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xy" => Ok(SlicePlane::Xy),
            "xz" => Ok(SlicePlane::Xz),
            "yz" => Ok(SlicePlane::Yz),
            other => Err(SliceDbError::InvalidPlane(other.to_string())),
        }
    }
}
