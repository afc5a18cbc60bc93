//! 3-D volume assembly from ordered slice stacks
//!
//! A volume is reconstructed by stacking the 2-D slices of one group along a
//! new trailing depth axis (ascending position) and then reorienting the
//! result according to the plane the slices were cut in:
//!
//! - `xy` — returned as stacked, shape `(H, W, D)`
//! - `xz` — axes 1 and 2 swapped, shape `(H, D, W)`
//! - `yz` — axes 0 and 2 swapped, then 1 and 2, shape `(D, H, W)`
//!
//! Volumes are ephemeral: they are rebuilt on demand and never persisted as
//! first-class records.

use crate::blob::SliceArray;
use crate::error::{Result, SliceDbError};
use crate::types::SlicePlane;
use ndarray::{Array2, Array3, Axis};
use std::collections::BTreeMap;

/// A reconstructed 3-D volume, tagged by sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    U8(Array3<u8>),
    F32(Array3<f32>),
}

impl Volume {
    /// Volume shape as (axis0, axis1, axis2) after orientation
    pub fn shape(&self) -> (usize, usize, usize) {
        match self {
            Volume::U8(arr) => arr.dim(),
            Volume::F32(arr) => arr.dim(),
        }
    }

    pub fn as_u8(&self) -> Option<&Array3<u8>> {
        match self {
            Volume::U8(arr) => Some(arr),
            Volume::F32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Array3<f32>> {
        match self {
            Volume::U8(_) => None,
            Volume::F32(arr) => Some(arr),
        }
    }

    pub fn into_u8(self) -> Option<Array3<u8>> {
        match self {
            Volume::U8(arr) => Some(arr),
            Volume::F32(_) => None,
        }
    }

    pub fn into_f32(self) -> Option<Array3<f32>> {
        match self {
            Volume::U8(_) => None,
            Volume::F32(arr) => Some(arr),
        }
    }
}

/// Stack slices keyed by position into an oriented volume.
///
/// Positions need not be contiguous; gaps simply reduce the depth. All
/// slices must share one sample type and one shape — disagreement on either
/// is a shape-mismatch error naming the first offending position.
pub fn assemble(plane: SlicePlane, slices: BTreeMap<u32, SliceArray>) -> Result<Volume> {
    if slices.is_empty() {
        return Err(SliceDbError::EmptyVolume("no slices to stack".to_string()));
    }

    // Partition by sample type; BTreeMap iteration keeps ascending position.
    let mut bytes: Vec<Array2<u8>> = Vec::new();
    let mut floats: Vec<Array2<f32>> = Vec::new();
    for (position, slice) in slices {
        match slice {
            SliceArray::U8(arr) => {
                if !floats.is_empty() {
                    return Err(SliceDbError::ShapeMismatch(format!(
                        "slice at position {} holds byte samples in a float volume",
                        position
                    )));
                }
                bytes.push(arr);
            }
            SliceArray::F32(arr) => {
                if !bytes.is_empty() {
                    return Err(SliceDbError::ShapeMismatch(format!(
                        "slice at position {} holds float samples in a byte volume",
                        position
                    )));
                }
                floats.push(arr);
            }
        }
    }

    if bytes.is_empty() {
        Ok(Volume::F32(orient(plane, stack_positions(&floats)?)))
    } else {
        Ok(Volume::U8(orient(plane, stack_positions(&bytes)?)))
    }
}

/// Stack same-shaped 2-D slices along a new trailing depth axis.
fn stack_positions<T: Clone>(slices: &[Array2<T>]) -> Result<Array3<T>> {
    let views: Vec<_> = slices.iter().map(|slice| slice.view()).collect();
    ndarray::stack(Axis(2), &views)
        .map_err(|e| SliceDbError::ShapeMismatch(format!("cannot stack slices: {}", e)))
}

/// Reorient a freshly-stacked `(H, W, D)` volume for its cutting plane.
fn orient<T>(plane: SlicePlane, mut volume: Array3<T>) -> Array3<T> {
    match plane {
        SlicePlane::Xy => {}
        SlicePlane::Xz => volume.swap_axes(1, 2),
        SlicePlane::Yz => {
            volume.swap_axes(0, 2);
            volume.swap_axes(1, 2);
        }
    }
    volume
}
