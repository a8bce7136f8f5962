//! Lossless 90-degree reorientation of frame stacks.

use fccd_core::{Error, Result};
use ndarray::{Array, Array3, ArrayView, ArrayView2, ArrayViewMut2, Dimension};
use rayon::prelude::*;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a 90-degree rotation, viewed facing the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RotationSense {
    /// Rotate clockwise.
    Clockwise,
    /// Rotate counter-clockwise.
    CounterClockwise,
}

impl FromStr for RotationSense {
    type Err = Error;

    /// Parses the historical `"cw"` / `"ccw"` flags.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cw" => Ok(RotationSense::Clockwise),
            "ccw" => Ok(RotationSense::CounterClockwise),
            other => Err(Error::InvalidArgument(format!(
                "rotation sense must be 'cw' or 'ccw', got '{other}'"
            ))),
        }
    }
}

/// Rotates each frame of a stack by 90 degrees in the plane of the
/// last two axes.
///
/// The output shape is the input shape with the last two axes swapped.
/// The transform is exact and invertible: rotating clockwise then
/// counter-clockwise reproduces the input bit-for-bit.
///
/// # Errors
///
/// [`Error::DimensionError`] when the input has fewer than two axes.
pub fn rotate90<A, D>(stack: ArrayView<'_, A, D>, sense: RotationSense) -> Result<Array<A, D>>
where
    A: Copy + Default + Send + Sync,
    D: Dimension,
{
    let nd = stack.ndim();
    if nd < 2 {
        return Err(Error::DimensionError {
            expected: 2,
            actual: nd,
        });
    }
    let shape = stack.shape();
    let (rows, cols) = (shape[nd - 2], shape[nd - 1]);
    let nimages: usize = shape[..nd - 2].iter().product();

    let contiguous = stack.as_standard_layout();
    let input = contiguous
        .view()
        .into_shape_with_order((nimages, rows, cols))
        .expect("contiguous stack reshapes to (n, rows, cols)");

    let mut out = Array3::<A>::from_elem((nimages, cols, rows), A::default());
    let in_frames: Vec<ArrayView2<'_, A>> = input.outer_iter().collect();
    let out_frames: Vec<ArrayViewMut2<'_, A>> = out.outer_iter_mut().collect();
    out_frames
        .into_par_iter()
        .zip(in_frames)
        .for_each(|(mut out_frame, in_frame)| {
            rotate_frame_into(&in_frame, &mut out_frame, sense);
        });

    let mut out_dim = stack.raw_dim();
    out_dim.slice_mut().swap(nd - 2, nd - 1);
    Ok(out
        .into_shape_with_order(out_dim)
        .expect("rotation preserves the element count"))
}

fn rotate_frame_into<A: Copy>(
    input: &ArrayView2<'_, A>,
    out: &mut ArrayViewMut2<'_, A>,
    sense: RotationSense,
) {
    let (rows, cols) = input.dim();
    match sense {
        RotationSense::Clockwise => {
            for ((r, c), &v) in input.indexed_iter() {
                out[[c, rows - 1 - r]] = v;
            }
        }
        RotationSense::CounterClockwise => {
            for ((r, c), &v) in input.indexed_iter() {
                out[[cols - 1 - c, r]] = v;
            }
        }
    }
}
