//! Overscan column handling for FastCCD frames.
//!
//! The sensor reads columns out from both edges toward the center, and
//! every readout block interleaves a fixed period of columns: `os_cols`
//! overscan (charge-transfer reference) columns followed by `data_cols`
//! real data columns. This module splits a frame stack at the column
//! midpoint, mirrors the left half so both halves present columns in
//! readout order, and then either strips the overscan columns or
//! broadcasts their per-row reference value over the matching data
//! columns so the two results subtract directly:
//!
//! ```text
//! corrected = drop_overscan(images) - extract_overscan(images)
//! ```
//!
//! Input stacks are `(points, frames, rows, cols)`; anything else is a
//! [`Error::DimensionError`]. A column count that does not divide evenly
//! into super-columns is rejected with [`Error::ShapeMismatch`] rather
//! than silently truncated.

use fccd_core::{Error, Result};
use ndarray::{concatenate, s, Array3, Array4, ArrayView4, ArrayViewD, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column layout of one readout super-column.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverscanLayout {
    /// Overscan columns per super-column.
    pub os_cols: usize,
    /// Real data columns per super-column.
    pub data_cols: usize,
    /// Use a single overscan column (by index within the overscan
    /// block) as the reference instead of the mean over all of them.
    pub single_column: Option<usize>,
}

impl Default for OverscanLayout {
    fn default() -> Self {
        Self {
            os_cols: 2,
            data_cols: 10,
            single_column: None,
        }
    }
}

impl OverscanLayout {
    /// Creates the default 2-overscan / 10-data layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of overscan columns per super-column.
    pub fn with_os_cols(mut self, os_cols: usize) -> Self {
        self.os_cols = os_cols;
        self
    }

    /// Sets the number of data columns per super-column.
    pub fn with_data_cols(mut self, data_cols: usize) -> Self {
        self.data_cols = data_cols;
        self
    }

    /// Selects one overscan column as the reference.
    pub fn with_single_column(mut self, column: usize) -> Self {
        self.single_column = Some(column);
        self
    }

    /// Full super-column period.
    pub fn period(&self) -> usize {
        self.os_cols + self.data_cols
    }

    fn validate(&self) -> Result<()> {
        if self.os_cols == 0 || self.data_cols == 0 {
            return Err(Error::InvalidArgument(format!(
                "overscan layout needs at least one overscan and one data column, \
                 got os_cols={}, data_cols={}",
                self.os_cols, self.data_cols
            )));
        }
        if let Some(col) = self.single_column {
            if col >= self.os_cols {
                return Err(Error::InvalidArgument(format!(
                    "single_column index {col} out of range for {} overscan columns",
                    self.os_cols
                )));
            }
        }
        Ok(())
    }

    /// Validates the stack rank and column count, returning the number
    /// of super-columns per half.
    fn super_cols(&self, images: &ArrayViewD<'_, f32>) -> Result<usize> {
        self.validate()?;
        if images.ndim() != 4 {
            return Err(Error::DimensionError {
                expected: 4,
                actual: images.ndim(),
            });
        }
        let cols = images.shape()[3];
        let period = self.period();
        if cols % 2 != 0 || (cols / 2) % period != 0 {
            return Err(Error::ShapeMismatch {
                expected: format!("column count divisible by 2 x {period} (os_cols + data_cols per half)"),
                actual: format!("{cols} columns"),
            });
        }
        Ok(cols / 2 / period)
    }
}

/// Strips the overscan columns from a `(points, frames, rows, cols)`
/// stack, keeping only the data columns of each super-column.
///
/// The output has `2 * super_cols * data_cols` columns, with the left
/// half restored to its original orientation.
///
/// # Errors
///
/// [`Error::DimensionError`] for non-4D input; [`Error::ShapeMismatch`]
/// when the columns do not divide evenly into super-columns.
pub fn drop_overscan(images: ArrayViewD<'_, f32>, layout: &OverscanLayout) -> Result<Array4<f32>> {
    let super_cols = layout.super_cols(&images)?;
    let images = images
        .into_dimensionality::<ndarray::Ix4>()
        .expect("rank checked above");
    let half = images.shape()[3] / 2;

    // Left half mirrored into readout order, right half as-is.
    let left = drop_half(images.slice(s![.., .., .., 0..half; -1]), layout, super_cols);
    let right = drop_half(images.slice(s![.., .., .., half..]), layout, super_cols);

    Ok(join_halves(&left, &right))
}

/// Computes the per-row overscan reference of each super-column and
/// broadcasts it over that super-column's data columns.
///
/// The output shape matches [`drop_overscan`], so the two subtract
/// directly.
///
/// # Errors
///
/// Same contract as [`drop_overscan`].
pub fn extract_overscan(
    images: ArrayViewD<'_, f32>,
    layout: &OverscanLayout,
) -> Result<Array4<f32>> {
    let super_cols = layout.super_cols(&images)?;
    let images = images
        .into_dimensionality::<ndarray::Ix4>()
        .expect("rank checked above");
    let half = images.shape()[3] / 2;

    let left = extract_half(images.slice(s![.., .., .., 0..half; -1]), layout, super_cols);
    let right = extract_half(images.slice(s![.., .., .., half..]), layout, super_cols);

    Ok(join_halves(&left, &right))
}

/// Overscan-corrected, overscan-free stack:
/// `drop_overscan(images) - extract_overscan(images)`.
///
/// # Errors
///
/// Same contract as [`drop_overscan`].
pub fn subtract_overscan(
    images: ArrayViewD<'_, f32>,
    layout: &OverscanLayout,
) -> Result<Array4<f32>> {
    let data = drop_overscan(images.view(), layout)?;
    let reference = extract_overscan(images, layout)?;
    Ok(data - reference)
}

fn drop_half(
    half: ArrayView4<'_, f32>,
    layout: &OverscanLayout,
    super_cols: usize,
) -> Array4<f32> {
    let (points, frames, rows, _) = half.dim();
    let period = layout.period();
    let data = layout.data_cols;
    let mut out = Array4::<f32>::zeros((points, frames, rows, super_cols * data));
    for sc in 0..super_cols {
        let src = half.slice(s![.., .., .., sc * period + layout.os_cols..(sc + 1) * period]);
        out.slice_mut(s![.., .., .., sc * data..(sc + 1) * data])
            .assign(&src);
    }
    out
}

fn extract_half(
    half: ArrayView4<'_, f32>,
    layout: &OverscanLayout,
    super_cols: usize,
) -> Array4<f32> {
    let (points, frames, rows, _) = half.dim();
    let period = layout.period();
    let data = layout.data_cols;
    let mut out = Array4::<f32>::zeros((points, frames, rows, super_cols * data));
    for sc in 0..super_cols {
        let os_block = half.slice(s![.., .., .., sc * period..sc * period + layout.os_cols]);
        let reference: Array3<f32> = match layout.single_column {
            Some(col) => os_block.slice(s![.., .., .., col]).to_owned(),
            None => os_block.sum_axis(Axis(3)) / layout.os_cols as f32,
        };
        for d in 0..data {
            out.slice_mut(s![.., .., .., sc * data + d]).assign(&reference);
        }
    }
    out
}

/// Un-mirrors the processed left half and concatenates the halves.
fn join_halves(left: &Array4<f32>, right: &Array4<f32>) -> Array4<f32> {
    concatenate(
        Axis(3),
        &[left.slice(s![.., .., .., ..; -1]), right.view()],
    )
    .expect("halves share leading dimensions")
}
