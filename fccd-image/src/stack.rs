//! NaN-aware statistics over a stack of frames.
//!
//! All operations collapse every leading axis of a `(..., rows, cols)`
//! stack down to one `(rows, cols)` result, skipping NaN entries and
//! reporting how many valid samples went into each pixel. NaN is how
//! the corrector marks bad pixels, so a stack mean of corrected frames
//! transparently excludes them.

use fccd_core::{Error, Result};
use log::warn;
use ndarray::{Array2, ArrayViewD};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Statistic computed along the stack axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StackOp {
    /// Per-pixel mean of the valid samples.
    Mean,
    /// Per-pixel sum of the valid samples.
    Sum,
    /// Per-pixel population variance of the valid samples.
    Variance,
    /// Per-pixel standard error of the mean.
    StdErr,
}

/// Computes a NaN-aware statistic over the leading axes of a stack.
///
/// Equivalent to [`stack_process_norm`] without sum renormalization.
///
/// # Errors
///
/// [`Error::DimensionError`] when the stack has fewer than three axes.
pub fn stack_process(
    stack: ArrayViewD<'_, f32>,
    op: StackOp,
) -> Result<(Array2<f32>, Array2<u32>)> {
    stack_process_norm(stack, op, false)
}

/// Computes a NaN-aware statistic over the leading axes of a stack,
/// returning the per-pixel statistic and the per-pixel count of valid
/// (non-NaN) samples.
///
/// A pixel with no valid samples yields 0 for [`StackOp::Sum`] and NaN
/// for the other operations. With `normalize` set, sums are rescaled by
/// `n_frames / count` so pixels that lost samples to NaN stay comparable
/// to full columns; without it, a sum that had to exclude NaN samples
/// logs a warning.
///
/// # Errors
///
/// [`Error::DimensionError`] when the stack has fewer than three axes.
pub fn stack_process_norm(
    stack: ArrayViewD<'_, f32>,
    op: StackOp,
    normalize: bool,
) -> Result<(Array2<f32>, Array2<u32>)> {
    let nd = stack.ndim();
    if nd < 3 {
        return Err(Error::DimensionError {
            expected: 3,
            actual: nd,
        });
    }
    let shape = stack.shape();
    let (rows, cols) = (shape[nd - 2], shape[nd - 1]);
    let nframes: usize = shape[..nd - 2].iter().product();

    let contiguous = stack.as_standard_layout();
    let input = contiguous
        .view()
        .into_shape_with_order((nframes, rows, cols))
        .expect("contiguous stack reshapes to (n, rows, cols)");

    // Rows are independent; frames are the inner accumulation loop.
    let per_row: Vec<(Vec<f32>, Vec<u32>)> = (0..rows)
        .into_par_iter()
        .map(|r| {
            let mut values = vec![0.0f32; cols];
            let mut counts = vec![0u32; cols];
            for c in 0..cols {
                let mut sum = 0.0f64;
                let mut sumsq = 0.0f64;
                let mut n = 0u32;
                for k in 0..nframes {
                    let v = f64::from(input[[k, r, c]]);
                    if !v.is_nan() {
                        sum += v;
                        sumsq += v * v;
                        n += 1;
                    }
                }
                values[c] = finish_pixel(op, normalize, sum, sumsq, n, nframes);
                counts[c] = n;
            }
            (values, counts)
        })
        .collect();

    let mut values = Vec::with_capacity(rows * cols);
    let mut counts = Vec::with_capacity(rows * cols);
    for (v, c) in per_row {
        values.extend(v);
        counts.extend(c);
    }
    let values = Array2::from_shape_vec((rows, cols), values).expect("row results fill the output");
    let counts = Array2::from_shape_vec((rows, cols), counts).expect("row results fill the output");

    if op == StackOp::Sum && !normalize && counts.iter().any(|&n| (n as usize) < nframes) {
        warn!("stack sum excluded NaN samples without renormalization");
    }

    Ok((values, counts))
}

fn finish_pixel(op: StackOp, normalize: bool, sum: f64, sumsq: f64, n: u32, nframes: usize) -> f32 {
    if n == 0 {
        return match op {
            StackOp::Sum => 0.0,
            _ => f32::NAN,
        };
    }
    let nf = f64::from(n);
    match op {
        StackOp::Sum => {
            if normalize {
                (sum * nframes as f64 / nf) as f32
            } else {
                sum as f32
            }
        }
        StackOp::Mean => (sum / nf) as f32,
        StackOp::Variance => (((sumsq - sum * sum / nf) / nf).max(0.0)) as f32,
        StackOp::StdErr => ((((sumsq - sum * sum / nf) / nf).max(0.0)) / nf).sqrt() as f32,
    }
}

/// Per-pixel NaN-aware mean of a stack.
///
/// # Errors
///
/// [`Error::DimensionError`] when the stack has fewer than three axes.
pub fn stackmean(stack: ArrayViewD<'_, f32>) -> Result<Array2<f32>> {
    Ok(stack_process(stack, StackOp::Mean)?.0)
}

/// Per-pixel NaN-aware sum of a stack with valid-sample counts.
///
/// # Errors
///
/// [`Error::DimensionError`] when the stack has fewer than three axes.
pub fn stacksum(stack: ArrayViewD<'_, f32>) -> Result<(Array2<f32>, Array2<u32>)> {
    stack_process(stack, StackOp::Sum)
}
