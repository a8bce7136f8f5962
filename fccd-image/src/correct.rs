//! Gain/dark/flat correction for multi-gain FastCCD frames.
//!
//! Raw samples carry their gain tier and a bad-pixel flag in the top
//! three bits (see [`fccd_core::sample`]). Correction decodes each
//! sample, subtracts the tier-specific dark reference, and scales by
//! the tier gain multiplier and the per-pixel flat-field response:
//!
//! ```text
//! corrected = (intensity - dark[tier]) * flat * gain[tier]
//! ```
//!
//! Bad-pixel-flagged samples become NaN. The operation is a pure
//! function of its inputs; repeated calls produce bit-identical output.

use fccd_core::{decode, Error, Result};
use log::{debug, info, warn};
use ndarray::{Array, Array2, Array3, ArrayView, ArrayView2, ArrayView3, ArrayViewMut2, CowArray, Dimension, Ix2, Ix3};
use rayon::prelude::*;
use std::time::Instant;

/// Corrects a stack of raw multi-gain frames.
///
/// `images` may have any shape `(..., rows, cols)`; the correction is
/// applied per frame over the last two axes, in parallel across frames.
///
/// * `dark` - per-tier dark references of shape `(3, rows, cols)`,
///   index 0 holding the x8 (most sensitive) tier and index 2 the x1
///   tier. `None` leaves all tiers dark-uncorrected.
/// * `flat` - flat-field multipliers of shape `(rows, cols)`; `None`
///   applies no flat-field rescaling.
/// * `gain` - tier multipliers indexed like `dark`
///   ([`fccd_core::DEFAULT_GAIN`] is `(1, 4, 8)`).
///
/// # Errors
///
/// [`Error::DimensionError`] when `images` has fewer than two axes;
/// [`Error::ShapeMismatch`] when `dark` or `flat` disagrees with the
/// frame shape.
pub fn correct_images<D>(
    images: ArrayView<'_, u16, D>,
    dark: Option<ArrayView3<'_, f32>>,
    flat: Option<ArrayView2<'_, f32>>,
    gain: [f32; 3],
) -> Result<Array<f32, D>>
where
    D: Dimension,
{
    let nd = images.ndim();
    if nd < 2 {
        return Err(Error::DimensionError {
            expected: 2,
            actual: nd,
        });
    }
    let shape = images.shape();
    let (rows, cols) = (shape[nd - 2], shape[nd - 1]);

    let dark: CowArray<'_, f32, Ix3> = match dark {
        Some(d) => {
            if d.shape() != [3, rows, cols] {
                return Err(Error::shape_mismatch(&[3, rows, cols], d.shape()));
            }
            CowArray::from(d)
        }
        None => {
            warn!("not correcting for darkfield, no input");
            CowArray::from(Array3::zeros((3, rows, cols)))
        }
    };
    let flat: CowArray<'_, f32, Ix2> = match flat {
        Some(f) => {
            if f.shape() != [rows, cols] {
                return Err(Error::shape_mismatch(&[rows, cols], f.shape()));
            }
            CowArray::from(f)
        }
        None => {
            warn!("not correcting for flatfield, no input");
            CowArray::from(Array2::ones((rows, cols)))
        }
    };

    info!("correcting image stack of shape {shape:?}");
    let t0 = Instant::now();

    let nimages: usize = shape[..nd - 2].iter().product();
    let contiguous = images.as_standard_layout();
    let input = contiguous
        .view()
        .into_shape_with_order((nimages, rows, cols))
        .expect("contiguous stack reshapes to (n, rows, cols)");

    let dark = dark.view();
    let flat = flat.view();

    let mut out = Array3::<f32>::zeros((nimages, rows, cols));
    let in_frames: Vec<ArrayView2<'_, u16>> = input.outer_iter().collect();
    let out_frames: Vec<ArrayViewMut2<'_, f32>> = out.outer_iter_mut().collect();
    out_frames
        .into_par_iter()
        .zip(in_frames)
        .for_each(|(mut out_frame, in_frame)| {
            correct_frame_into(&in_frame, &mut out_frame, &dark, &flat, gain);
        });

    debug!(
        "corrected image stack in {:.3} seconds",
        t0.elapsed().as_secs_f64()
    );

    Ok(out
        .into_shape_with_order(images.raw_dim())
        .expect("output preserves the input element count"))
}

/// Per-frame correction kernel. Frames are independent, so the caller
/// can run this in parallel without affecting the result.
fn correct_frame_into(
    input: &ArrayView2<'_, u16>,
    out: &mut ArrayViewMut2<'_, f32>,
    dark: &ArrayView3<'_, f32>,
    flat: &ArrayView2<'_, f32>,
    gain: [f32; 3],
) {
    for ((r, c), &raw) in input.indexed_iter() {
        let sample = decode(raw);
        out[[r, c]] = if sample.bad {
            f32::NAN
        } else {
            let t = sample.tier.dark_index();
            (f32::from(sample.intensity) - dark[[t, r, c]]) * flat[[r, c]] * gain[t]
        };
    }
}
