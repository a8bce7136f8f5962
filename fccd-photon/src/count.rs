//! Single-photon cluster extraction.
//!
//! A corrected frame is scanned for pixels inside the candidate
//! threshold window. Around each candidate (visited in row-major
//! order) the brightest pixel of a `grid_size` x `grid_size` window is
//! taken as the cluster seed; the `n_pixels_sum` brightest pixels of
//! the fixed 3x3 neighborhood around the seed are summed and the sum is
//! accepted as one photon when it falls inside the acceptance window
//! around the expected per-photon ADU signal. Accepted clusters claim
//! their pixels: the contributing pixels are zeroed in a working copy
//! so they cannot seed or feed a later cluster.
//!
//! The scan is strictly sequential within a frame (cluster claiming is
//! order-sensitive), but frames of a stack are independent and are
//! processed in parallel by [`photon_count_stack`] with bit-identical
//! results.

use crate::PhotonCountConfig;
use fccd_core::Result;
use log::{debug, info};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Per-frame photon extraction result.
#[derive(Debug, Clone)]
pub struct PhotonMap {
    /// Integrated event energy in ADU, written at each event's seed
    /// pixel; zero where no event was accepted.
    pub energy: Array2<f32>,
    /// Standard deviation of the pixels summed into each event, written
    /// at the seed pixel.
    pub spread: Array2<f32>,
    /// Number of accepted photon events.
    pub events: usize,
}

/// Photon extraction result for a stack of frames.
#[derive(Debug, Clone)]
pub struct PhotonMapStack {
    /// Per-frame integrated event energy maps.
    pub energy: Array3<f32>,
    /// Per-frame event spread maps.
    pub spread: Array3<f32>,
    /// Total number of accepted photon events across the stack.
    pub events: usize,
}

/// Extracts single-photon events from one corrected frame.
///
/// The caller's frame is never mutated; clustering works on a private
/// copy. A frame with no candidate pixels is valid and yields all-zero
/// maps.
///
/// # Errors
///
/// [`fccd_core::Error::InvalidArgument`] when the configuration is out
/// of range (see [`PhotonCountConfig::validate`]).
pub fn photon_count(image: ArrayView2<'_, f32>, config: &PhotonCountConfig) -> Result<PhotonMap> {
    config.validate()?;
    Ok(count_frame(image, config))
}

/// Extracts single-photon events from every frame of a `(N, rows, cols)`
/// stack in parallel.
///
/// Frames are independent, so the result is bit-identical to calling
/// [`photon_count`] on each frame in turn.
///
/// # Errors
///
/// [`fccd_core::Error::InvalidArgument`] when the configuration is out
/// of range.
pub fn photon_count_stack(
    stack: ArrayView3<'_, f32>,
    config: &PhotonCountConfig,
) -> Result<PhotonMapStack> {
    config.validate()?;
    let (nframes, rows, cols) = stack.dim();

    let frames: Vec<ArrayView2<'_, f32>> = stack.outer_iter().collect();
    let maps: Vec<PhotonMap> = frames
        .into_par_iter()
        .map(|frame| count_frame(frame, config))
        .collect();

    let mut energy = Array3::<f32>::zeros((nframes, rows, cols));
    let mut spread = Array3::<f32>::zeros((nframes, rows, cols));
    let mut events = 0;
    for (k, map) in maps.into_iter().enumerate() {
        energy.index_axis_mut(ndarray::Axis(0), k).assign(&map.energy);
        spread.index_axis_mut(ndarray::Axis(0), k).assign(&map.spread);
        events += map.events;
    }
    debug!("extracted {events} photon events from {nframes} frames");

    Ok(PhotonMapStack {
        energy,
        spread,
        events,
    })
}

/// Sequential clustering kernel for one frame. Config is validated by
/// the callers.
fn count_frame(image: ArrayView2<'_, f32>, config: &PhotonCountConfig) -> PhotonMap {
    let (rows, cols) = image.dim();
    let mut energy = Array2::<f32>::zeros((rows, cols));
    let mut spread = Array2::<f32>::zeros((rows, cols));

    let (low, high) = config.threshold;
    // Candidates come from the pristine frame, in row-major order; the
    // scan order decides which of two overlapping clusters claims its
    // pixels first.
    let candidates: Vec<(usize, usize)> = image
        .indexed_iter()
        .filter(|&(_, &v)| v > low && v < high)
        .map(|(idx, _)| idx)
        .collect();

    if candidates.is_empty() {
        info!("no bright pixels in frame, returning empty maps");
        return PhotonMap {
            energy,
            spread,
            events: 0,
        };
    }
    debug!("{} candidate bright pixels", candidates.len());

    let adu = config.expected_adu();
    let accept_low = adu * (1.0 - config.acceptance_window);
    let accept_high = adu * (1.0 + config.acceptance_window);
    let reach = config.grid_size / 2;

    let mut work = image.to_owned();
    let mut neighborhood: Vec<((usize, usize), f32)> = Vec::with_capacity(9);
    let mut events = 0;

    for (row, col) in candidates {
        // Seed search window, clipped at the frame borders.
        let r0 = row.saturating_sub(reach);
        let r1 = (row + reach + 1).min(rows);
        let c0 = col.saturating_sub(reach);
        let c1 = (col + reach + 1).min(cols);

        // Brightest pixel wins; first in row-major order on ties.
        let mut seed = (r0, c0);
        let mut brightest = f32::NEG_INFINITY;
        for r in r0..r1 {
            for c in c0..c1 {
                let v = work[[r, c]];
                if v > brightest {
                    brightest = v;
                    seed = (r, c);
                }
            }
        }

        // Fixed 3x3 neighborhood around the seed, clipped at borders.
        let sr0 = seed.0.saturating_sub(1);
        let sr1 = (seed.0 + 2).min(rows);
        let sc0 = seed.1.saturating_sub(1);
        let sc1 = (seed.1 + 2).min(cols);
        neighborhood.clear();
        for r in sr0..sr1 {
            for c in sc0..sc1 {
                neighborhood.push(((r, c), work[[r, c]]));
            }
        }

        // Brightest first, NaN last; stable sort keeps row-major order
        // on ties.
        neighborhood.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
            (false, false) => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => Ordering::Equal,
        });
        let take = config.n_pixels_sum.min(neighborhood.len());
        let top = &neighborhood[..take];

        let sum: f32 = top.iter().map(|&(_, v)| v).sum();
        let accepted = sum > accept_low && sum < accept_high;
        if !accepted {
            continue;
        }

        let mean = sum / take as f32;
        let std = (top.iter().map(|&(_, v)| (v - mean) * (v - mean)).sum::<f32>()
            / take as f32)
            .sqrt();
        if let Some((filter_low, filter_high)) = config.spread_filter {
            if std < filter_low || std >= filter_high {
                continue;
            }
        }

        energy[[seed.0, seed.1]] = sum;
        spread[[seed.0, seed.1]] = std;
        // Claim the contributing pixels so they cannot feed another
        // cluster.
        for &((r, c), _) in top {
            work[[r, c]] = 0.0;
        }
        events += 1;
    }

    debug!("accepted {events} photon events");
    PhotonMap {
        energy,
        spread,
        events,
    }
}
