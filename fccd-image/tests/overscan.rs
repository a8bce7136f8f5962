//! Overscan round-trip: dropping the overscan columns and re-inserting
//! the extracted reference values must reconstruct the original stack.

use approx::assert_abs_diff_eq;
use fccd_image::{drop_overscan, extract_overscan, subtract_overscan, OverscanLayout};
use ndarray::Array4;

/// 1 overscan + 2 data columns, two super-columns per half.
fn layout() -> OverscanLayout {
    OverscanLayout::new().with_os_cols(1).with_data_cols(2)
}

/// Stack with a unique value per (row, column) cell.
fn stack() -> Array4<f32> {
    Array4::from_shape_fn((2, 3, 4, 12), |(p, f, r, c)| {
        (p * 10000 + f * 1000 + r * 100 + c) as f32
    })
}

/// Maps a stored column index to (readout index within its half, is_left).
fn readout_index(col: usize, total_cols: usize) -> (usize, bool) {
    let half = total_cols / 2;
    if col < half {
        (half - 1 - col, true)
    } else {
        (col - half, false)
    }
}

#[test]
fn drop_and_extract_reconstruct_the_original() {
    let layout = layout();
    let images = stack();
    let dropped = drop_overscan(images.view().into_dyn(), &layout).unwrap();
    let reference = extract_overscan(images.view().into_dyn(), &layout).unwrap();
    assert_eq!(dropped.shape(), &[2, 3, 4, 8]);
    assert_eq!(reference.shape(), &[2, 3, 4, 8]);

    let (points, frames, rows, cols) = images.dim();
    let period = layout.period();
    let data_half = dropped.shape()[3] / 2;

    // Rebuild every stored column from the two outputs. With os_cols = 1
    // the broadcast reference value IS the overscan column value.
    for p in 0..points {
        for f in 0..frames {
            for r in 0..rows {
                for c in 0..cols {
                    let (rc, is_left) = readout_index(c, cols);
                    let sc = rc / period;
                    let offset = rc % period;
                    let reconstructed = if offset < layout.os_cols {
                        // Overscan column: read the broadcast reference of
                        // this super-column (any of its data columns).
                        let data_rc = sc * layout.data_cols;
                        let out_col = if is_left {
                            data_half - 1 - data_rc
                        } else {
                            data_half + data_rc
                        };
                        reference[[p, f, r, out_col]]
                    } else {
                        // Data column: read it back out of the dropped stack.
                        let data_rc = sc * layout.data_cols + (offset - layout.os_cols);
                        let out_col = if is_left {
                            data_half - 1 - data_rc
                        } else {
                            data_half + data_rc
                        };
                        dropped[[p, f, r, out_col]]
                    };
                    assert_abs_diff_eq!(reconstructed, images[[p, f, r, c]]);
                }
            }
        }
    }
}

#[test]
fn subtract_matches_drop_minus_extract() {
    let layout = layout();
    let images = stack();
    let combined = subtract_overscan(images.view().into_dyn(), &layout).unwrap();
    let by_hand = drop_overscan(images.view().into_dyn(), &layout).unwrap()
        - extract_overscan(images.view().into_dyn(), &layout).unwrap();
    assert_eq!(combined, by_hand);
}

#[test]
fn constant_overscan_subtracts_cleanly() {
    // Data columns hold 50, overscan columns hold 8: the corrected
    // result is uniformly 42.
    let layout = OverscanLayout::new();
    let period = layout.period();
    let images = Array4::from_shape_fn((1, 2, 3, 2 * period * 2), |(_, _, _, c)| {
        let (rc, _) = readout_index(c, 2 * period * 2);
        if rc % period < layout.os_cols {
            8.0
        } else {
            50.0
        }
    });
    let corrected = subtract_overscan(images.view().into_dyn(), &layout).unwrap();
    assert_eq!(corrected.shape(), &[1, 2, 3, 40]);
    for &v in &corrected {
        assert_abs_diff_eq!(v, 42.0);
    }
}
