//! Photon extraction on corrected frames, end to end.

use approx::assert_abs_diff_eq;
use fccd_core::{DEFAULT_GAIN, GAIN_8};
use fccd_image::correct_images;
use fccd_photon::{photon_count, photon_count_stack, PhotonCountConfig};
use ndarray::{Array2, Array3};

fn config() -> PhotonCountConfig {
    // Expected cluster signal of 20 ADU, acceptance window (17, 23).
    PhotonCountConfig::new()
        .with_threshold(5.0, 13.0)
        .with_photon_energy(500.0)
        .with_energy_per_adu(25.0)
        .with_n_pixels_sum(3)
}

#[test]
fn photons_extracted_from_corrected_raw_frame() {
    // Raw gain-x8 frame carrying one photon cluster; correction with no
    // references passes intensities through unchanged.
    let mut raw = Array2::<u16>::from_elem((6, 6), GAIN_8);
    raw[[3, 3]] = GAIN_8 | 10;
    raw[[3, 4]] = GAIN_8 | 6;
    raw[[4, 3]] = GAIN_8 | 4;
    let corrected = correct_images(raw.view(), None, None, DEFAULT_GAIN).unwrap();

    let map = photon_count(corrected.view(), &config()).unwrap();
    assert_eq!(map.events, 1);
    assert_abs_diff_eq!(map.energy[[3, 3]], 20.0);
    assert_abs_diff_eq!(map.energy.sum(), 20.0);
}

#[test]
fn bad_pixels_do_not_form_photons() {
    // The flagged pixel corrects to NaN and must not seed or join a
    // cluster; the frame holds no other signal.
    let mut raw = Array2::<u16>::from_elem((6, 6), GAIN_8);
    raw[[2, 2]] = 0x2000 | 10;
    let corrected = correct_images(raw.view(), None, None, DEFAULT_GAIN).unwrap();
    assert!(corrected[[2, 2]].is_nan());

    let map = photon_count(corrected.view(), &config()).unwrap();
    assert_eq!(map.events, 0);
}

#[test]
fn stack_extraction_is_deterministic() {
    // Dense synthetic stack with overlapping clusters; repeated runs
    // must agree bit for bit despite frame-parallel execution.
    let stack = Array3::from_shape_fn((6, 16, 16), |(k, r, c)| {
        let v = ((r * 7 + c * 11 + k * 3) % 15) as f32;
        if v > 4.0 {
            v
        } else {
            0.0
        }
    });
    let config = config();
    let a = photon_count_stack(stack.view(), &config).unwrap();
    let b = photon_count_stack(stack.view(), &config).unwrap();
    assert_eq!(a.events, b.events);
    for (x, y) in a.energy.iter().zip(b.energy.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    for (x, y) in a.spread.iter().zip(b.spread.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[test]
fn two_separated_photons_in_one_frame() {
    let mut frame = Array2::<f32>::zeros((12, 12));
    // Cluster A around (2, 2).
    frame[[2, 2]] = 10.0;
    frame[[2, 3]] = 6.0;
    frame[[3, 2]] = 4.0;
    // Cluster B around (8, 8).
    frame[[8, 8]] = 9.0;
    frame[[8, 9]] = 7.0;
    frame[[9, 8]] = 4.0;
    let map = photon_count(frame.view(), &config()).unwrap();
    assert_eq!(map.events, 2);
    assert_abs_diff_eq!(map.energy[[2, 2]], 20.0);
    assert_abs_diff_eq!(map.energy[[8, 8]], 20.0);
}
