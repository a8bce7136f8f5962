//! fccd-image: Correction pipeline for multi-gain FastCCD frames.
//!
//! This crate turns raw detector readings into calibrated intensity:
//!
//! 1. [`correct::correct_images`] - decode, dark-subtract, gain- and
//!    flat-field-correct each frame (bad pixels become NaN)
//! 2. [`overscan`] - strip or subtract the interleaved overscan
//!    reference columns
//! 3. [`transform::rotate90`] - reorient stacks to the canonical
//!    detector-facing orientation
//! 4. [`stack`] - NaN-aware statistics over reference and data stacks
//!
//! Every operation is a pure function over in-memory arrays: inputs are
//! never mutated, outputs are freshly allocated, and repeated calls give
//! bit-identical results even though frames are processed in parallel.

pub mod correct;
pub mod overscan;
pub mod stack;
pub mod transform;

pub use correct::correct_images;
pub use overscan::{drop_overscan, extract_overscan, subtract_overscan, OverscanLayout};
pub use stack::{stack_process, stack_process_norm, stackmean, stacksum, StackOp};
pub use transform::{rotate90, RotationSense};

// Re-export core types for convenience
pub use fccd_core::{Error, Result};
