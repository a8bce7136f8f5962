//! fccd-photon: Single-photon event extraction for FastCCD frames.
//!
//! Sparse scattering images at low flux resolve individual photons as
//! small charge clouds spread over a few pixels. This crate finds those
//! clusters on corrected frames, integrates their charge, and accepts
//! them as single-photon events by matching the integrated signal
//! against the expected per-photon ADU value.
//!
//! See [`photon_count`] for the per-frame algorithm and
//! [`photon_count_stack`] for the frame-parallel version.

pub mod config;
pub mod count;

pub use config::PhotonCountConfig;
pub use count::{photon_count, photon_count_stack, PhotonMap, PhotonMapStack};

// Re-export core types for convenience
pub use fccd_core::{Error, Result};
