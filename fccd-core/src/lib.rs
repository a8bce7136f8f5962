//! fccd-core: Core types and raw-sample decoding for FastCCD detector
//! data processing.
//!
//! This crate provides the error taxonomy shared by the correction and
//! photon-counting crates, and the bit-field decoder for the multi-gain
//! FastCCD ADC raw sample format.

pub mod error;
pub mod sample;

pub use error::{Error, Result};
pub use sample::{
    decode, DecodedSample, GainTier, BAD_PIXEL, DEFAULT_GAIN, GAIN_1, GAIN_2, GAIN_8, PIXEL_MASK,
};
