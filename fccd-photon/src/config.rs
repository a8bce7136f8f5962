//! Configuration for single-photon cluster extraction.

use fccd_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tuning parameters for [`photon_count`](crate::photon_count).
///
/// The defaults match the historical CSX operating point: 931 eV
/// photons, 25 eV per ADU, a 3x3 candidate search grid, and summing the
/// 5 brightest pixels of the seed neighborhood.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhotonCountConfig {
    /// Candidate bright-pixel window `(low, high)` in ADU; a pixel is a
    /// cluster candidate when strictly inside this window.
    pub threshold: (f32, f32),
    /// Incident photon energy in eV.
    pub photon_energy: f32,
    /// Detector conversion factor in eV per ADU.
    pub energy_per_adu: f32,
    /// Side length of the square window searched for the cluster seed
    /// around each candidate. Must be odd.
    pub grid_size: usize,
    /// Number of brightest pixels of the 3x3 seed neighborhood summed
    /// into the event energy. At most 9.
    pub n_pixels_sum: usize,
    /// Relative half-width of the acceptance window: a cluster sum is a
    /// photon when within `expected_adu() * (1 +/- acceptance_window)`.
    pub acceptance_window: f32,
    /// Optional `[low, high)` filter on the standard deviation of the
    /// summed pixels; clusters outside it are discarded.
    pub spread_filter: Option<(f32, f32)>,
}

impl Default for PhotonCountConfig {
    fn default() -> Self {
        let adu = 931.0 / 25.0;
        Self {
            threshold: (0.5 * adu, adu),
            photon_energy: 931.0,
            energy_per_adu: 25.0,
            grid_size: 3,
            n_pixels_sum: 5,
            acceptance_window: 0.15,
            spread_filter: None,
        }
    }
}

impl PhotonCountConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidate threshold window in ADU.
    pub fn with_threshold(mut self, low: f32, high: f32) -> Self {
        self.threshold = (low, high);
        self
    }

    /// Sets the incident photon energy in eV.
    pub fn with_photon_energy(mut self, energy: f32) -> Self {
        self.photon_energy = energy;
        self
    }

    /// Sets the conversion factor in eV per ADU.
    pub fn with_energy_per_adu(mut self, energy_per_adu: f32) -> Self {
        self.energy_per_adu = energy_per_adu;
        self
    }

    /// Sets the seed search grid size.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the number of pixels summed per cluster.
    pub fn with_n_pixels_sum(mut self, n_pixels_sum: usize) -> Self {
        self.n_pixels_sum = n_pixels_sum;
        self
    }

    /// Sets the relative acceptance half-width.
    pub fn with_acceptance_window(mut self, window: f32) -> Self {
        self.acceptance_window = window;
        self
    }

    /// Enables the cluster spread filter.
    pub fn with_spread_filter(mut self, low: f32, high: f32) -> Self {
        self.spread_filter = Some((low, high));
        self
    }

    /// Expected integrated cluster signal for one photon, in ADU.
    pub fn expected_adu(&self) -> f32 {
        self.photon_energy / self.energy_per_adu
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] naming the offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 || self.grid_size % 2 == 0 {
            return Err(Error::InvalidArgument(format!(
                "grid_size must be odd and positive, got {}",
                self.grid_size
            )));
        }
        if self.n_pixels_sum == 0 || self.n_pixels_sum > 9 {
            return Err(Error::InvalidArgument(format!(
                "n_pixels_sum must be between 1 and 9 (the seed window is 3x3), got {}",
                self.n_pixels_sum
            )));
        }
        let (low, high) = self.threshold;
        if low.is_nan() || high.is_nan() || low >= high {
            return Err(Error::InvalidArgument(format!(
                "threshold window is empty: ({low}, {high})"
            )));
        }
        if self.energy_per_adu.is_nan() || self.energy_per_adu <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "energy_per_adu must be positive, got {}",
                self.energy_per_adu
            )));
        }
        if self.acceptance_window.is_nan()
            || self.acceptance_window <= 0.0
            || self.acceptance_window >= 1.0
        {
            return Err(Error::InvalidArgument(format!(
                "acceptance_window must be in (0, 1), got {}",
                self.acceptance_window
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = PhotonCountConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.expected_adu(), 37.24, max_relative = 1e-4);
    }

    #[test]
    fn test_builder() {
        let config = PhotonCountConfig::new()
            .with_threshold(5.0, 13.0)
            .with_photon_energy(500.0)
            .with_energy_per_adu(25.0)
            .with_grid_size(5)
            .with_n_pixels_sum(3)
            .with_spread_filter(0.0, 10.0);
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.expected_adu(), 20.0);
        assert_eq!(config.grid_size, 5);
        assert_eq!(config.spread_filter, Some((0.0, 10.0)));
    }

    #[test]
    fn test_even_grid_rejected() {
        let config = PhotonCountConfig::new().with_grid_size(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_pixel_sum_rejected() {
        let config = PhotonCountConfig::new().with_n_pixels_sum(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_threshold_rejected() {
        let config = PhotonCountConfig::new().with_threshold(10.0, 10.0);
        assert!(config.validate().is_err());
    }
}
