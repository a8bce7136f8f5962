//! Raw-sample bit-field decoding for the multi-gain FastCCD ADC.
//!
//! Each 16-bit sample packs three fields (MSB to LSB):
//!
//! | bits  | field                                            |
//! |-------|--------------------------------------------------|
//! | 15-14 | gain-tier selector (`11` = x1, `10` = x2, `00` = x8) |
//! | 13    | bad-pixel / packet-drop flag                     |
//! | 12-0  | intensity value                                  |
//!
//! The x1 tier is the *least* sensitive analog setting, so it takes the
//! largest dark/gain slot; x8 is the most sensitive and takes slot 0.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tier-select bit pattern for gain x1 (bits 15-14 = `11`).
pub const GAIN_1: u16 = 0xC000;
/// Tier-select bit pattern for gain x2 (bits 15-14 = `10`).
pub const GAIN_2: u16 = 0x8000;
/// Tier-select bit pattern for gain x8 (bits 15-14 = `00`).
pub const GAIN_8: u16 = 0x0000;
/// Bad-pixel / packet-drop flag (bit 13).
pub const BAD_PIXEL: u16 = 0x2000;
/// Mask for the 13-bit intensity value.
pub const PIXEL_MASK: u16 = 0x1FFF;

/// Default gain multipliers, indexed by [`GainTier::dark_index`]:
/// x8 -> 1, x2 -> 4, x1 -> 8.
pub const DEFAULT_GAIN: [f32; 3] = [1.0, 4.0, 8.0];

/// Analog gain setting selected per pixel by the readout electronics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GainTier {
    /// Gain x1, least sensitive (tier bits `11`).
    X1,
    /// Gain x2 (tier bits `10`).
    X2,
    /// Gain x8, most sensitive (tier bits `00`).
    X8,
}

impl GainTier {
    /// Classifies a raw sample's gain tier from its top two bits.
    ///
    /// Precedence is x1 > x2 > x8, matching the historical correction
    /// code: a sample only classifies as x2 when bit 15 is set and
    /// bit 14 is clear.
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        if raw & GAIN_1 == GAIN_1 {
            GainTier::X1
        } else if raw & GAIN_2 == GAIN_2 {
            GainTier::X2
        } else {
            GainTier::X8
        }
    }

    /// Index of this tier in a dark-reference stack or gain table.
    ///
    /// Slot 0 holds the x8 (most sensitive) reference and slot 2 the
    /// x1 (least sensitive) reference.
    #[inline]
    pub fn dark_index(self) -> usize {
        match self {
            GainTier::X8 => 0,
            GainTier::X2 => 1,
            GainTier::X1 => 2,
        }
    }
}

/// A fully decoded raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecodedSample {
    /// Gain tier selected for this pixel.
    pub tier: GainTier,
    /// True when the bad-pixel / packet-drop flag is set.
    pub bad: bool,
    /// 13-bit intensity value in ADU.
    pub intensity: u16,
}

/// Decodes one raw 16-bit sample into tier, bad-pixel flag, and intensity.
///
/// Every 16-bit input has a defined classification. The bad-pixel flag
/// (`0x2000`) is tested before tier classification: firmware documentation
/// is inconsistent about whether the flag can coincide with the x2 tier
/// pattern, so flagged samples are treated as invalid regardless of tier.
#[inline]
pub fn decode(raw: u16) -> DecodedSample {
    DecodedSample {
        tier: GainTier::from_raw(raw),
        bad: raw & BAD_PIXEL == BAD_PIXEL,
        intensity: raw & PIXEL_MASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gain_1() {
        let s = decode(0xC030);
        assert_eq!(s.tier, GainTier::X1);
        assert!(!s.bad);
        assert_eq!(s.intensity, 0x0030);
    }

    #[test]
    fn test_decode_gain_2() {
        let s = decode(0x8020);
        assert_eq!(s.tier, GainTier::X2);
        assert!(!s.bad);
        assert_eq!(s.intensity, 0x0020);
    }

    #[test]
    fn test_decode_gain_8() {
        let s = decode(0x0010);
        assert_eq!(s.tier, GainTier::X8);
        assert!(!s.bad);
        assert_eq!(s.intensity, 0x0010);
    }

    #[test]
    fn test_decode_bad_pixel() {
        let s = decode(0x2005);
        assert!(s.bad);
        assert_eq!(s.intensity, 0x0005);
    }

    #[test]
    fn test_bad_pixel_flag_with_gain_bits() {
        // Flag can coincide with any tier pattern; the flag wins.
        for raw in [0x2000u16, 0xA000, 0xE000] {
            assert!(decode(raw).bad, "raw {raw:#06x} should be flagged");
        }
    }

    #[test]
    fn test_intensity_saturates_at_13_bits() {
        let s = decode(0xFFFF);
        assert_eq!(s.intensity, 0x1FFF);
        assert_eq!(s.tier, GainTier::X1);
        assert!(s.bad);
    }

    #[test]
    fn test_dark_index_ordering() {
        // Most sensitive tier first, matching the dark stack layout.
        assert_eq!(GainTier::X8.dark_index(), 0);
        assert_eq!(GainTier::X2.dark_index(), 1);
        assert_eq!(GainTier::X1.dark_index(), 2);
    }

    #[test]
    fn test_tiers_cover_all_inputs() {
        // The three tiers partition the tier-select field.
        for top in 0..4u16 {
            let raw = top << 14;
            let tier = GainTier::from_raw(raw);
            match top {
                0b11 => assert_eq!(tier, GainTier::X1),
                0b10 => assert_eq!(tier, GainTier::X2),
                _ => assert_eq!(tier, GainTier::X8),
            }
        }
    }
}
