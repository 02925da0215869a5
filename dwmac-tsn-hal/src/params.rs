//! Gate control list parameters, captured once from the hardware feature registers.
use arbitrary_int::{u2, u3};
use dwmac_tsn::mac::{GclDepth, GclWidth};

use crate::variant::HwFeatures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("EST not supported by hardware")]
    EstUnsupported,
    #[error("invalid GCL depth code {0}")]
    InvalidDepth(u3),
    #[error("invalid GCL width code {0}")]
    InvalidWidth(u2),
    #[error("invalid residual receive queue {0}")]
    InvalidResidualQueue(u8),
}

/// Derived gate control list limits of one MAC instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GclParams {
    depth: usize,
    width: GclWidth,
}

impl GclParams {
    pub const fn new(depth: GclDepth, width: GclWidth) -> Self {
        Self {
            depth: depth.entries(),
            width,
        }
    }

    pub fn from_hw_features(features: &HwFeatures) -> Result<Self, ParamError> {
        if !features.est {
            return Err(ParamError::EstUnsupported);
        }
        let depth = features.gcl_depth.map_err(ParamError::InvalidDepth)?;
        let width = features.gcl_width.map_err(ParamError::InvalidWidth)?;
        Ok(Self::new(depth, width))
    }

    /// Maximum number of list entries.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub const fn width(&self) -> GclWidth {
        self.width
    }

    /// Number of bits available for the time interval of one entry.
    #[inline]
    pub const fn interval_bits(&self) -> u32 {
        self.width.interval_bits()
    }

    /// Mask of the time interval part of one entry word.
    #[inline]
    pub const fn interval_mask(&self) -> u32 {
        (1 << self.interval_bits()) - 1
    }

    /// Largest valid entry word.
    #[inline]
    pub const fn word_max(&self) -> u32 {
        match self.width.word_bits() {
            32 => u32::MAX,
            bits => (1 << bits) - 1,
        }
    }

    /// Pack gate states and time interval into one entry word.
    #[inline]
    pub const fn pack(&self, gate_states: u8, interval: u32) -> u32 {
        ((gate_states as u32) << self.interval_bits()) | (interval & self.interval_mask())
    }

    /// Split one entry word into gate states and time interval.
    #[inline]
    pub const fn unpack(&self, word: u32) -> (u8, u32) {
        (
            (word >> self.interval_bits()) as u8,
            word & self.interval_mask(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_per_width() {
        let p24 = GclParams::new(GclDepth::Entries64, GclWidth::Bits24);
        assert_eq!(p24.interval_mask(), 0xFFFF);
        assert_eq!(p24.word_max(), 0xFF_FFFF);
        let p28 = GclParams::new(GclDepth::Entries64, GclWidth::Bits28);
        assert_eq!(p28.interval_mask(), 0xF_FFFF);
        assert_eq!(p28.word_max(), 0xFFF_FFFF);
        let p32 = GclParams::new(GclDepth::Entries1024, GclWidth::Bits32);
        assert_eq!(p32.interval_mask(), 0xFF_FFFF);
        assert_eq!(p32.word_max(), u32::MAX);
        assert_eq!(p32.depth(), 1024);
    }

    #[test]
    fn pack_and_unpack() {
        let params = GclParams::new(GclDepth::Entries64, GclWidth::Bits28);
        let word = params.pack(0xA5, 0x1_2345);
        assert_eq!(word, 0x0A51_2345);
        assert_eq!(params.unpack(word), (0xA5, 0x1_2345));
    }

    #[test]
    fn invalid_feature_codes() {
        let features = HwFeatures {
            est: true,
            fpe: false,
            gcl_depth: Err(u3::new(7)),
            gcl_width: Ok(GclWidth::Bits24),
        };
        assert_eq!(
            GclParams::from_hw_features(&features),
            Err(ParamError::InvalidDepth(u3::new(7)))
        );
        let features = HwFeatures {
            gcl_depth: Ok(GclDepth::Entries64),
            gcl_width: Err(u2::new(0)),
            ..features
        };
        assert_eq!(
            GclParams::from_hw_features(&features),
            Err(ParamError::InvalidWidth(u2::new(0)))
        );
        let features = HwFeatures {
            est: false,
            ..features
        };
        assert_eq!(
            GclParams::from_hw_features(&features),
            Err(ParamError::EstUnsupported)
        );
    }
}
