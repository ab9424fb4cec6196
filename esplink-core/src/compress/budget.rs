//! Size budget and search constants for the compression engine.

use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Limits that drive the quality-then-scale search.
///
/// The defaults leave headroom under the 20 KiB receive buffer of the
/// peer firmware. Both floors are exclusive: the quality search stops
/// once quality would reach `min_quality`, the scale search once the
/// compounded factor reaches `min_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionBudget {
    /// Target upper bound for the encoded payload, in bytes.
    pub max_bytes: usize,
    /// JPEG quality of the first attempt.
    pub initial_quality: u8,
    /// Quality decrement between attempts.
    pub quality_step: u8,
    /// Exclusive quality floor.
    pub min_quality: u8,
    /// Multiplier applied to the scale factor on each resize attempt.
    pub scale_step: f64,
    /// Exclusive scale floor.
    pub min_scale: f64,
}

impl CompressionBudget {
    pub const MAX_BYTES: usize = 19 * 1024;
    pub const INITIAL_QUALITY: u8 = 95;
    pub const QUALITY_STEP: u8 = 5;
    pub const MIN_QUALITY: u8 = 5;
    pub const SCALE_STEP: f64 = 0.9;
    pub const MIN_SCALE: f64 = 0.1;

    /// Reject budgets that would never terminate or never encode.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.quality_step == 0 {
            return Err(ImageError::InvalidBudget("quality_step must be non-zero"));
        }
        if self.initial_quality == 0 || self.initial_quality > 100 {
            return Err(ImageError::InvalidBudget("initial_quality must be in 1..=100"));
        }
        if !(self.scale_step > 0.0 && self.scale_step < 1.0) {
            return Err(ImageError::InvalidBudget("scale_step must be in (0, 1)"));
        }
        if !(self.min_scale > 0.0 && self.min_scale < 1.0) {
            return Err(ImageError::InvalidBudget("min_scale must be in (0, 1)"));
        }
        Ok(())
    }
}

impl Default for CompressionBudget {
    fn default() -> Self {
        Self {
            max_bytes: Self::MAX_BYTES,
            initial_quality: Self::INITIAL_QUALITY,
            quality_step: Self::QUALITY_STEP,
            min_quality: Self::MIN_QUALITY,
            scale_step: Self::SCALE_STEP,
            min_scale: Self::MIN_SCALE,
        }
    }
}
