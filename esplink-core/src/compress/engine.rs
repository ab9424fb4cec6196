//! Quality-then-scale JPEG search.
//!
//! The engine first lowers JPEG quality on the full-resolution image,
//! then, holding the last quality fixed, shrinks the original by a
//! compounding factor until the payload fits. The budget is best-effort:
//! a high-entropy source can still exceed it once both floors are hit.

use image::imageops::{self, FilterType};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::compress::asset::{CompressedAsset, RawImage};
use crate::compress::budget::CompressionBudget;
use crate::error::ImageError;

/// Result of the search, independent of how attempts were encoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchOutcome {
    pub bytes: Vec<u8>,
    pub quality: u8,
    pub scale_factor: f64,
}

/// Compress `image` to a JPEG at or under `budget.max_bytes` when the
/// floors allow it.
pub fn compress(image: &RawImage, budget: &CompressionBudget) -> Result<CompressedAsset, ImageError> {
    budget.validate()?;

    let rgb = image.as_dynamic().to_rgb8();
    let (width, height) = rgb.dimensions();

    let outcome = search(budget, |quality, scale| {
        if scale >= 1.0 {
            encode_jpeg(&rgb, quality)
        } else {
            let (w, h) = scaled_dimensions(width, height, scale);
            let resized = imageops::resize(&rgb, w, h, FilterType::Lanczos3);
            encode_jpeg(&resized, quality)
        }
    })?;

    let (w, h) = if outcome.scale_factor >= 1.0 {
        (width, height)
    } else {
        scaled_dimensions(width, height, outcome.scale_factor)
    };

    debug!(
        size = outcome.bytes.len(),
        quality = outcome.quality,
        scale = outcome.scale_factor,
        "compression finished"
    );

    Ok(CompressedAsset::new(
        outcome.bytes,
        outcome.quality,
        outcome.scale_factor,
        w,
        h,
    ))
}

/// Run the two search phases, calling `encode(quality, scale)` for each
/// attempt. Scale `1.0` means the original resolution.
pub(crate) fn search<F>(budget: &CompressionBudget, mut encode: F) -> Result<SearchOutcome, ImageError>
where
    F: FnMut(u8, f64) -> Result<Vec<u8>, ImageError>,
{
    let mut quality = budget.initial_quality;
    let mut output = Vec::new();
    let mut fits = false;

    // Phase 1: quality at full resolution.
    while quality > budget.min_quality {
        output = encode(quality, 1.0)?;
        debug!(quality, size = output.len(), "quality attempt");
        if output.len() <= budget.max_bytes {
            fits = true;
            break;
        }
        quality = quality.saturating_sub(budget.quality_step);
    }

    // Phase 2: resize the original, quality held.
    let mut scale_factor = 1.0;
    while !fits && scale_factor > budget.min_scale {
        scale_factor *= budget.scale_step;
        output = encode(quality, scale_factor)?;
        debug!(quality, scale = scale_factor, size = output.len(), "scale attempt");
        fits = output.len() <= budget.max_bytes;
    }

    Ok(SearchOutcome {
        bytes: output,
        quality,
        scale_factor,
    })
}

/// Truncating resize arithmetic, never below one pixel.
pub(crate) fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    (w, h)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode_image(rgb)
            .map_err(|e| ImageError::Encode(e.to_string()))?;
    }
    Ok(out)
}
