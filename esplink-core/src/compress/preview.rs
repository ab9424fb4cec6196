//! Display-only thumbnail of the source image.

use image::imageops::FilterType;
use image::RgbaImage;

use crate::compress::asset::RawImage;

/// Default bound on the longest side of a preview.
pub const PREVIEW_MAX_SIDE: u32 = 300;

/// Produce a copy of `image` whose longest side is at most `max_side`,
/// keeping the aspect ratio. Images already inside the bound are copied
/// unchanged. The result owns its own pixel buffer.
pub fn preview(image: &RawImage, max_side: u32) -> RgbaImage {
    let source = image.as_dynamic();
    if image.width().max(image.height()) <= max_side {
        return source.to_rgba8();
    }
    source
        .resize(max_side, max_side, FilterType::Triangle)
        .to_rgba8()
}
