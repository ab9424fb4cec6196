//! Source and result types of the compression engine.

use std::path::Path;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use crate::error::ImageError;

// ── RawImage ─────────────────────────────────────────────────────

/// A decoded raster, plus the size of the buffer it was decoded from.
///
/// Immutable once constructed; the engine only ever reads it.
#[derive(Debug, Clone)]
pub struct RawImage {
    image: DynamicImage,
    source_len: usize,
}

impl RawImage {
    /// Decode any raster format the `image` crate recognises.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ImageError::Undecodable(e.to_string()))?;
        Self::from_dynamic(image, bytes.len())
    }

    /// Read and decode an image file.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Wrap an already decoded image. `source_len` is reported as the
    /// original size in compression results.
    pub fn from_dynamic(image: DynamicImage, source_len: usize) -> Result<Self, ImageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::DegenerateDimensions { width, height });
        }
        Ok(Self { image, source_len })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Size in bytes of the source buffer.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

// ── CompressedAsset ──────────────────────────────────────────────

/// The JPEG payload produced by one compression call.
///
/// Never mutated: a new compression produces a new asset.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedAsset {
    bytes: Bytes,
    quality: u8,
    scale_factor: f64,
    width: u32,
    height: u32,
}

impl CompressedAsset {
    pub(crate) fn new(bytes: Vec<u8>, quality: u8, scale_factor: f64, width: u32, height: u32) -> Self {
        Self {
            bytes: Bytes::from(bytes),
            quality,
            scale_factor,
            width,
            height,
        }
    }

    /// Build an asset from an already encoded payload, e.g. a JPEG that
    /// was produced elsewhere and only needs to be sent.
    pub fn from_encoded(bytes: impl Into<Bytes>, quality: u8) -> Self {
        Self {
            bytes: bytes.into(),
            quality,
            scale_factor: 1.0,
            width: 0,
            height: 0,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// JPEG quality of the final encode.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compounded resize factor, `1.0` when no resize was needed.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Encoded dimensions (zero for assets built with `from_encoded`).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Short blake3 fingerprint of the payload, used to tell uploads
    /// apart in logs.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.bytes);
        hash.to_hex().as_str()[..12].to_string()
    }
}

// ── CompressionReport ────────────────────────────────────────────

/// Summary of a successful compression, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub original_size_bytes: usize,
    pub compressed_size_bytes: usize,
    /// `original / compressed`, or `0.0` when the payload is empty.
    pub ratio: f64,
    pub quality: u8,
    pub scale_factor: f64,
    pub fingerprint: String,
}

impl CompressionReport {
    pub fn new(source: &RawImage, asset: &CompressedAsset) -> Self {
        let original = source.source_len();
        let compressed = asset.len();
        let ratio = if compressed > 0 {
            original as f64 / compressed as f64
        } else {
            0.0
        };
        Self {
            original_size_bytes: original,
            compressed_size_bytes: compressed,
            ratio,
            quality: asset.quality(),
            scale_factor: asset.scale_factor(),
            fingerprint: asset.fingerprint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    #[test]
    fn decode_png_keeps_source_len() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([9, 8, 7])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let raw = RawImage::decode(&png).unwrap();
        assert_eq!(raw.width(), 4);
        assert_eq!(raw.height(), 3);
        assert_eq!(raw.source_len(), png.len());
    }

    #[test]
    fn garbage_is_undecodable() {
        let err = RawImage::decode(b"definitely not a raster").unwrap_err();
        assert!(matches!(err, ImageError::Undecodable(_)));
    }

    #[test]
    fn zero_sized_image_is_degenerate() {
        let err = RawImage::from_dynamic(DynamicImage::new_rgb8(0, 5), 0).unwrap_err();
        assert!(matches!(
            err,
            ImageError::DegenerateDimensions { width: 0, height: 5 }
        ));
    }

    #[test]
    fn report_ratio() {
        let raw = RawImage::from_dynamic(DynamicImage::new_rgb8(2, 2), 4000).unwrap();
        let asset = CompressedAsset::new(vec![0u8; 1000], 80, 1.0, 2, 2);
        let report = CompressionReport::new(&raw, &asset);
        assert_eq!(report.compressed_size_bytes, 1000);
        assert!((report.ratio - 4.0).abs() < f64::EPSILON);
        assert_eq!(report.quality, 80);
        assert_eq!(report.fingerprint.len(), 12);

        let empty = CompressedAsset::from_encoded(Vec::new(), 50);
        assert_eq!(CompressionReport::new(&raw, &empty).ratio, 0.0);
    }
}
