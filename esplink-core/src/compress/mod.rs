//! Compression engine — fits a raster image under the link's payload
//! budget by trading JPEG quality first and resolution second.
//!
//! ```text
//! RawImage ──► quality search (full size) ──► fits? ──► CompressedAsset
//!                        │ no
//!                        ▼
//!              scale search (quality held) ──────────► CompressedAsset
//! ```

pub mod asset;
pub mod budget;
pub mod engine;
pub mod preview;

pub use asset::{CompressedAsset, CompressionReport, RawImage};
pub use budget::CompressionBudget;
pub use engine::compress;
pub use preview::{PREVIEW_MAX_SIDE, preview};
