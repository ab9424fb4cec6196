//! Image upload framing.
//!
//! # Wire Protocol
//!
//! ```text
//! Host ──[ "image:upload\n" ]──────────────► Peer   (command line)
//!        ... settle delay ...
//! Host ──[ size: u16 LE ]──────────────────► Peer   (2 bytes)
//! Host ──[ payload[0..64] ]────────────────► Peer   (repeated,
//! Host ──[ payload[64..128] ]──────────────► Peer    paced)
//! ```
//!
//! Chunks carry no framing of their own; the peer counts bytes against
//! the size header to find the end of the payload.

use bytes::Bytes;

use crate::compress::CompressedAsset;
use crate::error::LinkError;

/// Command line that switches the peer into receive mode.
pub const UPLOAD_COMMAND: &[u8] = b"image:upload\n";

/// Default write size for payload chunks, and the largest write the
/// peer's receive buffer accepts.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Largest payload the 2-byte size header can describe.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// A fully framed image upload, ready for the link.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    /// `image:upload\n`, sent first and on its own.
    pub command: Bytes,
    /// Little-endian payload length.
    pub size_header: [u8; 2],
    /// Payload split into write-sized pieces, in order.
    pub chunks: Vec<Bytes>,
}

impl ImageUpload {
    /// Frame `asset` with the default 64-byte chunk size.
    pub fn new(asset: &CompressedAsset) -> Result<Self, LinkError> {
        Self::with_chunk_size(asset, DEFAULT_CHUNK_SIZE)
    }

    /// Frame `asset`, splitting the payload into `chunk_size` pieces.
    ///
    /// `chunk_size` must lie in `1..=DEFAULT_CHUNK_SIZE`. Fails with
    /// `SizeOverflow` before anything is produced when the payload does
    /// not fit the size header.
    pub fn with_chunk_size(asset: &CompressedAsset, chunk_size: usize) -> Result<Self, LinkError> {
        check_chunk_size(chunk_size)?;
        let payload = asset.bytes();
        let size_header = encode_size_header(payload.len())?;

        let chunks = (0..payload.len())
            .step_by(chunk_size)
            .map(|start| payload.slice(start..(start + chunk_size).min(payload.len())))
            .collect();

        Ok(Self {
            command: Bytes::from_static(UPLOAD_COMMAND),
            size_header,
            chunks,
        })
    }

    /// Total payload bytes (excluding command and header).
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Number of payload writes.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Reject chunk sizes the peer cannot receive in one write.
pub fn check_chunk_size(chunk_size: usize) -> Result<(), LinkError> {
    if chunk_size == 0 || chunk_size > DEFAULT_CHUNK_SIZE {
        return Err(LinkError::Config(format!(
            "chunk size must be between 1 and {DEFAULT_CHUNK_SIZE}, got {chunk_size}"
        )));
    }
    Ok(())
}

/// Encode a payload length as the 2-byte little-endian size header.
pub fn encode_size_header(len: usize) -> Result<[u8; 2], LinkError> {
    let size = u16::try_from(len).map_err(|_| LinkError::SizeOverflow {
        size: len,
        max: MAX_PAYLOAD_SIZE,
    })?;
    Ok(size.to_le_bytes())
}

/// Decode a 2-byte size header, as the peer does.
pub fn decode_size_header(header: [u8; 2]) -> usize {
    u16::from_le_bytes(header) as usize
}

/// Number of chunks a payload of `len` bytes is split into.
pub fn compute_total_chunks(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(len: usize) -> CompressedAsset {
        let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        CompressedAsset::from_encoded(bytes, 80)
    }

    #[test]
    fn five_thousand_bytes_make_79_chunks() {
        let upload = ImageUpload::new(&asset(5000)).unwrap();
        assert_eq!(upload.chunk_count(), 79);
        assert_eq!(upload.chunks.last().unwrap().len(), 5000 - 78 * 64);
        assert!(upload.chunks[..78].iter().all(|c| c.len() == 64));
    }

    #[test]
    fn chunks_partition_the_payload() {
        let a = asset(1000);
        let upload = ImageUpload::new(&a).unwrap();
        let joined: Vec<u8> = upload.chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(&joined[..], &a.bytes()[..]);
        assert_eq!(upload.total_bytes(), 1000);
    }

    #[test]
    fn size_header_is_little_endian() {
        let upload = ImageUpload::new(&asset(0x1234)).unwrap();
        assert_eq!(upload.size_header, [0x34, 0x12]);
        assert_eq!(decode_size_header(upload.size_header), 0x1234);
        assert_eq!(&upload.command[..], b"image:upload\n");
    }

    #[test]
    fn size_header_boundaries() {
        assert_eq!(encode_size_header(0).unwrap(), [0, 0]);
        assert_eq!(encode_size_header(65_535).unwrap(), [0xFF, 0xFF]);
        assert!(matches!(
            encode_size_header(65_536),
            Err(LinkError::SizeOverflow { size: 65_536, max: 65_535 })
        ));
    }

    #[test]
    fn oversized_asset_is_rejected() {
        let err = ImageUpload::new(&asset(70_000)).unwrap_err();
        assert!(matches!(err, LinkError::SizeOverflow { .. }));
    }

    #[test]
    fn empty_asset_has_no_chunks() {
        let upload = ImageUpload::new(&asset(0)).unwrap();
        assert_eq!(upload.chunk_count(), 0);
        assert_eq!(upload.size_header, [0, 0]);
    }

    #[test]
    fn chunk_size_is_bounded_by_peer_buffer() {
        let a = asset(5000);
        assert!(matches!(
            ImageUpload::with_chunk_size(&a, 0),
            Err(LinkError::Config(_))
        ));
        assert!(matches!(
            ImageUpload::with_chunk_size(&a, 4096),
            Err(LinkError::Config(_))
        ));

        let upload = ImageUpload::with_chunk_size(&a, 32).unwrap();
        assert_eq!(upload.chunk_count(), 157);
        assert!(upload.chunks.iter().all(|c| c.len() <= 32));
        assert_eq!(ImageUpload::with_chunk_size(&a, 64).unwrap().chunk_count(), 79);
    }

    #[test]
    fn total_chunks() {
        assert_eq!(compute_total_chunks(0, 64), 0);
        assert_eq!(compute_total_chunks(64, 64), 1);
        assert_eq!(compute_total_chunks(65, 64), 2);
        assert_eq!(compute_total_chunks(5000, 64), 79);
    }
}
