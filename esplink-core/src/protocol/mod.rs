//! Wire format for the two message kinds exchanged with the peer.
//!
//! Both directions are plain bytes on a serial line; there is no
//! envelope beyond what each kind defines here.

pub mod upload;
pub mod text;

use bytes::{BufMut, Bytes, BytesMut};

use crate::compress::CompressedAsset;
use crate::error::LinkError;

pub use upload::{
    DEFAULT_CHUNK_SIZE, ImageUpload, MAX_PAYLOAD_SIZE, UPLOAD_COMMAND, check_chunk_size,
    compute_total_chunks, decode_size_header, encode_size_header,
};
pub use text::{LINE_TERMINATOR, TEXT_PREFIX, decode_inbound_line, encode_text, strip_text_prefix};

/// One outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A chat line.
    Text { line: String },
    /// An image payload, preceded on the wire by its size header.
    Image { size_header: u16, payload: Bytes },
}

impl Frame {
    pub fn text(line: impl Into<String>) -> Self {
        Frame::Text { line: line.into() }
    }

    /// Build an image frame; fails when the payload overflows the header.
    pub fn image(asset: &CompressedAsset) -> Result<Self, LinkError> {
        let header = encode_size_header(asset.len())?;
        Ok(Frame::Image {
            size_header: u16::from_le_bytes(header),
            payload: asset.bytes().clone(),
        })
    }

    /// Contiguous wire bytes, without the pacing an upload applies.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Frame::Text { line } => encode_text(line),
            Frame::Image {
                size_header,
                payload,
            } => {
                let mut buf = BytesMut::with_capacity(UPLOAD_COMMAND.len() + 2 + payload.len());
                buf.put_slice(UPLOAD_COMMAND);
                buf.put_u16_le(*size_header);
                buf.put_slice(payload);
                buf.freeze()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_bytes() {
        assert_eq!(&Frame::text("hi").to_bytes()[..], b"text:hi\n");
    }

    #[test]
    fn image_frame_header_matches_payload() {
        let asset = CompressedAsset::from_encoded(vec![7u8; 300], 90);
        let frame = Frame::image(&asset).unwrap();
        let Frame::Image {
            size_header,
            payload,
        } = &frame
        else {
            panic!("expected image frame");
        };
        assert_eq!(*size_header as usize, payload.len());

        let wire = frame.to_bytes();
        assert!(wire.starts_with(b"image:upload\n"));
        assert_eq!(&wire[13..15], &[44, 1]);
        assert_eq!(wire.len(), 13 + 2 + 300);
    }
}
