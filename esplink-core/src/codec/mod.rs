//! Inbound line codec for `tokio_util::codec::FramedRead`.
//!
//! Splits the peer's byte stream at `\n` and decodes each line with
//! [`decode_inbound_line`]. Blank lines come out as empty strings; the
//! read loop drops them.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{LINE_TERMINATOR, decode_inbound_line};

/// A line longer than this without a terminator is flushed as-is.
pub const MAX_LINE_LENGTH: usize = 4 * 1024;

#[derive(Debug, Default)]
pub struct InboundLineCodec {
    // Bytes before this offset are known not to contain a terminator.
    next_index: usize,
}

impl InboundLineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for InboundLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.next_index.min(src.len());
        if let Some(pos) = src[start..].iter().position(|b| *b == LINE_TERMINATOR) {
            let line = src.split_to(start + pos + 1);
            self.next_index = 0;
            return Ok(Some(decode_inbound_line(&line)));
        }

        if src.len() >= MAX_LINE_LENGTH {
            let cut = char_boundary(&src[..MAX_LINE_LENGTH]);
            let line = src.split_to(cut);
            self.next_index = 0;
            return Ok(Some(decode_inbound_line(&line)));
        }

        self.next_index = src.len();
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(decode_inbound_line(&rest)))
    }
}

/// Length of `bytes` minus a trailing UTF-8 sequence that is cut short,
/// so a forced split never lands inside a character.
fn char_boundary(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let b = bytes[len - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0xF0..=0xF7 => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if width > back { len - back } else { len };
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_newline() {
        let mut codec = InboundLineCodec::new();
        let mut buf = BytesMut::from(&b"hello\nworld\r\npart"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("hello"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("world"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"part");
    }

    #[test]
    fn partial_line_completes_later() {
        let mut codec = InboundLineCodec::new();
        let mut buf = BytesMut::from(&b"temp=2"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"1C\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("temp=21C"));
        assert!(buf.is_empty());
    }

    #[test]
    fn blank_line_decodes_empty() {
        let mut codec = InboundLineCodec::new();
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn overlong_line_is_flushed() {
        let mut codec = InboundLineCodec::new();
        let mut buf = BytesMut::from(&vec![b'a'; MAX_LINE_LENGTH + 10][..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LENGTH);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn overlong_line_splits_between_characters() {
        let mut codec = InboundLineCodec::new();
        let mut bytes = vec![b'a'; MAX_LINE_LENGTH - 1];
        bytes.extend_from_slice("é👋\n".as_bytes());
        let mut buf = BytesMut::from(&bytes[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.len(), MAX_LINE_LENGTH - 1);
        assert!(!first.contains('\u{FFFD}'));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("é👋"));
    }

    #[test]
    fn char_boundary_backs_off_partial_sequences() {
        assert_eq!(char_boundary(b"abc"), 3);
        assert_eq!(char_boundary("aé".as_bytes()), 3);
        assert_eq!(char_boundary(&"aé".as_bytes()[..2]), 1);
        assert_eq!(char_boundary(&"a👋".as_bytes()[..4]), 1);
        assert_eq!(char_boundary("a👋".as_bytes()), 5);
        assert_eq!(char_boundary(&[b'a', 0xFF]), 2);
    }

    #[test]
    fn eof_flushes_remainder() {
        let mut codec = InboundLineCodec::new();
        let mut buf = BytesMut::from(&b"bye"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("bye"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }
}
