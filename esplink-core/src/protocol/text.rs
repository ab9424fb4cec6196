//! Text lines in both directions.
//!
//! Outbound lines carry a `text:` command prefix; inbound lines are raw
//! bytes up to `\n`. Inbound bytes are decoded lossily: every invalid
//! UTF-8 sequence becomes U+FFFD, so decoding never fails.

use bytes::{BufMut, Bytes, BytesMut};

/// Command prefix for outbound chat lines.
pub const TEXT_PREFIX: &[u8] = b"text:";

/// Line terminator in both directions.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Encode an outbound chat line as `text:<line>\n`.
///
/// No length limit is applied; the peer reads text line by line, so an
/// embedded `\n` reaches it as two messages.
pub fn encode_text(line: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(TEXT_PREFIX.len() + line.len() + 1);
    buf.put_slice(TEXT_PREFIX);
    buf.put_slice(line.as_bytes());
    buf.put_u8(LINE_TERMINATOR);
    buf.freeze()
}

/// Decode one inbound line, dropping the terminator and any trailing
/// whitespace. Returns an empty string for blank input, which callers
/// discard.
pub fn decode_inbound_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

/// Strip the outbound `text:` prefix, if present. Used by loopback
/// peers and tests to read back what [`encode_text`] produced.
pub fn strip_text_prefix(line: &str) -> &str {
    line.strip_prefix("text:").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_text_layout() {
        assert_eq!(&encode_text("hello")[..], b"text:hello\n");
        assert_eq!(&encode_text("")[..], b"text:\n");
    }

    #[test]
    fn utf8_survives_roundtrip() {
        for s in ["hello", "grüße 👋", "trailing tab ok"] {
            let wire = encode_text(s);
            let decoded = decode_inbound_line(&wire);
            assert_eq!(strip_text_prefix(&decoded), s);
        }
    }

    #[test]
    fn decode_trims_line_endings() {
        assert_eq!(decode_inbound_line(b"ready\r\n"), "ready");
        assert_eq!(decode_inbound_line(b"  spaced  \n"), "  spaced");
    }

    #[test]
    fn decode_replaces_invalid_sequences() {
        let line = decode_inbound_line(&[b'o', b'k', 0xFF, 0xFE, b'\n']);
        assert_eq!(line, "ok\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn empty_input_decodes_empty() {
        assert_eq!(decode_inbound_line(b""), "");
        assert_eq!(decode_inbound_line(b"\r\n"), "");
    }
}
