//! Envelope codec for tokio.
//!
//! Frames are newline-delimited JSON objects, one envelope per line. The
//! decoder scans incrementally and enforces a maximum frame length on both
//! complete and partial frames.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::Envelope;

/// Default maximum frame length in bytes (64 KiB).
///
/// Generous enough for a LIST roster of a few thousand participants.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Tokio codec for encoding/decoding newline-delimited envelope frames.
pub struct EnvelopeCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
    /// Maximum frame length.
    max_len: usize,
}

impl EnvelopeCodec {
    /// Create a new codec with the default frame length limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_FRAME_LEN,
        }
    }

    /// Create a new codec with a custom frame length limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Envelope>> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let frame = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if frame.len() > self.max_len {
                return Err(ProtocolError::FrameTooLong {
                    actual: frame.len(),
                    limit: self.max_len,
                });
            }

            // serde_json tolerates the trailing newline as whitespace.
            let envelope = serde_json::from_slice(&frame)?;
            Ok(Some(envelope))
        } else {
            // No complete frame yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::FrameTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = ProtocolError;

    fn encode(&mut self, envelope: Envelope, dst: &mut BytesMut) -> error::Result<()> {
        let json = serde_json::to_vec(&envelope)?;
        if json.len() + 1 > self.max_len {
            return Err(ProtocolError::FrameTooLong {
                actual: json.len() + 1,
                limit: self.max_len,
            });
        }

        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageType;

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Envelope::join_request(1, 999, 42), &mut buf)
            .unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.message_type, MessageType::Join);
        assert_eq!(decoded.party_id, Some(999));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_frame() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::from(&b"{\"message_id\":1"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());

        // Completing the frame later picks up where the scan stopped.
        buf.extend_from_slice(b",\"message_type\":\"PING\",\"timestamp\":0}\n");
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.message_type, MessageType::Ping);
    }

    #[test]
    fn test_decode_two_frames_in_one_read() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Envelope::ping(), &mut buf).unwrap();
        codec.encode(Envelope::leave_request(), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.message_type, MessageType::Ping);
        assert_eq!(second.message_type, MessageType::Leave);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = EnvelopeCodec::with_max_len(16);
        let mut buf = BytesMut::from(&b"this partial frame is already past the limit"[..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::FrameTooLong { .. })));
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::from(&b"not json at all\n"[..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::InvalidEnvelope(_))));
    }
}
