//! Message frame codec: 1 type byte + big-endian 64-bit length + payload
//! (§6). Decoding is stateful so a frame spanning multiple `compio` reads
//! reassembles incrementally instead of blocking the caller on a full read.

use crate::config::{FRAME_HEADER_LEN, STAGING_BUF_INITIAL_CAP};
use bytes::{Buf, Bytes, BytesMut};
use ipcfsm_core::buffer::SegmentedBuffer;
use ipcfsm_core::error::TransportFailure;

/// `MSG_NORMAL` — the only frame type this transport emits.
pub const MSG_NORMAL: u8 = 1;

/// `MSG_SHMEM` — reserved fastpath type byte, rejected on receipt (§4.2,
/// REDESIGN FLAGS: rejected as a [`TransportFailure`] rather than asserting).
pub const MSG_SHMEM: u8 = 2;

/// A decoded frame: the type byte (validated to be [`MSG_NORMAL`]) and its
/// payload.
#[derive(Debug, Clone)]
pub struct Frame {
    pub payload: Bytes,
}

/// Stateful decoder for the inbound half of a `Session` (§4.3's `HDR` /
/// `BODY` sub-states collapse into this one decoder).
///
/// Fast path: header and full body already buffered → zero-copy slice.
/// Slow path: body spans reads → reassemble into a staging buffer.
pub struct FrameDecoder {
    pending_len: Option<u64>,
    staging: BytesMut,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending_len: None,
            staging: BytesMut::with_capacity(STAGING_BUF_INITIAL_CAP),
        }
    }

    /// `true` while reassembling a body (the `BODY` sub-state).
    #[must_use]
    pub const fn has_pending_body(&self) -> bool {
        self.pending_len.is_some()
    }

    /// Decode at most one frame from `src`.
    ///
    /// Returns `Ok(None)` when more data is needed, never blocking the
    /// caller — the `Session` task keeps posting reads until this returns
    /// `Some` or an error.
    pub fn decode(&mut self, src: &mut SegmentedBuffer) -> Result<Option<Frame>, TransportFailure> {
        if let Some(len) = self.pending_len {
            let needed = len as usize - self.staging.len();
            let take = needed.min(src.len());
            if let Some(bytes) = src.take_bytes(take) {
                self.staging.extend_from_slice(&bytes);
            }
            if (self.staging.len() as u64) < len {
                return Ok(None);
            }
            let payload = self.staging.split().freeze();
            self.pending_len = None;
            return Ok(Some(Frame { payload }));
        }

        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let mut hdr = [0u8; FRAME_HEADER_LEN];
        if !src.copy_prefix(FRAME_HEADER_LEN, &mut hdr) {
            return Ok(None);
        }

        let type_byte = hdr[0];
        if type_byte == MSG_SHMEM {
            return Err(TransportFailure::ShmemUnsupported);
        }
        if type_byte != MSG_NORMAL {
            return Err(TransportFailure::UnknownFrameType(type_byte));
        }

        let mut len_buf = &hdr[1..9];
        let len = len_buf.get_u64();

        let total_len = FRAME_HEADER_LEN + len as usize;
        if src.len() >= total_len {
            src.advance(FRAME_HEADER_LEN);
            let payload = src
                .take_bytes(len as usize)
                .expect("len check ensures body is available");
            return Ok(Some(Frame { payload }));
        }

        src.advance(FRAME_HEADER_LEN);
        self.pending_len = Some(len);
        self.staging.clear();
        let available = src.len().min(len as usize);
        if let Some(bytes) = src.take_bytes(available) {
            self.staging.extend_from_slice(&bytes);
        }

        Ok(None)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a frame header + payload into one contiguous buffer.
#[must_use]
pub fn encode_frame(payload: &Bytes) -> Bytes {
    let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(&[MSG_NORMAL]);
    out.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    out.extend_from_slice(payload);
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_header_then_payload() {
        let encoded = encode_frame(&Bytes::from_static(b"hi"));
        assert_eq!(encoded[0], MSG_NORMAL);
        assert_eq!(&encoded[1..9], &8u64.to_be_bytes());
        assert_eq!(&encoded[9..], b"hi");
    }

    #[test]
    fn decodes_whole_frame_in_one_shot() {
        let mut decoder = FrameDecoder::new();
        let mut buf = SegmentedBuffer::new();
        buf.push(encode_frame(&Bytes::from_static(b"payload")));

        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload, Bytes::from_static(b"payload"));
    }

    #[test]
    fn zero_length_message_still_yields_a_frame() {
        let mut decoder = FrameDecoder::new();
        let mut buf = SegmentedBuffer::new();
        buf.push(encode_frame(&Bytes::new()));

        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn reassembles_body_split_across_reads() {
        let mut decoder = FrameDecoder::new();
        let encoded = encode_frame(&Bytes::from_static(b"0123456789"));
        let mut buf = SegmentedBuffer::new();

        buf.push(Bytes::copy_from_slice(&encoded[..12]));
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(decoder.has_pending_body());

        buf.push(Bytes::copy_from_slice(&encoded[12..]));
        let frame = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload, Bytes::from_static(b"0123456789"));
    }

    #[test]
    fn rejects_shmem_type_byte() {
        let mut decoder = FrameDecoder::new();
        let mut buf = SegmentedBuffer::new();
        let mut encoded = encode_frame(&Bytes::from_static(b"x")).to_vec();
        encoded[0] = MSG_SHMEM;
        buf.push(Bytes::from(encoded));

        assert!(matches!(
            decoder.decode(&mut buf),
            Err(TransportFailure::ShmemUnsupported)
        ));
    }

    #[test]
    fn rejects_unknown_type_byte() {
        let mut decoder = FrameDecoder::new();
        let mut buf = SegmentedBuffer::new();
        let mut encoded = encode_frame(&Bytes::from_static(b"x")).to_vec();
        encoded[0] = 9;
        buf.push(Bytes::from(encoded));

        assert!(matches!(
            decoder.decode(&mut buf),
            Err(TransportFailure::UnknownFrameType(9))
        ));
    }
}
