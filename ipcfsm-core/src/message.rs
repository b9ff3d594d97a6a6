//! The wire message: a header chunk and a body chunk, moved rather than
//! copied between `Session` and `PipeBase` (§3, §6).

use bytes::Bytes;

/// A message ready to send, or just received.
///
/// Internally split into `hdr`/`body` chunk references so a caller can
/// prepend framing metadata without copying the payload; on the wire the
/// two chunks are concatenated with no separator (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Msg {
    hdr: Bytes,
    body: Bytes,
}

impl Msg {
    /// An empty message (zero-length payload, still a valid frame — see
    /// the zero-length message scenario in §8).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            hdr: Bytes::new(),
            body: Bytes::new(),
        }
    }

    /// A message with only a body chunk.
    #[must_use]
    pub fn from_body(body: impl Into<Bytes>) -> Self {
        Self {
            hdr: Bytes::new(),
            body: body.into(),
        }
    }

    /// A message built from two pre-existing chunk references, avoiding a
    /// copy when the caller already has the header and body as separate
    /// buffers.
    #[must_use]
    pub fn from_parts(hdr: impl Into<Bytes>, body: impl Into<Bytes>) -> Self {
        Self {
            hdr: hdr.into(),
            body: body.into(),
        }
    }

    /// Total payload length across both chunks — the `N` that goes into
    /// the 9-byte frame header.
    #[must_use]
    pub fn len(&self) -> u64 {
        (self.hdr.len() + self.body.len()) as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hdr.is_empty() && self.body.is_empty()
    }

    #[must_use]
    pub fn hdr(&self) -> &Bytes {
        &self.hdr
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Concatenate both chunks into one contiguous buffer, as required on
    /// the wire.
    #[must_use]
    pub fn to_contiguous(&self) -> Bytes {
        if self.hdr.is_empty() {
            self.body.clone()
        } else if self.body.is_empty() {
            self.hdr.clone()
        } else {
            let mut buf = Vec::with_capacity(self.hdr.len() + self.body.len());
            buf.extend_from_slice(&self.hdr);
            buf.extend_from_slice(&self.body);
            Bytes::from(buf)
        }
    }

    /// Reassemble a message received as one contiguous payload buffer (the
    /// receive path never splits it back into hdr/body — the split is only
    /// meaningful to the sender).
    #[must_use]
    pub fn from_payload(payload: Bytes) -> Self {
        Self {
            hdr: Bytes::new(),
            body: payload,
        }
    }

    /// Move the message out and leave an empty one in its place, mirroring
    /// the reference transport's "move, then re-initialize empty" discipline
    /// for the inbound/outbound slots (§6).
    #[must_use]
    pub fn take(slot: &mut Self) -> Self {
        std::mem::replace(slot, Self::empty())
    }
}

impl From<Bytes> for Msg {
    fn from(body: Bytes) -> Self {
        Self::from_payload(body)
    }
}

impl From<Vec<u8>> for Msg {
    fn from(body: Vec<u8>) -> Self {
        Self::from_payload(Bytes::from(body))
    }
}
