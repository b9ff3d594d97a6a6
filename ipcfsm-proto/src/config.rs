//! Frame decoding configuration.

/// Initial staging buffer capacity for the message decoder's reassembly
/// path (only used when a frame body spans multiple `compio` reads).
pub const STAGING_BUF_INITIAL_CAP: usize = 256;

/// Fixed size of the wire message frame header: 1 type byte + 8-byte
/// big-endian length (§6).
pub const FRAME_HEADER_LEN: usize = 9;

/// Fixed size of the handshake header exchanged by `StreamHdr` (§4.2, §6).
pub const HANDSHAKE_HEADER_LEN: usize = 8;
