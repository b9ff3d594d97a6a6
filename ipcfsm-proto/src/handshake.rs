//! `StreamHdr` (§4.2): one-shot exchange of the 8-byte protocol header,
//! guarded by a fixed timeout.
//!
//! Realized as a free async function taking the stream by unique borrow.
//! The borrow checker enforces "exactly one owner for the duration of the
//! call" in place of the reference transport's saved-owner bookkeeping: the
//! caller regains the `&mut` the moment this function returns, success or
//! failure.

use crate::config::HANDSHAKE_HEADER_LEN;
use bytes::{Buf, BufMut, BytesMut};
use compio::buf::BufResult;
use compio::io::{AsyncReadExt, AsyncWriteExt};
use compio::net::UnixStream;
use compio::time::timeout;
use ipcfsm_core::error::HandshakeFailure;
use std::time::Duration;
use tracing::{debug, trace};

/// Literal signature bytes every peer must send first: `"\0SP\0"`.
pub const SIGNATURE: [u8; 4] = [0x00, 0x53, 0x50, 0x00];

/// Build the 8-byte header this endpoint sends: signature, local protocol
/// id (big-endian u16), then two reserved zero bytes.
fn encode_header(protocol: u16) -> BytesMut {
    let mut buf = BytesMut::with_capacity(HANDSHAKE_HEADER_LEN);
    buf.extend_from_slice(&SIGNATURE);
    buf.put_u16(protocol);
    buf.put_u16(0);
    buf
}

fn decode_header(buf: &[u8]) -> Result<u16, HandshakeFailure> {
    let mut sig = [0u8; 4];
    sig.copy_from_slice(&buf[0..4]);
    if sig != SIGNATURE {
        return Err(HandshakeFailure::SignatureMismatch(sig));
    }
    let mut rest = &buf[4..6];
    Ok(rest.get_u16())
}

/// Fuzz-safe entry point: parse a handshake header out of an arbitrary byte
/// slice. `None` means `buf` is too short to contain one; never panics.
#[must_use]
pub fn parse_header(buf: &[u8]) -> Option<Result<u16, HandshakeFailure>> {
    if buf.len() < HANDSHAKE_HEADER_LEN {
        return None;
    }
    Some(decode_header(&buf[..HANDSHAKE_HEADER_LEN]))
}

/// Returns `true` if `peer_protocol` may speak to `local_protocol`.
///
/// The reference transport treats identical protocol ids as peers; this is
/// the full peering rule for this transport (no protocol families).
#[must_use]
pub const fn is_peer(local_protocol: u16, peer_protocol: u16) -> bool {
    local_protocol == peer_protocol
}

/// Run the handshake to completion or failure within `timeout_dur`.
///
/// On success, returns the peer's advertised protocol id. The stream is
/// left exactly as the caller handed it to us — ready for `Session` to take
/// over framed I/O.
pub async fn run(
    stream: &mut UnixStream,
    local_protocol: u16,
    timeout_dur: Duration,
) -> Result<u16, HandshakeFailure> {
    timeout(timeout_dur, exchange(stream, local_protocol))
        .await
        .map_err(|_elapsed| HandshakeFailure::Timeout(timeout_dur))?
}

async fn exchange(
    stream: &mut UnixStream,
    local_protocol: u16,
) -> Result<u16, HandshakeFailure> {
    let out = encode_header(local_protocol).freeze();
    trace!(len = out.len(), "sending handshake header");
    let BufResult(res, _) = stream.write_all(out.to_vec()).await;
    res?;

    let buf = vec![0u8; HANDSHAKE_HEADER_LEN];
    let BufResult(res, buf) = stream.read_exact(buf).await;
    res?;
    trace!("received handshake header");

    let peer_protocol = decode_header(&buf)?;
    if !is_peer(local_protocol, peer_protocol) {
        return Err(HandshakeFailure::NotAPeer(peer_protocol));
    }

    debug!(peer_protocol, "handshake succeeded");
    Ok(peer_protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipcfsm_core::address::IpcAddress;
    use ipcfsm_core::socket::{accept, bind, connect};

    async fn connected_pair() -> (UnixStream, UnixStream) {
        let dir = tempfile::tempdir().unwrap();
        let addr = IpcAddress::new(dir.path().join("sock")).unwrap();
        let listener = bind(&addr).await.unwrap();
        let accept_task = compio::runtime::spawn(async move { accept(&listener).await });
        let client = connect(&addr).await.unwrap();
        let server = accept_task.await.unwrap().unwrap();
        (client, server)
    }

    #[compio::test]
    async fn handshake_roundtrip() {
        let (mut a, mut b) = connected_pair().await;

        let side_a = compio::runtime::spawn(async move {
            run(&mut a, 0x0031, Duration::from_millis(500)).await
        });
        let side_b = run(&mut b, 0x0031, Duration::from_millis(500)).await;

        assert_eq!(side_b.unwrap(), 0x0031);
        assert_eq!(side_a.await.unwrap().unwrap(), 0x0031);
    }

    #[compio::test]
    async fn rejects_non_peer_protocol() {
        let (mut a, mut b) = connected_pair().await;

        let side_a =
            compio::runtime::spawn(async move { run(&mut a, 0x0031, Duration::from_millis(500)).await });
        let side_b = run(&mut b, 0x0032, Duration::from_millis(500)).await;

        assert!(matches!(side_b, Err(HandshakeFailure::NotAPeer(0x0031))));
        assert!(matches!(
            side_a.await.unwrap(),
            Err(HandshakeFailure::NotAPeer(0x0032))
        ));
    }

    #[compio::test]
    async fn times_out_when_peer_is_silent() {
        let (mut a, _b) = connected_pair().await;
        let result = run(&mut a, 0x0031, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(HandshakeFailure::Timeout(_))));
    }

    #[test]
    fn header_roundtrip() {
        let encoded = encode_header(0x0031);
        assert_eq!(&encoded[0..4], &SIGNATURE);
        let protocol = decode_header(&encoded).unwrap();
        assert_eq!(protocol, 0x0031);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut buf = encode_header(0x0031);
        buf[0] = 0xFF;
        assert!(matches!(
            decode_header(&buf),
            Err(HandshakeFailure::SignatureMismatch(_))
        ));
    }
}
