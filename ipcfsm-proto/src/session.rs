//! `Session` (§4.3): drives `StreamHdr`, then runs the framed send/receive
//! loop bridging the socket to a [`Pipe`].
//!
//! Realized as one `compio` task. `PROTOHDR`/`STOPPING_STREAMHDR` collapse
//! into a single `await` on [`handshake::run`] since there is no separate
//! child task to stop — the borrow checker already guarantees the socket
//! has exactly one owner for that duration. `ACTIVE` is a `select!` loop
//! reading decoded frames off the wire and messages off the outbound
//! channel, one event at a time (§4.1).

use crate::codec::{encode_frame, Frame, FrameDecoder};
use crate::handshake;
use crate::pipe::{channel_pipe, Pipe, PipeHandle, SessionPipe};
use bytes::BytesMut;
use compio::buf::BufResult;
use compio::io::{AsyncReadExt, AsyncWriteExt};
use compio::net::UnixStream;
use futures::{select, FutureExt};
use ipcfsm_core::buffer::SegmentedBuffer;
use ipcfsm_core::cancel::PoisonGuard;
use ipcfsm_core::error::{HandshakeFailure, IpcError, TransportFailure};
use ipcfsm_core::message::Msg;
use ipcfsm_core::options::EndpointOptions;
use tracing::{debug, trace};

/// What the session reports back to its parent (`AcceptSession` or
/// `ConnectEndpoint`) once the handshake resolves.
pub enum Outcome {
    /// Handshake succeeded; `ACTIVE` is about to start. The parent gets the
    /// pipe handle to hand to its caller.
    Started { pipe: PipeHandle, peer_protocol: u16 },
    /// Handshake failed before any session was established.
    Failed(IpcError),
}

/// Drive a single connection end to end: handshake, then the framed I/O
/// loop, until the peer disconnects, a transport error occurs, or `stop_rx`
/// fires.
///
/// `ready_tx` is signalled exactly once, immediately after the handshake
/// resolves either way — this is how the parent FSM learns whether to raise
/// `Accepted`/`Connected` (and hand the pipe to the application) or `Error`.
pub async fn run(
    mut stream: UnixStream,
    options: EndpointOptions,
    ready_tx: flume::Sender<Outcome>,
    stop_rx: flume::Receiver<()>,
) -> Result<(), IpcError> {
    let peer_protocol = match handshake::run(&mut stream, options.protocol, options.handshake_timeout).await
    {
        Ok(protocol) => protocol,
        Err(e) => {
            let reported = match &e {
                HandshakeFailure::Timeout(d) => HandshakeFailure::Timeout(*d),
                HandshakeFailure::SignatureMismatch(sig) => HandshakeFailure::SignatureMismatch(*sig),
                HandshakeFailure::NotAPeer(p) => HandshakeFailure::NotAPeer(*p),
                HandshakeFailure::Io(io_err) => {
                    HandshakeFailure::Io(std::io::Error::new(io_err.kind(), io_err.to_string()))
                }
            };
            let _ = ready_tx.send(Outcome::Failed(IpcError::HandshakeFailure(reported)));
            return Err(IpcError::HandshakeFailure(e));
        }
    };

    let (session_pipe, pipe_handle) = channel_pipe(options.protocol);
    if ready_tx
        .send(Outcome::Started {
            pipe: pipe_handle,
            peer_protocol,
        })
        .is_err()
    {
        // Parent already gone; nothing to serve.
        return Ok(());
    }

    active_loop(stream, session_pipe, stop_rx, options.read_buffer_size).await
}

async fn active_loop(
    mut stream: UnixStream,
    pipe: SessionPipe,
    stop_rx: flume::Receiver<()>,
    read_buffer_size: usize,
) -> Result<(), IpcError> {
    let mut recv_buf = SegmentedBuffer::new();
    let mut decoder = FrameDecoder::new();
    let mut is_poisoned = false;

    loop {
        select! {
            outbound = pipe.next_outbound().fuse() => {
                match outbound {
                    Some(msg) => send_one(&mut stream, &msg, &mut is_poisoned).await?,
                    None => return Ok(()), // application dropped its handle
                }
            }
            read_result = read_some(&mut stream, read_buffer_size).fuse() => {
                let bytes = read_result?;
                if bytes.is_empty() {
                    return Err(IpcError::TransportFailure(TransportFailure::PeerShutdown));
                }
                recv_buf.push(bytes);
                while let Some(Frame { payload }) = decoder
                    .decode(&mut recv_buf)
                    .map_err(IpcError::TransportFailure)?
                {
                    trace!(len = payload.len(), "frame decoded");
                    if pipe.received(Msg::from_payload(payload)).await.is_err() {
                        return Ok(()); // application dropped its handle
                    }
                }
            }
            _ = stop_rx.recv_async().fuse() => {
                return Ok(());
            }
        }
    }
}

async fn read_some(stream: &mut UnixStream, capacity: usize) -> Result<bytes::Bytes, IpcError> {
    let buf = BytesMut::with_capacity(capacity);
    let BufResult(res, buf) = stream.read(buf).await;
    let n = res.map_err(|e| IpcError::TransportFailure(TransportFailure::Io(e)))?;
    Ok(freeze_to(buf, n))
}

fn freeze_to(mut buf: BytesMut, n: usize) -> bytes::Bytes {
    buf.truncate(n);
    buf.freeze()
}

/// Serialize and write one message as a single gather-equivalent write: the
/// 9-byte frame header concatenated with the message's hdr/body chunks
/// (§4.2's `PipeBase.send`).
async fn send_one(
    stream: &mut UnixStream,
    msg: &Msg,
    is_poisoned: &mut bool,
) -> Result<(), IpcError> {
    if *is_poisoned {
        return Err(IpcError::TransportFailure(TransportFailure::Io(
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "session poisoned by cancelled write",
            ),
        )));
    }

    let guard = PoisonGuard::new(is_poisoned);
    let payload = msg.to_contiguous();
    let encoded = encode_frame(&payload);

    let BufResult(res, _) = stream.write_all(encoded.to_vec()).await;
    res.map_err(|e| IpcError::TransportFailure(TransportFailure::Io(e)))?;

    guard.disarm();
    debug!("frame written");
    Ok(())
}
