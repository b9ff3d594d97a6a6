//! The `Pipe` API (§6): the boundary between a `Session`'s wire I/O and the
//! application holding the endpoint.
//!
//! The reference transport's `PipeBase` is a set of upcalls (`sent`,
//! `received`) the session invokes synchronously and a set of downcalls
//! (`send`, `recv`) the application invokes synchronously, all serialized
//! by the single-threaded reactor. Here each `Session` runs as its own
//! `compio` task, so the natural realization is a pair of `flume` channels:
//! one carrying outbound messages from the application into the session,
//! one carrying inbound messages from the session out to the application.
//! `PipeBase.sent`/`received` collapse into ordinary channel sends.

use flume::{Receiver, Sender};
use ipcfsm_core::error::{IpcError, TransportFailure};
use ipcfsm_core::message::Msg;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error returned once the peer on the other end of a [`PipeHandle`] or
/// [`SessionPipe`] has gone away.
#[derive(Debug, thiserror::Error)]
#[error("pipe closed")]
pub struct PipeClosed;

/// What the `Session` task sees: a source of outbound messages and a sink
/// for inbound ones, plus the peering predicate it needs during handshake.
pub trait Pipe: Send {
    /// Whether `protocol_id` is a valid peer of this endpoint's local
    /// protocol (§4.2: used to validate the handshake header).
    fn is_peer(&self, protocol_id: u16) -> bool;
}

/// Channel-backed default implementation of [`Pipe`], and the session-side
/// half of a connected pipe. Construct with [`channel_pipe`].
pub struct SessionPipe {
    local_protocol: u16,
    inbound_tx: Sender<Msg>,
    outbound_rx: Receiver<Msg>,
}

impl Pipe for SessionPipe {
    fn is_peer(&self, protocol_id: u16) -> bool {
        protocol_id == self.local_protocol
    }
}

impl SessionPipe {
    /// `PipeBase.received` upcall: deliver a message the session just
    /// decoded off the wire to the application.
    pub async fn received(&self, msg: Msg) -> Result<(), PipeClosed> {
        self.inbound_tx.send_async(msg).await.map_err(|_| PipeClosed)
    }

    /// Wait for the application's next outbound message (the session's
    /// equivalent of `PipeBase.send` being invoked, except pulled rather
    /// than pushed since the session owns the socket).
    pub async fn next_outbound(&self) -> Option<Msg> {
        self.outbound_rx.recv_async().await.ok()
    }
}

/// The application-side half of a connected pipe: what `BindEndpoint` /
/// `ConnectEndpoint` return to their caller once a session is active.
pub struct PipeHandle {
    outbound_tx: Sender<Msg>,
    inbound_rx: Receiver<Msg>,
    sending: AtomicBool,
}

impl PipeHandle {
    /// `PipeBase.send` downcall.
    ///
    /// Only one outbound message may be in flight on a given handle at a
    /// time (§4.3: the outbound sub-state is `SENDING` until the session
    /// picks the message up). Calling `send` again before a prior call on
    /// the same handle has returned is a contract violation, not a runtime
    /// failure.
    pub async fn send(&self, msg: Msg) -> Result<(), IpcError> {
        if self.sending.swap(true, Ordering::AcqRel) {
            return Err(IpcError::contract_violation(
                "send called while a previous send on this pipe is still outstanding",
            ));
        }
        let result = self
            .outbound_tx
            .send_async(msg)
            .await
            .map_err(|_| IpcError::TransportFailure(TransportFailure::PeerShutdown));
        self.sending.store(false, Ordering::Release);
        result
    }

    /// `PipeBase.recv` downcall.
    pub async fn recv(&self) -> Result<Msg, PipeClosed> {
        self.inbound_rx.recv_async().await.map_err(|_| PipeClosed)
    }
}

/// Construct a connected pipe: the `Session`-side [`SessionPipe`] and the
/// application-side [`PipeHandle`], bound to `local_protocol` for peering
/// checks.
#[must_use]
pub fn channel_pipe(local_protocol: u16) -> (SessionPipe, PipeHandle) {
    let (inbound_tx, inbound_rx) = flume::unbounded();
    let (outbound_tx, outbound_rx) = flume::unbounded();
    (
        SessionPipe {
            local_protocol,
            inbound_tx,
            outbound_rx,
        },
        PipeHandle {
            outbound_tx,
            inbound_rx,
            sending: AtomicBool::new(false),
        },
    )
}
