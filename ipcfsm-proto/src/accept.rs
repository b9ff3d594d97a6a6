//! `AcceptSession` (§4.4): the lifecycle of one already-accepted connection,
//! from handshake through an active `Session` to teardown.
//!
//! The reference transport's `ACCEPTING` state (waiting for the listener to
//! hand us a connected child socket) lives one level up in [`crate::bind`];
//! this module starts from an already-accepted [`UnixStream`]. Its
//! `STOPPING_SESSION`/`STOPPING_USOCK` states collapse: once `Session`
//! returns, dropping the `UnixStream` closes the file descriptor, so there
//! is no separate "wait for the socket to report stopped" step to model.

use crate::pipe::PipeHandle;
use crate::session::{self, Outcome};
use ipcfsm_core::address::IpcAddress;
use ipcfsm_core::options::EndpointOptions;
use ipcfsm_core::stats::{EndpointEvent, EndpointEventSender, StatCounters};
use compio::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Handle to a spawned `AcceptSession` task, held by [`crate::bind::BindEndpoint`]
/// in its accepted set for the shutdown cascade.
pub struct AcceptSessionHandle {
    /// Fires once, with the application-facing pipe, once the handshake
    /// succeeds. Empty (sender dropped) if the handshake failed.
    pub pipe_rx: flume::Receiver<PipeHandle>,
    /// Fires once the underlying task has fully finished — handshake
    /// failure, session end, or `stop()` — so the owner can retire its
    /// bookkeeping only once the connection is truly gone rather than as
    /// soon as the pipe is handed off.
    pub done_rx: flume::Receiver<()>,
    stop_tx: flume::Sender<()>,
    join: compio::runtime::JoinHandle<()>,
    active: Arc<AtomicBool>,
    stats: Arc<StatCounters>,
}

impl AcceptSessionHandle {
    /// `Stop`: end the underlying session (if any) and wait for the task to
    /// finish. Safe to call at any point in the lifecycle.
    ///
    /// Per the shutdown cascade (§4.6): if the session was still active
    /// (past a successful handshake, not yet naturally ended) when `stop`
    /// was called, this counts as a dropped connection.
    pub async fn stop(self) {
        if self.active.load(Ordering::Acquire) {
            self.stats.inc_dropped_connections();
        }
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
    }
}

/// Spawn the task driving one accepted connection end to end.
pub fn spawn(
    stream: UnixStream,
    options: EndpointOptions,
    stats: Arc<StatCounters>,
    events_tx: EndpointEventSender,
    addr: IpcAddress,
) -> AcceptSessionHandle {
    let (stop_tx, stop_rx) = flume::bounded(1);
    let (pipe_tx, pipe_rx) = flume::bounded(1);
    let (ready_tx, ready_rx) = flume::bounded(1);
    let (done_tx, done_rx) = flume::bounded(1);
    let active = Arc::new(AtomicBool::new(false));

    if let Err(e) = ipcfsm_core::sockopt::apply_buffer_sizes(&stream, options.sndbuf, options.rcvbuf) {
        warn!(%addr, error = %e, "failed to apply SNDBUF/RCVBUF to accepted socket");
    }

    let task_active = active.clone();
    let task_stats = stats.clone();
    let join = compio::runtime::spawn(async move {
        let stats = task_stats;
        let session_task = compio::runtime::spawn(session::run(stream, options, ready_tx, stop_rx));

        match ready_rx.recv_async().await {
            Ok(Outcome::Started { pipe, .. }) => {
                stats.inc_accepted_connections();
                task_active.store(true, Ordering::Release);
                let _ = events_tx.send(EndpointEvent::Accepted(addr.clone()));
                let _ = pipe_tx.send(pipe);
            }
            Ok(Outcome::Failed(e)) => {
                stats.inc_accept_errors();
                warn!(%addr, error = %e, "accepted connection failed handshake");
                let _ = events_tx.send(EndpointEvent::AcceptDropped {
                    endpoint: addr.clone(),
                    reason: e.to_string(),
                });
                let _ = done_tx.send(());
                return;
            }
            Err(_) => {
                let _ = done_tx.send(());
                return;
            }
        }

        match session_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                stats.inc_broken_connections();
                let _ = events_tx.send(EndpointEvent::AcceptDropped {
                    endpoint: addr,
                    reason: e.to_string(),
                });
            }
            Err(_) => {}
        }
        task_active.store(false, Ordering::Release);
        let _ = done_tx.send(());
    });

    AcceptSessionHandle {
        pipe_rx,
        done_rx,
        stop_tx,
        join,
        active,
        stats,
    }
}
