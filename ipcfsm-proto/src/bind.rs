//! `BindEndpoint` (§4.5): owns the listening socket, keeps exactly one
//! outstanding `accept()` in flight, and tracks every live accepted
//! connection for the shutdown cascade.
//!
//! Realized as one `compio` task (the `ACTIVE` loop) plus one child task per
//! accepted connection ([`crate::accept::spawn`]). The "pending AcceptSession"
//! of the reference transport is just the `listener.accept()` future sitting
//! in the `select!` below; there is no separate FSM instance for it because
//! there is nothing to do while it is outstanding except wait.

use crate::accept::{self, AcceptSessionHandle};
use crate::pipe::PipeHandle;
use futures::{select, FutureExt};
use ipcfsm_core::address::IpcAddress;
use ipcfsm_core::error::IpcError;
use ipcfsm_core::options::EndpointOptions;
use ipcfsm_core::socket::{self, LISTEN_BACKLOG};
use ipcfsm_core::stats::{monitor_channel, EndpointEvent, EndpointMonitor, StatCounters, StatSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Backoff inserted between `AcceptError`s so a wedged listener (e.g. out of
/// file descriptors) doesn't spin the `ACCEPTING` loop (REDESIGN FLAGS).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A bound listening endpoint, accepting connections until [`BindEndpoint::stop`]
/// is called or the handle is dropped.
pub struct BindEndpoint {
    addr: IpcAddress,
    pipe_rx: flume::Receiver<PipeHandle>,
    monitor_rx: EndpointMonitor,
    stats: Arc<StatCounters>,
    stop_tx: flume::Sender<()>,
    join: compio::runtime::JoinHandle<()>,
}

impl BindEndpoint {
    /// `Start`: build the address, bind and listen, and spawn the `ACTIVE`
    /// loop. Returns once the listener is up; accepting happens in the
    /// background.
    pub async fn bind(addr: IpcAddress, options: EndpointOptions) -> Result<Self, IpcError> {
        let listener = socket::bind(&addr).await.map_err(IpcError::BindFailure)?;
        info!(%addr, backlog = LISTEN_BACKLOG, "bound listening endpoint");

        let (events_tx, monitor_rx) = monitor_channel();
        let _ = events_tx.send(EndpointEvent::Bound(addr.clone()));
        let stats = Arc::new(StatCounters::default());
        let (pipe_tx, pipe_rx) = flume::unbounded();
        let (stop_tx, stop_rx) = flume::unbounded();

        let join = compio::runtime::spawn(active_loop(
            listener,
            addr.clone(),
            options,
            stats.clone(),
            events_tx,
            pipe_tx,
            stop_rx,
        ));

        Ok(Self {
            addr,
            pipe_rx,
            monitor_rx,
            stats,
            stop_tx,
            join,
        })
    }

    /// Wait for the next accepted connection's pipe handle.
    pub async fn accept(&self) -> Option<PipeHandle> {
        self.pipe_rx.recv_async().await.ok()
    }

    #[must_use]
    pub fn monitor(&self) -> EndpointMonitor {
        self.monitor_rx.clone()
    }

    #[must_use]
    pub fn stats(&self) -> StatSnapshot {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn address(&self) -> &IpcAddress {
        &self.addr
    }

    /// `Stop`: end the `ACCEPTING` loop, cascade `Stop` to every accepted
    /// session, then drop the listener. Returns the final stat snapshot,
    /// taken after the shutdown cascade has run.
    pub async fn stop(self) -> StatSnapshot {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
        self.stats.snapshot()
    }
}

#[allow(clippy::too_many_arguments)]
async fn active_loop(
    listener: compio::net::UnixListener,
    addr: IpcAddress,
    options: EndpointOptions,
    stats: Arc<StatCounters>,
    events_tx: ipcfsm_core::stats::EndpointEventSender,
    pipe_tx: flume::Sender<PipeHandle>,
    stop_rx: flume::Receiver<()>,
) {
    let mut accepted: HashMap<u64, AcceptSessionHandle> = HashMap::new();
    let (retired_tx, retired_rx) = flume::unbounded::<u64>();
    let mut next_id: u64 = 0;

    loop {
        select! {
            accept_result = socket::accept(&listener).fuse() => {
                match accept_result {
                    Ok(stream) => {
                        let handle = accept::spawn(stream, options.clone(), stats.clone(), events_tx.clone(), addr.clone());
                        let id = next_id;
                        next_id += 1;

                        let pipe_rx = handle.pipe_rx.clone();
                        let done_rx = handle.done_rx.clone();
                        let pipe_tx = pipe_tx.clone();
                        let retired_tx = retired_tx.clone();
                        compio::runtime::spawn(async move {
                            if let Ok(pipe) = pipe_rx.recv_async().await {
                                let _ = pipe_tx.send(pipe);
                            }
                            // Retire only once the connection has truly
                            // ended, not merely once its pipe was handed
                            // off — otherwise the shutdown cascade below
                            // would never reach a live connection.
                            let _ = done_rx.recv_async().await;
                            let _ = retired_tx.send(id);
                        }).detach();

                        accepted.insert(id, handle);
                    }
                    Err(e) => {
                        stats.inc_accept_errors();
                        warn!(%addr, error = %e, "accept failed, backing off before retry");
                        let _ = events_tx.send(EndpointEvent::AcceptDropped {
                            endpoint: addr.clone(),
                            reason: e.to_string(),
                        });
                        compio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
            retired = retired_rx.recv_async().fuse() => {
                if let Ok(id) = retired {
                    accepted.remove(&id);
                }
            }
            _ = stop_rx.recv_async().fuse() => {
                break;
            }
        }
    }

    for (_, handle) in accepted {
        handle.stop().await;
    }
    drop(listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ipcfsm_core::message::Msg;

    #[compio::test]
    async fn accepts_and_exchanges_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let addr = IpcAddress::new(dir.path().join("sock")).unwrap();
        let options = EndpointOptions::new(0x0031);

        let bound = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();

        let client_addr = addr.clone();
        let client_options = options.clone();
        let client_task = compio::runtime::spawn(async move {
            let stream = socket::connect(&client_addr).await.unwrap();
            let (ready_tx, ready_rx) = flume::bounded(1);
            let (_stop_tx, stop_rx) = flume::bounded(1);
            let join = compio::runtime::spawn(crate::session::run(stream, client_options, ready_tx, stop_rx));
            let outcome = ready_rx.recv_async().await.unwrap();
            (outcome, join)
        });

        let server_pipe = bound.accept().await.unwrap();
        let (client_outcome, _client_join) = client_task.await.unwrap();
        let client_pipe = match client_outcome {
            crate::session::Outcome::Started { pipe, .. } => pipe,
            crate::session::Outcome::Failed(e) => panic!("{e}"),
        };

        client_pipe.send(Msg::from_body(&b"hello"[..])).await.unwrap();
        let received = server_pipe.recv().await.unwrap();
        assert_eq!(received.to_contiguous(), Bytes::from_static(b"hello"));

        assert_eq!(bound.stats().accepted_connections, 1);
        bound.stop().await;
    }

    #[compio::test]
    async fn stop_tears_down_a_live_connection() {
        let dir = tempfile::tempdir().unwrap();
        let addr = IpcAddress::new(dir.path().join("sock")).unwrap();
        let options = EndpointOptions::new(0x0031);

        let bound = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();

        let client_addr = addr.clone();
        compio::runtime::spawn(async move {
            let stream = socket::connect(&client_addr).await.unwrap();
            let (ready_tx, ready_rx) = flume::bounded(1);
            let (_stop_tx, stop_rx) = flume::bounded(1);
            compio::runtime::spawn(crate::session::run(stream, options, ready_tx, stop_rx)).detach();
            let _ = ready_rx.recv_async().await;
        })
        .detach();

        let _server_pipe = bound.accept().await.unwrap();
        let snapshot = bound.stop().await;
        assert_eq!(snapshot.dropped_connections, 1);
    }
}
