//! `ConnectEndpoint` (§4.6): dials out, runs a `Session` while connected,
//! and reconnects with exponential backoff after every disconnect.
//!
//! `CONNECTING` → `ACTIVE` → `STOPPING_SESSION`/`STOPPING_USOCK` → `WAITING`
//! → `STOPPING_BACKOFF` → back to `CONNECTING` all live inside one loop in a
//! single `compio` task; the state names above are just the branches of that
//! loop's `select!`. `STOPPING_USOCK` collapses the same way it does in
//! [`crate::accept`]: dropping the `UnixStream` closes it, so there is
//! nothing left to wait on once `Session` returns.

use crate::pipe::PipeHandle;
use crate::session::{self, Outcome};
use futures::{select, FutureExt};
use ipcfsm_core::address::IpcAddress;
use ipcfsm_core::backoff::Backoff;
use ipcfsm_core::options::EndpointOptions;
use ipcfsm_core::socket;
use ipcfsm_core::stats::{monitor_channel, EndpointEvent, EndpointEventSender, EndpointMonitor, StatCounters, StatSnapshot};
use std::sync::Arc;
use tracing::{debug, info};

/// A dial-out endpoint that reconnects on its own until [`ConnectEndpoint::stop`]
/// is called.
pub struct ConnectEndpoint {
    addr: IpcAddress,
    pipe_rx: flume::Receiver<PipeHandle>,
    monitor_rx: EndpointMonitor,
    stats: Arc<StatCounters>,
    stop_tx: flume::Sender<()>,
    join: compio::runtime::JoinHandle<()>,
}

impl ConnectEndpoint {
    /// `Start`: enter `CONNECTING` in the background. Returns immediately —
    /// connecting never blocks the caller (§4.6).
    #[must_use]
    pub fn connect(addr: IpcAddress, options: EndpointOptions) -> Self {
        info!(%addr, "starting connect endpoint");
        let (events_tx, monitor_rx) = monitor_channel();
        let stats = Arc::new(StatCounters::default());
        let (pipe_tx, pipe_rx) = flume::unbounded();
        let (stop_tx, stop_rx) = flume::unbounded();

        let join = compio::runtime::spawn(reconnect_loop(
            addr.clone(),
            options,
            stats.clone(),
            events_tx,
            pipe_tx,
            stop_rx,
        ));

        Self {
            addr,
            pipe_rx,
            monitor_rx,
            stats,
            stop_tx,
            join,
        }
    }

    /// Wait for the pipe of the next successfully established session. Every
    /// reconnect yields a fresh [`PipeHandle`] since the previous one closed.
    pub async fn next(&self) -> Option<PipeHandle> {
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

    /// `Stop`: leave `CONNECTING`/`WAITING`/`ACTIVE` at the next opportunity
    /// and tear down any live session. Returns the final stat snapshot,
    /// taken after shutdown has run.
    pub async fn stop(self) -> StatSnapshot {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
        self.stats.snapshot()
    }
}

async fn reconnect_loop(
    addr: IpcAddress,
    options: EndpointOptions,
    stats: Arc<StatCounters>,
    events_tx: EndpointEventSender,
    pipe_tx: flume::Sender<PipeHandle>,
    stop_rx: flume::Receiver<()>,
) {
    let mut backoff = Backoff::from_options(&options);

    'reconnect: loop {
        stats.inc_inprogress_connections();
        let connect_result = select! {
            r = socket::connect(&addr).fuse() => Some(r),
            _ = stop_rx.recv_async().fuse() => None,
        };
        stats.dec_inprogress_connections();

        let stream = match connect_result {
            None => break 'reconnect,
            Some(Ok(stream)) => stream,
            Some(Err(e)) => {
                stats.inc_connect_errors();
                let _ = events_tx.send(EndpointEvent::ConnectFailed {
                    endpoint: addr.clone(),
                    reason: e.to_string(),
                });
                if !wait_for_backoff(&mut backoff, &stop_rx).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            }
        };

        let (ready_tx, ready_rx) = flume::bounded(1);
        let (session_stop_tx, session_stop_rx) = flume::bounded(1);
        let session_task = compio::runtime::spawn(session::run(
            stream,
            options.clone(),
            ready_tx,
            session_stop_rx,
        ));

        let outcome = select! {
            o = ready_rx.recv_async().fuse() => o,
            _ = stop_rx.recv_async().fuse() => {
                let _ = session_stop_tx.send(());
                let _ = session_task.await;
                break 'reconnect;
            }
        };

        let Ok(outcome) = outcome else {
            break 'reconnect;
        };

        match outcome {
            Outcome::Started { pipe, .. } => {
                backoff.reset();
                stats.inc_established_connections();
                let _ = events_tx.send(EndpointEvent::Connected(addr.clone()));
                if pipe_tx.send(pipe).is_err() {
                    let _ = session_stop_tx.send(());
                    let _ = session_task.await;
                    break 'reconnect;
                }
            }
            Outcome::Failed(e) => {
                stats.inc_connect_errors();
                let _ = events_tx.send(EndpointEvent::ConnectFailed {
                    endpoint: addr.clone(),
                    reason: e.to_string(),
                });
                if !wait_for_backoff(&mut backoff, &stop_rx).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            }
        }

        select! {
            result = session_task.fuse() => {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => stats.inc_broken_connections(),
                    Err(_) => {}
                }
                debug!(%addr, "session ended, reconnecting");
                let _ = events_tx.send(EndpointEvent::Disconnected(addr.clone()));
            }
            _ = stop_rx.recv_async().fuse() => {
                // The session was still active when Stop arrived (§4.6):
                // this is the dropped-connection case, distinct from the
                // natural end-of-session arm above.
                stats.inc_dropped_connections();
                let _ = session_stop_tx.send(());
                let _ = session_task.await;
                break 'reconnect;
            }
        }

        if !wait_for_backoff(&mut backoff, &stop_rx).await {
            break 'reconnect;
        }
    }
}

/// `WAITING`/`STOPPING_BACKOFF`: sleep out the next backoff interval unless
/// `stop_rx` fires first. Returns `false` if stopped during the wait.
async fn wait_for_backoff(backoff: &mut Backoff, stop_rx: &flume::Receiver<()>) -> bool {
    let delay = backoff.next_delay();
    select! {
        _ = compio::time::sleep(delay).fuse() => true,
        _ = stop_rx.recv_async().fuse() => false,
    }
}
