//! Endpoint lifecycle events and the named statistics counters from §8.

use crate::address::IpcAddress;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Endpoint lifecycle events, raised on the monitor channel every FSM
/// transition an external observer should see.
#[derive(Debug, Clone)]
pub enum EndpointEvent {
    /// `ConnectEndpoint` completed a handshake and is now a live session.
    Connected(IpcAddress),

    /// A live session ended, gracefully or otherwise.
    Disconnected(IpcAddress),

    /// `BindEndpoint` bound its listening socket.
    Bound(IpcAddress),

    /// `BindEndpoint` failed to bind.
    BindFailed { endpoint: IpcAddress, reason: String },

    /// `ConnectEndpoint` failed a connect attempt; backoff follows.
    ConnectFailed { endpoint: IpcAddress, reason: String },

    /// `BindEndpoint` accepted a new connection, handshake in progress.
    Accepted(IpcAddress),

    /// An `AcceptSession`'s handshake or transport failed after being
    /// accepted.
    AcceptDropped { endpoint: IpcAddress, reason: String },
}

impl fmt::Display for EndpointEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(ep) => write!(f, "connected to {ep}"),
            Self::Disconnected(ep) => write!(f, "disconnected from {ep}"),
            Self::Bound(ep) => write!(f, "bound to {ep}"),
            Self::BindFailed { endpoint, reason } => {
                write!(f, "bind failed for {endpoint}: {reason}")
            }
            Self::ConnectFailed { endpoint, reason } => {
                write!(f, "connect failed for {endpoint}: {reason}")
            }
            Self::Accepted(ep) => write!(f, "accepted connection on {ep}"),
            Self::AcceptDropped { endpoint, reason } => {
                write!(f, "dropped accepted connection on {endpoint}: {reason}")
            }
        }
    }
}

/// Receiving half of the monitor channel, handed to whoever constructed the
/// endpoint.
pub type EndpointMonitor = flume::Receiver<EndpointEvent>;

/// Sending half, held by the endpoint's FSM task.
pub type EndpointEventSender = flume::Sender<EndpointEvent>;

#[must_use]
pub fn monitor_channel() -> (EndpointEventSender, EndpointMonitor) {
    flume::unbounded()
}

/// Atomic counters mirroring the reference transport's `NN_STAT_*` family.
///
/// Each endpoint owns one `StatCounters` and increments it from its FSM
/// task; readers (tests, diagnostics) load with [`Ordering::Relaxed`] since
/// these are advisory counts, not synchronization points.
#[derive(Debug, Default)]
pub struct StatCounters {
    pub accepted_connections: AtomicU64,
    pub accept_errors: AtomicU64,
    pub dropped_connections: AtomicU64,
    pub broken_connections: AtomicU64,
    pub inprogress_connections: AtomicU64,
    pub established_connections: AtomicU64,
    pub connect_errors: AtomicU64,
}

impl StatCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_accepted_connections(&self) {
        self.accepted_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_accept_errors(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped_connections(&self) {
        self.dropped_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_broken_connections(&self) {
        self.broken_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_inprogress_connections(&self) {
        self.inprogress_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_inprogress_connections(&self) {
        self.inprogress_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_established_connections(&self) {
        self.established_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_connect_errors(&self) {
        self.connect_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            accepted_connections: self.accepted_connections.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            dropped_connections: self.dropped_connections.load(Ordering::Relaxed),
            broken_connections: self.broken_connections.load(Ordering::Relaxed),
            inprogress_connections: self.inprogress_connections.load(Ordering::Relaxed),
            established_connections: self.established_connections.load(Ordering::Relaxed),
            connect_errors: self.connect_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time read of [`StatCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatSnapshot {
    pub accepted_connections: u64,
    pub accept_errors: u64,
    pub dropped_connections: u64,
    pub broken_connections: u64,
    pub inprogress_connections: u64,
    pub established_connections: u64,
    pub connect_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn addr() -> IpcAddress {
        IpcAddress::new(Path::new("/tmp/test.sock")).unwrap()
    }

    #[test]
    fn event_display() {
        let event = EndpointEvent::Connected(addr());
        assert_eq!(event.to_string(), "connected to ipc:///tmp/test.sock");
    }

    #[test]
    fn monitor_channel_roundtrip() {
        let (tx, rx) = monitor_channel();
        tx.send(EndpointEvent::Bound(addr())).unwrap();
        let event = rx.recv().unwrap();
        assert!(matches!(event, EndpointEvent::Bound(_)));
    }

    #[test]
    fn counters_increment_and_snapshot() {
        let stats = StatCounters::new();
        stats.inc_accepted_connections();
        stats.inc_accepted_connections();
        stats.inc_accept_errors();

        let snap = stats.snapshot();
        assert_eq!(snap.accepted_connections, 2);
        assert_eq!(snap.accept_errors, 1);
        assert_eq!(snap.dropped_connections, 0);
    }

    #[test]
    fn inprogress_tracks_up_and_down() {
        let stats = StatCounters::new();
        stats.inc_inprogress_connections();
        stats.inc_inprogress_connections();
        stats.dec_inprogress_connections();
        assert_eq!(stats.snapshot().inprogress_connections, 1);
    }
}
