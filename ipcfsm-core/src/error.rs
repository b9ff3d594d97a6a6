//! Error taxonomy for the IPC transport.
//!
//! Every fallible operation returns [`IpcError`]. Variants correspond 1:1 to
//! the failure categories an endpoint FSM can raise to its owner.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the IPC transport's state machines.
#[derive(Error, Debug)]
pub enum IpcError {
    /// Socket error or timeout during the handshake, a signature mismatch, or
    /// a non-peer protocol identifier.
    #[error("handshake failed: {0}")]
    HandshakeFailure(#[source] HandshakeFailure),

    /// Socket-level error or remote shutdown once a session is active, or a
    /// frame that violates the wire format.
    #[error("transport failed: {0}")]
    TransportFailure(#[source] TransportFailure),

    /// A listener could not be bound to its address.
    #[error("bind failed: {0}")]
    BindFailure(#[source] io::Error),

    /// A listener could not accept a connection.
    #[error("accept failed: {0}")]
    AcceptFailure(#[source] io::Error),

    /// A connect attempt failed (refused, unreachable, address in use).
    #[error("connect failed: {0}")]
    ConnectFailure(#[source] io::Error),

    /// An unexpected (state, source, type) triple, a double start/stop, or
    /// another violation of the FSM's own calling discipline.
    ///
    /// These are programming errors, not recoverable runtime conditions.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Generic I/O failure not otherwise classified above.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Detail carried by [`IpcError::HandshakeFailure`].
#[derive(Error, Debug)]
pub enum HandshakeFailure {
    #[error("peer was silent for more than {0:?}")]
    Timeout(Duration),

    #[error("signature mismatch: expected \\0SP\\0, got {0:02x?}")]
    SignatureMismatch([u8; 4]),

    #[error("protocol {0:#06x} is not a peer of the local protocol")]
    NotAPeer(u16),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Detail carried by [`IpcError::TransportFailure`].
#[derive(Error, Debug)]
pub enum TransportFailure {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("peer closed its write side")]
    PeerShutdown,

    #[error("frame type byte {0} is neither MSG_NORMAL (1) nor MSG_SHMEM (2)")]
    UnknownFrameType(u8),

    #[error("MSG_SHMEM frames are not supported by this transport")]
    ShmemUnsupported,
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IpcError>;

impl IpcError {
    pub fn contract_violation(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        debug_assert!(false, "contract violation: {msg}");
        Self::ContractViolation(msg)
    }

    /// Whether this failure should trigger the caller's recycle policy
    /// (re-accept for AcceptSession, backoff+reconnect for ConnectEndpoint).
    #[must_use]
    pub fn is_session_terminal(&self) -> bool {
        matches!(
            self,
            Self::HandshakeFailure(_) | Self::TransportFailure(_)
        )
    }
}
