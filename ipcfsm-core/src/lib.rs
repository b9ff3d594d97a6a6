//! `ipcfsm-core`
//!
//! Runtime-agnostic building blocks for a local-domain (`AF_UNIX`) IPC
//! transport built as a hierarchy of state machines:
//! - Endpoint addressing (`address`)
//! - Reconnect backoff (`backoff`)
//! - Zero-copy inbound buffering (`buffer`)
//! - Cancellation-safety guard for non-atomic writes (`cancel`)
//! - Error types (`error`)
//! - The wire message (`message`)
//! - Endpoint configuration (`options`)
//! - Socket bind/connect/accept primitives (`socket`)
//! - Post-accept buffer size tuning (`sockopt`)
//! - Lifecycle events and stat counters (`stats`)

#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::needless_pass_by_ref_mut)]
#![allow(clippy::match_same_arms)]

pub mod address;
pub mod backoff;
pub mod buffer;
pub mod cancel;
pub mod error;
pub mod message;
pub mod options;
pub mod socket;
pub mod sockopt;
pub mod stats;

pub mod prelude {
    pub use crate::address::{AddressError, IpcAddress};
    pub use crate::backoff::Backoff;
    pub use crate::buffer::SegmentedBuffer;
    pub use crate::cancel::PoisonGuard;
    pub use crate::error::{HandshakeFailure, IpcError, Result, TransportFailure};
    pub use crate::message::Msg;
    pub use crate::options::EndpointOptions;
    pub use crate::stats::{EndpointEvent, EndpointMonitor, StatCounters};
}
