//! # `ipcfsm-proto`
//!
//! **Internal protocol implementation crate for `ipcfsm`.**
//!
//! This crate implements the wire protocol and the hierarchical endpoint
//! state machines over `ipcfsm-core`'s addressing, buffering, and error
//! primitives: a handshake, a message-frame codec, a per-connection
//! session, and the two endpoint FSMs (`BindEndpoint`, `ConnectEndpoint`)
//! that own sockets and supervise sessions.
//!
//! For application development, use the `ipcfsm` crate, which re-exports
//! the public surface of this one.
//!
//! ## Modules
//!
//! - `handshake` / `codec`: the wire protocol (sans-IO where practical)
//! - `pipe`: the application-facing boundary of a session
//! - `session`: drives one connection end to end
//! - `accept`: the lifecycle of one accepted connection
//! - `bind` / `connect`: the two public endpoint types
//!
//! ## Features
//!
//! - **Zero-copy**: messages use `Bytes` for efficient sharing
//! - **`io_uring`**: async I/O via `compio`
//! - **Sans-IO framing**: the frame decoder is testable without a socket
//! - **Type-safe**: no unsafe code in this crate

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::needless_pass_by_ref_mut)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unused_async)]
#![allow(clippy::let_underscore_future)]
#![allow(clippy::future_not_send)] // Runtime-agnostic design
#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::while_let_loop)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::never_loop)] // State machines use loop with early returns

// Internal modules (not part of public API)
mod config;
mod handshake;
mod session;

// Public protocol types
pub mod accept;
pub mod bind;
pub mod codec;
pub mod connect;
pub mod pipe;

pub use bind::BindEndpoint;
pub use codec::{Frame, FrameDecoder};
pub use connect::ConnectEndpoint;
pub use handshake::parse_header;
pub use pipe::{PipeClosed, PipeHandle};
pub use session::Outcome;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ipcfsm_proto::prelude::*;
/// ```
pub mod prelude {
    pub use super::{BindEndpoint, ConnectEndpoint, PipeClosed, PipeHandle};
    pub use bytes::Bytes;
    pub use ipcfsm_core::message::Msg;
    pub use ipcfsm_core::options::EndpointOptions;
}
