//! # `ipcfsm`
//!
//! A local-domain (`AF_UNIX`) IPC transport, structured as a hierarchy of
//! state machines: a handshake, a framed session, and the two endpoint
//! types applications drive directly.
//!
//! ## Architecture
//!
//! - **`ipcfsm-core`**: addressing, buffering, backoff, errors, stats
//! - **`ipcfsm-proto`**: the wire protocol and endpoint state machines
//! - **`ipcfsm`**: public API surface (this crate)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ipcfsm::{BindEndpoint, ConnectEndpoint, EndpointOptions, IpcAddress, Msg};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let addr = IpcAddress::new("/tmp/example.sock")?;
//! let options = EndpointOptions::new(0x5555);
//!
//! let server = BindEndpoint::bind(addr.clone(), options.clone()).await?;
//! let client = ConnectEndpoint::connect(addr, options);
//!
//! let server_pipe = server.accept().await.unwrap();
//! let client_pipe = client.next().await.unwrap();
//!
//! client_pipe.send(Msg::from_body(&b"hello"[..])).await?;
//! let reply = server_pipe.recv().await?;
//! println!("got {:?}", reply.to_contiguous());
//! # Ok(())
//! # }
//! ```
//!
//! ## Properties
//!
//! - **Zero-copy**: messages use `bytes::Bytes` for refcounted buffers
//! - **`io_uring`**: native Linux async I/O via `compio`
//! - **Sans-IO framing**: the frame decoder is pure and independently testable
//! - **Safe**: `unsafe` is isolated to `ipcfsm-core::sockopt` (buffer-size tuning)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::future_not_send)] // Runtime-agnostic design
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub use bytes::Bytes;
pub use ipcfsm_core::address::{AddressError, IpcAddress};
pub use ipcfsm_core::backoff::Backoff;
pub use ipcfsm_core::error::{HandshakeFailure, IpcError, TransportFailure};
pub use ipcfsm_core::message::Msg;
pub use ipcfsm_core::options::EndpointOptions;
pub use ipcfsm_core::stats::{EndpointEvent, EndpointMonitor, StatSnapshot};

pub mod endpoint;
pub use endpoint::{BindEndpoint, ConnectEndpoint, PipeClosed, PipeHandle};

/// Development helpers (benches/tests).
pub mod dev_tracing;

/// Convenient imports.
///
/// ```rust
/// use ipcfsm::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        BindEndpoint, ConnectEndpoint, EndpointOptions, IpcAddress, Msg, PipeClosed, PipeHandle,
    };
    pub use bytes::Bytes;
}
