//! Socket buffer size tuning for accepted/connected streams (§4.4: apply
//! `SNDBUF`/`RCVBUF` to a child socket once it comes off the listener).
//!
//! # Safety
//!
//! `compio` doesn't expose `setsockopt` for `SO_SNDBUF`/`SO_RCVBUF`
//! directly, so this borrows the raw fd just long enough to hand it to
//! `socket2`, then forgets the wrapper without closing it. The unsafe
//! operation is encapsulated here and safe to call from the public API.

#![allow(unsafe_code)]

use compio::net::UnixStream;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd};

/// Apply `SO_SNDBUF`/`SO_RCVBUF` to `stream`. A size of `0` leaves the
/// platform default in place (§6: `sndbuf`/`rcvbuf` default to unset).
pub fn apply_buffer_sizes(stream: &UnixStream, sndbuf: usize, rcvbuf: usize) -> io::Result<()> {
    let fd = stream.as_raw_fd();
    let sock = unsafe { socket2::Socket::from_raw_fd(fd) };

    let result = (|| {
        if sndbuf > 0 {
            sock.set_send_buffer_size(sndbuf)?;
        }
        if rcvbuf > 0 {
            sock.set_recv_buffer_size(rcvbuf)?;
        }
        Ok(())
    })();

    std::mem::forget(sock);
    result
}
