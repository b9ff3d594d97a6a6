//! Local-domain (`AF_UNIX`) stream socket primitives backing the transport.

use crate::address::IpcAddress;
use compio::net::{UnixListener, UnixStream};
use std::io;

/// Fixed listen backlog (§6).
pub const LISTEN_BACKLOG: u32 = 10;

/// Connect to a local-domain stream socket.
pub async fn connect(addr: &IpcAddress) -> io::Result<UnixStream> {
    UnixStream::connect(addr.path()).await
}

/// Bind a listening local-domain stream socket.
///
/// Any leftover socket file at `addr` is unlinked first ("does-not-exist" is
/// not an error); a directory at that path surfaces as a startup error.
pub async fn bind(addr: &IpcAddress) -> io::Result<UnixListener> {
    let path = addr.path();
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a directory", path.display()),
            ));
        }
        Ok(_) => std::fs::remove_file(path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    UnixListener::bind(path).await
}

/// Accept a single connection on a listener.
pub async fn accept(listener: &UnixListener) -> io::Result<UnixStream> {
    let (stream, _addr) = listener.accept().await?;
    Ok(stream)
}
