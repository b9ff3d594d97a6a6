//! Public endpoint API: bind a listening endpoint or dial out to one.
//!
//! This is a thin re-export layer over `ipcfsm-proto`'s `BindEndpoint` and
//! `ConnectEndpoint` — the public surface application code is meant to use,
//! as opposed to the FSM internals in the protocol crate.

pub use ipcfsm_proto::{BindEndpoint, ConnectEndpoint, PipeClosed, PipeHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ipcfsm_core::address::IpcAddress;
    use ipcfsm_core::message::Msg;
    use ipcfsm_core::options::EndpointOptions;

    #[compio::test]
    async fn bind_then_connect_round_trips_through_the_public_api() {
        let dir = tempfile::tempdir().unwrap();
        let addr = IpcAddress::new(dir.path().join("sock")).unwrap();
        let options = EndpointOptions::new(0x5555);

        let server = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();
        let client = ConnectEndpoint::connect(addr, options);

        let server_pipe = server.accept().await.unwrap();
        let client_pipe = client.next().await.unwrap();

        client_pipe.send(Msg::from_body(&b"hello world"[..])).await.unwrap();
        let received = server_pipe.recv().await.unwrap();
        assert_eq!(received.to_contiguous(), Bytes::from_static(b"hello world"));

        client.stop().await;
        server.stop().await;
    }
}
