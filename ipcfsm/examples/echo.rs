//! Minimal echo server/client over a local-domain socket.
//!
//! Run with `cargo run --example echo -- /tmp/ipcfsm-echo.sock`.

use ipcfsm::{BindEndpoint, ConnectEndpoint, EndpointOptions, IpcAddress, Msg};
use std::env;

#[compio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ipcfsm::dev_tracing::init_tracing();

    let path = env::args().nth(1).unwrap_or_else(|| "/tmp/ipcfsm-echo.sock".into());
    let addr = IpcAddress::new(path)?;
    let options = EndpointOptions::new(0x1234);

    let server = BindEndpoint::bind(addr.clone(), options.clone()).await?;
    let client = ConnectEndpoint::connect(addr, options);

    let server_pipe = server.accept().await.expect("client never connected");
    compio::runtime::spawn(async move {
        while let Ok(msg) = server_pipe.recv().await {
            let _ = server_pipe.send(msg).await;
        }
    })
    .detach();

    let client_pipe = client.next().await.expect("handshake failed");
    client_pipe.send(Msg::from_body(&b"hello, ipcfsm"[..])).await?;
    let reply = client_pipe.recv().await?;
    println!("echoed back: {:?}", reply.to_contiguous());

    client.stop().await;
    server.stop().await;
    Ok(())
}
