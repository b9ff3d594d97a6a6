//! End-to-end scenarios over real `AF_UNIX` sockets, driven through the
//! public `ipcfsm` API.

use bytes::Bytes;
use ipcfsm::{BindEndpoint, ConnectEndpoint, EndpointOptions, IpcAddress, Msg};
use std::time::{Duration, Instant};

fn addr_in(dir: &tempfile::TempDir, name: &str) -> IpcAddress {
    IpcAddress::new(dir.path().join(name)).unwrap()
}

#[compio::test]
async fn happy_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t1");
    let options = EndpointOptions::new(0x0031);

    let server = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();
    let client = ConnectEndpoint::connect(addr, options);

    let server_pipe = server.accept().await.unwrap();
    let client_pipe = client.next().await.unwrap();

    client_pipe
        .send(Msg::from_body(&[0x41u8, 0x42, 0x43][..]))
        .await
        .unwrap();
    let received = server_pipe.recv().await.unwrap();
    assert_eq!(received.to_contiguous(), Bytes::from_static(b"ABC"));

    client.stop().await;
    server.stop().await;
}

#[compio::test]
async fn zero_length_message() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t2");
    let options = EndpointOptions::new(0x0031);

    let server = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();
    let client = ConnectEndpoint::connect(addr, options);

    let server_pipe = server.accept().await.unwrap();
    let client_pipe = client.next().await.unwrap();

    client_pipe.send(Msg::empty()).await.unwrap();
    let received = server_pipe.recv().await.unwrap();
    assert!(received.is_empty());

    client.stop().await;
    server.stop().await;
}

#[compio::test]
async fn handshake_timeout_enters_backoff() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t3");

    // A bare listener that never speaks the protocol — the connect endpoint's
    // handshake must time out rather than hang.
    let listener = ipcfsm_core::socket::bind(&addr).await.unwrap();
    compio::runtime::spawn(async move {
        let _stream = ipcfsm_core::socket::accept(&listener).await.unwrap();
        std::future::pending::<()>().await;
    })
    .detach();

    let options = EndpointOptions::new(0x0031).with_handshake_timeout(Duration::from_millis(100));
    let client = ConnectEndpoint::connect(addr, options);

    compio::time::sleep(Duration::from_millis(300)).await;
    assert!(client.stats().connect_errors >= 1);
    client.stop().await;
}

#[compio::test]
async fn reconnect_storm_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t5");

    let options = EndpointOptions::new(0x0031)
        .with_reconnect_ivl(Duration::from_millis(100))
        .with_reconnect_ivl_max(Duration::from_millis(800));

    // No listener: every attempt fails and backoff must double up to the cap.
    let start = Instant::now();
    let client = ConnectEndpoint::connect(addr, options);

    compio::time::sleep(Duration::from_millis(950)).await;
    let elapsed = start.elapsed();
    let attempts = client.stats().connect_errors;

    // t ~= 0, 100, 200, 400, 800: five attempts inside ~950ms, never faster
    // than the base interval.
    assert!(attempts >= 4, "expected at least 4 attempts, got {attempts}");
    assert!(elapsed >= Duration::from_millis(900));

    client.stop().await;
}

#[compio::test]
async fn graceful_shutdown_with_live_connection() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t6");
    let options = EndpointOptions::new(0x0031);

    let server = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();
    let client = ConnectEndpoint::connect(addr, options);

    let server_pipe = server.accept().await.unwrap();
    let client_pipe = client.next().await.unwrap();

    // Keep the connection actively sending while we stop the bind endpoint.
    compio::runtime::spawn(async move {
        loop {
            if client_pipe.send(Msg::from_body(&b"keepalive"[..])).await.is_err() {
                break;
            }
            compio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .detach();

    let _ = server_pipe.recv().await;
    let server_stats = server.stop().await;
    client.stop().await;

    assert_eq!(server_stats.dropped_connections, 1);
}

#[compio::test]
async fn frame_boundary_sizes_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let addr = addr_in(&dir, "t4");
    let options = EndpointOptions::new(0x0031);

    let server = BindEndpoint::bind(addr.clone(), options.clone()).await.unwrap();
    let client = ConnectEndpoint::connect(addr, options);

    let server_pipe = server.accept().await.unwrap();
    let client_pipe = client.next().await.unwrap();

    // Exercises the 9-byte frame-header boundary (1/7/8/9) plus a large
    // payload that forces `SegmentedBuffer` to reassemble across more than
    // one underlying read.
    for size in [1usize, 7, 8, 9, 4096, 1 << 20] {
        let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        client_pipe
            .send(Msg::from_body(&payload[..]))
            .await
            .unwrap();
        let received = server_pipe.recv().await.unwrap();
        assert_eq!(received.to_contiguous(), Bytes::from(payload), "size {size}");
    }

    client.stop().await;
    server.stop().await;
}
