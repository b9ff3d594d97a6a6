//! Integration tests for `EndpointOptions` and the reconnect backoff it
//! configures, exercised through the crate's public API rather than its
//! internal module boundaries.

use ipcfsm_core::backoff::Backoff;
use ipcfsm_core::options::EndpointOptions;
use std::time::Duration;

#[test]
fn builder_produces_options_a_backoff_can_consume() {
    let opts = EndpointOptions::new(0x0031)
        .with_reconnect_ivl(Duration::from_millis(100))
        .with_reconnect_ivl_max(Duration::from_millis(800))
        .with_sndbuf(65536)
        .with_rcvbuf(65536)
        .with_handshake_timeout(Duration::from_millis(500));

    assert_eq!(opts.sndbuf, 65536);
    assert_eq!(opts.rcvbuf, 65536);
    assert_eq!(opts.handshake_timeout, Duration::from_millis(500));

    let mut backoff = Backoff::from_options(&opts);
    let delays: Vec<_> = (0..5).map(|_| backoff.next_delay()).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(800),
            Duration::from_millis(800),
        ]
    );
}

#[test]
fn unset_max_pins_backoff_to_the_base_interval() {
    let opts = EndpointOptions::default().with_reconnect_ivl(Duration::from_millis(50));
    let mut backoff = Backoff::from_options(&opts);
    assert_eq!(backoff.next_delay(), Duration::from_millis(50));
    assert_eq!(backoff.next_delay(), Duration::from_millis(50));
}

#[test]
fn buffer_sizes_default_to_os_managed() {
    let opts = EndpointOptions::default();
    assert_eq!(opts.sndbuf, 0);
    assert_eq!(opts.rcvbuf, 0);
}
