//! Endpoint configuration options.
//!
//! Mirrors the `get_option`/`stat_increment`-style tunables named in §6 of
//! the transport's interface contract, plus the ambient buffer-size knobs
//! every `compio`-based transport in this lineage exposes.

use std::time::Duration;

/// Endpoint-level configuration.
///
/// # Examples
///
/// ```
/// use ipcfsm_core::options::EndpointOptions;
/// use std::time::Duration;
///
/// let opts = EndpointOptions::default()
///     .with_reconnect_ivl(Duration::from_millis(100))
///     .with_reconnect_ivl_max(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// `SNDBUF` — socket send buffer size, applied via `setsockopt`.
    pub sndbuf: usize,

    /// `RCVBUF` — socket receive buffer size, applied via `setsockopt`.
    pub rcvbuf: usize,

    /// `RECONNECT_IVL` — initial reconnect delay.
    pub reconnect_ivl: Duration,

    /// `RECONNECT_IVL_MAX` — reconnect delay cap. Zero means "use
    /// `reconnect_ivl` for every attempt, no exponential growth."
    pub reconnect_ivl_max: Duration,

    /// `PROTOCOL` — local protocol identifier advertised during the
    /// handshake.
    pub protocol: u16,

    /// Handshake timeout (§4.2, fixed at 1000 ms by the reference transport
    /// but left tunable here for testing).
    pub handshake_timeout: Duration,

    /// Read buffer size for arena-allocated `compio` reads.
    pub read_buffer_size: usize,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            sndbuf: 0,
            rcvbuf: 0,
            reconnect_ivl: Duration::from_millis(100),
            reconnect_ivl_max: Duration::ZERO,
            protocol: 0,
            handshake_timeout: Duration::from_millis(1000),
            read_buffer_size: 8192,
        }
    }
}

impl EndpointOptions {
    #[must_use]
    pub fn new(protocol: u16) -> Self {
        Self {
            protocol,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_sndbuf(mut self, size: usize) -> Self {
        self.sndbuf = size;
        self
    }

    #[must_use]
    pub const fn with_rcvbuf(mut self, size: usize) -> Self {
        self.rcvbuf = size;
        self
    }

    #[must_use]
    pub const fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = ivl;
        self
    }

    #[must_use]
    pub const fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = max;
        self
    }

    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// The effective max interval: `reconnect_ivl` itself when no max was
    /// configured (§4.6: "if max is 0, use initial as both").
    #[must_use]
    pub fn effective_reconnect_ivl_max(&self) -> Duration {
        if self.reconnect_ivl_max.is_zero() {
            self.reconnect_ivl
        } else {
            self.reconnect_ivl_max
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_transport() {
        let opts = EndpointOptions::default();
        assert_eq!(opts.handshake_timeout, Duration::from_millis(1000));
        assert_eq!(opts.reconnect_ivl, Duration::from_millis(100));
        assert_eq!(opts.reconnect_ivl_max, Duration::ZERO);
    }

    #[test]
    fn effective_max_falls_back_to_base() {
        let opts = EndpointOptions::default().with_reconnect_ivl(Duration::from_millis(250));
        assert_eq!(opts.effective_reconnect_ivl_max(), Duration::from_millis(250));

        let opts = opts.with_reconnect_ivl_max(Duration::from_secs(2));
        assert_eq!(opts.effective_reconnect_ivl_max(), Duration::from_secs(2));
    }

    #[test]
    fn builder_pattern() {
        let opts = EndpointOptions::new(0x0031)
            .with_sndbuf(4096)
            .with_rcvbuf(4096);
        assert_eq!(opts.protocol, 0x0031);
        assert_eq!(opts.sndbuf, 4096);
        assert_eq!(opts.rcvbuf, 4096);
    }

    #[test]
    fn with_read_buffer_size_overrides_default() {
        let opts = EndpointOptions::default().with_read_buffer_size(64 * 1024);
        assert_eq!(opts.read_buffer_size, 64 * 1024);
    }
}
