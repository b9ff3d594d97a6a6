//! RAII guard protecting against partial I/O corruption when a `compio`
//! future is dropped mid-operation.
//!
//! # The problem
//!
//! Every FSM task in this transport drives its I/O inside a `select!` loop
//! (§4.1: "one event at a time"). A `select!` branch that loses the race
//! drops its future, and because `compio` is `io_uring`-backed, the kernel
//! may still be mid-flight on a buffer that future owned. If that happens
//! during a non-atomic write — the three-buffer gather write of a frame
//! header, `msg.hdr`, and `msg.body` (§4.2's PipeBase.send, §6) — the peer
//! can observe a half-written frame with no way to recover the boundary.
//!
//! # The solution
//!
//! `PoisonGuard` is armed (poisoned) for the duration of a logical I/O
//! section and only disarmed once every write in that section has
//! completed. If the guard is dropped while still armed, the flag it holds
//! stays `true` and the caller's next I/O attempt sees the poison and
//! refuses rather than writing into a torn stream.

/// A RAII guard that marks a connection poisoned unless explicitly disarmed.
pub struct PoisonGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> PoisonGuard<'a> {
    /// Arm the guard, immediately marking the connection poisoned.
    #[inline]
    pub fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }

    /// Disarm the guard. Call only once every write in the critical section
    /// has completed successfully.
    #[inline]
    pub fn disarm(self) {
        *self.flag = false;
    }
}
