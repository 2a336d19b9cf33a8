use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use tokio::{sync::Notify, time::Instant};

/// Single-slot hand-off used to wake the control loop.
///
/// At most one advance is ever outstanding: signalling while a token is
/// already pending does nothing. Waking and consuming are separate so the
/// control loop can take the token inside the same critical section that
/// dispatches the next track.
#[derive(Debug, Default)]
pub struct AdvanceSignal {
    pending: AtomicBool,
    notify: Notify,
}

impl AdvanceSignal {
    pub fn new() -> Self {
        Default::default()
    }

    /// Deposits a token. Returns `false` when one was already pending.
    pub fn signal_advance(&self) -> bool {
        let deposited = !self.pending.swap(true, Ordering::AcqRel);
        if deposited {
            self.notify.notify_one();
        }
        deposited
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consumes the pending token, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Waits until a token may be available or `timeout` elapses, without
    /// consuming anything. A `true` result can be spurious, callers must
    /// still `take`.
    pub async fn wait(&self, timeout: Duration) -> bool {
        if self.is_pending() {
            return true;
        }

        tokio::time::timeout(timeout, self.notify.notified())
            .await
            .is_ok()
    }

    /// Blocks until a token is available and consumes it, or gives up after
    /// `timeout`.
    pub async fn await_advance(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            if self.take() {
                return true;
            }

            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return self.take();
            }
        }
    }
}
