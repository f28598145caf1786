// src/timer.rs

//! Timer source abstraction for per-attempt timeouts.

use std::time::Duration;

use crate::exec::BoxFuture;

/// Produces one-shot signals that complete after a duration.
///
/// A zero duration yields a signal that never fires.
pub trait TimerSource: Send + Sync + 'static {
    fn timer(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall-clock timers on the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl TimerSource for TokioTimer {
    fn timer(&self, duration: Duration) -> BoxFuture<'static, ()> {
        if duration.is_zero() {
            Box::pin(std::future::pending())
        } else {
            Box::pin(tokio::time::sleep(duration))
        }
    }
}
