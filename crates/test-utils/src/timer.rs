use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tofail::exec::BoxFuture;
use tofail::timer::TimerSource;

/// A timer source that only fires when the test says so.
///
/// Each `fire()` releases exactly one pending (or the next requested) timer.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<Duration>>,
    fire: Notify,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.inner.fire.notify_one();
    }

    /// Durations of all timers requested so far.
    pub fn requests(&self) -> Vec<Duration> {
        self.inner.requests.lock().unwrap().clone()
    }
}

impl TimerSource for ManualTimer {
    fn timer(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.inner.requests.lock().unwrap().push(duration);
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.fire.notified().await })
    }
}
