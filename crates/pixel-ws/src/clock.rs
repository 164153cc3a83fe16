//! Clock seam for reconnect waits and cooldown timestamps.
//!
//! - `SystemClock`: real `tokio::time`
//! - `MockClock`: manual time; `sleep()` returns at once, advances the clock
//!   and records the requested duration

#[cfg(any(test, feature = "test-support"))]
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

#[allow(async_fn_in_trait)]
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Arc<Mutex<MockClockInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Debug)]
struct MockClockInner {
    current: Instant,
    sleeps: Vec<Duration>,
}

#[cfg(any(test, feature = "test-support"))]
impl MockClock {
    /// Fixed at `Instant::now()` at construction time.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockClockInner {
                current: Instant::now(),
                sleeps: Vec::new(),
            })),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.inner.lock().unwrap().current += duration;
    }

    /// Every duration passed to `sleep()`, oldest first.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().sleeps.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap().current
    }

    async fn sleep(&self, duration: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.sleeps.push(duration);
        inner.current += duration;
    }
}
