//! One-shot auto-close timer for the success step.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Default delay between order confirmation and the checkout closing itself.
pub const DEFAULT_AUTO_CLOSE_DELAY: Duration = Duration::from_millis(3000);

/// A spawned task that runs a callback once after a delay.
///
/// Dropping the timer (or calling [`cancel`](Self::cancel)) aborts the task,
/// so the callback never runs for a checkout that was closed early.
#[derive(Debug)]
pub struct AutoCloseTimer {
    handle: Option<JoinHandle<()>>,
}

impl AutoCloseTimer {
    /// Spawn the timer on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the timer if it has not fired yet.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Let the task run to completion without keeping a handle to it.
    pub fn detach(mut self) {
        self.handle = None;
    }
}

impl Drop for AutoCloseTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn flag() -> (Arc<AtomicBool>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&fired);
        (fired, move || setter.store(true, Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (fired, on_fire) = flag();
        let _timer = AutoCloseTimer::spawn(DEFAULT_AUTO_CLOSE_DELAY, on_fire);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (fired, on_fire) = flag();
        let timer = AutoCloseTimer::spawn(DEFAULT_AUTO_CLOSE_DELAY, on_fire);
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_prevents_firing() {
        let (fired, on_fire) = flag();
        drop(AutoCloseTimer::spawn(Duration::from_millis(10), on_fire));

        tokio::time::sleep(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_timer_still_fires() {
        let (fired, on_fire) = flag();
        AutoCloseTimer::spawn(Duration::from_millis(10), on_fire).detach();

        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }
}
