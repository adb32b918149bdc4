//! Single cancellable delayed task used for the Success/Failed -> Idle revert.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;

/// Owns at most one pending revert.
///
/// Every schedule or cancel bumps the generation. A task that already woke
/// up and is waiting for the controller lock checks its generation before
/// touching state, so aborting alone is not relied upon.
#[derive(Debug, Default)]
pub struct RevertTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl RevertTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending revert with `task`, run after `delay`.
    /// `task` receives the generation it must present when it fires.
    pub fn schedule<F, Fut>(&mut self, delay: Duration, task: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task(generation).await;
        }));
        generation
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Claims a fired revert. Returns false for a stale generation.
    pub fn take_fired(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.handle.is_none() {
            return false;
        }
        self.handle = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RevertTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = RevertTimer::new();
        let counter = fired.clone();
        let generation = timer.schedule(Duration::from_millis(3000), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.take_fired(generation));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = RevertTimer::new();
        let counter = fired.clone();
        let generation = timer.schedule(Duration::from_millis(100), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.take_fired(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_invalidates_previous_generation() {
        let mut timer = RevertTimer::new();
        let first = timer.schedule(Duration::from_millis(100), |_| async {});
        let second = timer.schedule(Duration::from_millis(100), |_| async {});
        assert_ne!(first, second);
        assert!(!timer.take_fired(first));
        assert!(timer.take_fired(second));
        assert!(!timer.take_fired(second));
    }
}
