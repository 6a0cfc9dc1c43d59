//! Trailing-edge debouncer for search-triggered reloads.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs only the last action scheduled within `delay`.
///
/// Each [`schedule`](Self::schedule) restarts the timer and drops the action
/// still waiting on it. Once the timer fires the action runs as its own task,
/// so later schedules, [`cancel`](Self::cancel) and drop never interrupt an
/// action that has already started. Requires a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        }));
    }

    /// Stop the timer, if running. Returns whether an action was waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether an action is waiting on the timer.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_action(
        counter: &Arc<AtomicUsize>,
        value: usize,
    ) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(value, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_action_of_a_burst_runs() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(counter_action(&fired, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(counter_action(&fired, 10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(counter_action(&fired, 100));

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 100);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_the_pending_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.schedule(counter_action(&fired, 1));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        debouncer.schedule(counter_action(&fired, 1));
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_does_not_interrupt_a_started_action() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        let action = |started: &Arc<AtomicUsize>, finished: &Arc<AtomicUsize>, work: u64| {
            let (started, finished) = (Arc::clone(started), Arc::clone(finished));
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(work)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };

        debouncer.schedule(action(&started, &finished, 1_000));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());

        debouncer.schedule(action(&started, &finished, 0));
        assert!(debouncer.cancel());
        debouncer.schedule(action(&started, &finished, 0));
        drop(debouncer);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
