use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One firing of the capture schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based index since the schedule was started
    pub index: u64,
    pub at: Instant,
}

/// Fixed-interval tick source.
///
/// The first tick fires one full interval after `start`. Ticks are driven by
/// `tokio::time`, so tests can run the schedule on a paused clock. The
/// callback is responsible for its own error handling; nothing it does can
/// end the schedule short of panicking.
pub struct CaptureScheduler {
    task: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
    interval: Duration,
}

impl CaptureScheduler {
    pub fn new() -> Self {
        Self {
            task: None,
            cancel: None,
            interval: Duration::from_secs(1),
        }
    }

    /// Begin firing `on_tick` once per `interval`
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F)
    where
        F: FnMut(Tick) + Send + 'static,
    {
        if self.is_running() {
            warn!("Capture scheduler is already running");
            return;
        }

        let interval = interval.max(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        info!("Starting capture scheduler ({}ms interval)", interval.as_millis());

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut index = 0u64;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    at = ticker.tick() => {
                        index += 1;
                        debug!("Tick {}", index);
                        on_tick(Tick { index, at });
                    }
                }
            }

            debug!("Capture scheduler loop exited after {} ticks", index);
        });

        self.task = Some(task);
        self.cancel = Some(cancel);
        self.interval = interval;
    }

    /// Stop firing. No callback runs after this returns.
    pub async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }

        if let Some(task) = self.task.take() {
            // The callback is synchronous, so once the task is joined no
            // invocation can still be in progress.
            if let Err(e) = task.await {
                warn!("Capture scheduler task ended abnormally: {}", e);
            }
            info!("Capture scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for CaptureScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_interval() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(Duration::from_secs(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(Duration::from_secs(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(2500)).await;
        scheduler.stop().await;
        let after_stop = count.load(Ordering::SeqCst);
        assert_eq!(after_stop, 2);
        assert!(!scheduler.is_running());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_indices_are_sequential() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut scheduler = CaptureScheduler::new();
        scheduler.start(Duration::from_millis(200), move |tick| {
            let _ = tx.send(tick.index);
        });

        sleep(Duration::from_millis(1100)).await;
        scheduler.stop().await;

        let mut indices = Vec::new();
        while let Ok(index) = rx.try_recv() {
            indices.push(index);
        }
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let count = Arc::new(AtomicU64::new(0));

        let mut scheduler = CaptureScheduler::new();
        let counter = Arc::clone(&count);
        scheduler.start(Duration::from_secs(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(1500)).await;
        scheduler.stop().await;

        let counter = Arc::clone(&count);
        scheduler.start(Duration::from_secs(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(1500)).await;
        scheduler.stop().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
