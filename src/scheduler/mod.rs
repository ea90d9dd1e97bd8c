//! Cooperative polling loops for dispatcher workers.
//!
//! Workers poll the durable queues on a fixed interval; scheduling is
//! driven from application code, never from the store. Each loop adds
//! random jitter so a fleet of workers does not synchronize its polls,
//! and stops promptly when its cancellation token fires.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;

/// Fixed-interval poll loop with jitter and cooperative shutdown.
#[derive(Debug, Clone, Copy)]
pub struct PollLoop {
    interval: Duration,
    jitter: Duration,
}

impl PollLoop {
    /// Creates a poll loop with an explicit interval and jitter bound.
    #[must_use]
    pub const fn new(interval: Duration, jitter: Duration) -> Self {
        Self { interval, jitter }
    }

    /// Creates a poll loop from the scheduler configuration.
    #[must_use]
    pub const fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            jitter: Duration::from_secs(config.jitter_secs),
        }
    }

    /// Runs `tick` on every interval until the token is cancelled.
    ///
    /// Tick failures are logged and the loop keeps going; transient
    /// store failures must not kill a worker.
    pub async fn run<F, Fut, E>(&self, name: &str, cancel: CancellationToken, mut tick: F)
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<(), E>> + Send,
        E: std::fmt::Display,
    {
        tracing::info!(worker = name, "poll loop started");
        loop {
            let delay = self.interval + self.next_jitter();
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!(worker = name, "poll loop stopped");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            if let Err(err) = tick().await {
                tracing::warn!(worker = name, error = %err, "poll tick failed");
            }
        }
    }

    fn next_jitter(&self) -> Duration {
        let bound = self.jitter.as_millis();
        if bound == 0 {
            return Duration::ZERO;
        }
        let bound = u64::try_from(bound).unwrap_or(u64::MAX);
        let jitter_ms = rand::thread_rng().gen_range(0..=bound);
        Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::PollLoop;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_ticks_until_cancelled() {
        let ticks = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let poll = PollLoop::new(Duration::from_millis(5), Duration::ZERO);

        let counter = Arc::clone(&ticks);
        let token = cancel.clone();
        let worker = tokio::spawn(async move {
            poll.run("test", token, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), std::io::Error>(())
                }
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        worker.await.expect("worker should stop cleanly");

        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tick_failures_do_not_stop_the_loop() {
        let ticks = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let poll = PollLoop::new(Duration::from_millis(5), Duration::ZERO);

        let counter = Arc::clone(&ticks);
        let token = cancel.clone();
        let worker = tokio::spawn(async move {
            poll.run("flaky", token, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), std::io::Error>(std::io::Error::other("store unavailable"))
                }
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        worker.await.expect("worker should stop cleanly");

        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }
}
