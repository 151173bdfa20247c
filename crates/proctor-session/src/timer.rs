//! Countdown timer service

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Wall-clock countdown for one session.
///
/// Remaining time is published at one-second granularity; the expiry
/// signal is sent exactly once when the deadline passes. The clock is
/// deadline-driven, so a delayed tick reports the true remaining time
/// rather than drifting with the tick count.
pub struct CountdownTimer {
    remaining: watch::Receiver<Duration>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Start the countdown; `expired` receives one message at zero.
    pub fn start(limit: Duration, expired: mpsc::Sender<()>) -> Self {
        let deadline = Instant::now() + limit;
        let (tx, rx) = watch::channel(limit);

        info!(limit_secs = limit.as_secs(), "countdown started");
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                ticker.tick().await;
                let left = deadline.saturating_duration_since(Instant::now());
                let _ = tx.send(left);

                if left.is_zero() {
                    debug!("countdown reached zero");
                    let _ = expired.send(()).await;
                    break;
                }
            }
        });

        Self {
            remaining: rx,
            handle: Some(handle),
        }
    }

    /// Time left on the clock
    pub fn remaining(&self) -> Duration {
        *self.remaining.borrow()
    }

    /// Watch remaining time for UI updates
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.remaining.clone()
    }

    /// Stop the countdown; a cancelled timer never fires. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("countdown cancelled");
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
