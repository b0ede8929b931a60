//! Outbound call budget

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// At most `max_calls` calls start per `period`.
///
/// When the budget is spent the caller sleeps until the oldest call leaves
/// the window, then the whole window is reset. Waiters are served one at a
/// time; a wait that has started always runs to completion.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_calls: usize,
    period: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl FixedWindowLimiter {
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
            calls: Mutex::new(Vec::with_capacity(max_calls.max(1))),
        }
    }

    /// Wait for a slot and record the call. Returns how long the caller slept.
    pub async fn acquire(&self) -> Duration {
        let mut calls = self.calls.lock().await;

        let now = Instant::now();
        calls.retain(|&at| now.duration_since(at) < self.period);

        let mut waited = Duration::ZERO;
        if calls.len() >= self.max_calls {
            if let Some(&oldest) = calls.first() {
                let elapsed = now.duration_since(oldest);
                if elapsed < self.period {
                    waited = self.period - elapsed;
                    tokio::time::sleep(waited).await;
                }
            }
            calls.clear();
        }

        calls.push(Instant::now());
        waited
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
