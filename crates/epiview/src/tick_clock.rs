//! Monotonic tick clock for playback pacing
//!
//! Fires once per period on tokio's clock. A clock exists only while playback
//! is running; the controller drops it on pause or stop, so there is never
//! more than one source of ticks.
//!
//! Deadlines advance by whole periods from the start instant. If the loop
//! falls behind (a slow render, a blocked terminal) missed ticks are skipped
//! rather than delivered in a burst.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct TickClock {
    period: Duration,

    /// When the next tick is due
    next_deadline: Instant,

    /// Ticks delivered since start
    ticks: u64,
}

impl TickClock {
    /// Start a clock whose first tick fires one period from now.
    pub fn start(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_deadline: Instant::now() + period,
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wait for the next tick.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// deadline untouched, so the next call waits for the same tick.
    pub async fn tick(&mut self) {
        sleep_until(self.next_deadline).await;

        let now = Instant::now();
        let mut next = self.next_deadline + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_deadline = next;
        self.ticks += 1;
    }
}
