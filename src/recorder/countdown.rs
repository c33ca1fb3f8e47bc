//! Pre-recording countdown
//!
//! Purely time based: once started it always runs to completion.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    from: u32,
    tick: Duration,
}

impl Countdown {
    pub fn new(from: u32, tick: Duration) -> Self {
        Self { from, tick }
    }

    /// Wait one tick period before each value from `from` down to 0,
    /// reporting every value to `on_tick`.
    pub async fn run<F>(&self, mut on_tick: F)
    where
        F: FnMut(u32),
    {
        for remaining in (0..=self.from).rev() {
            tokio::time::sleep(self.tick).await;
            tracing::debug!("Countdown: {}", remaining);
            on_tick(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_to_zero() {
        let countdown = Countdown::new(5, Duration::from_secs(1));
        let mut seen = Vec::new();

        let started = Instant::now();
        countdown.run(|n| seen.push(n)).await;

        assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_countdown_single_tick() {
        let countdown = Countdown::new(0, Duration::from_millis(500));
        let mut seen = Vec::new();

        countdown.run(|n| seen.push(n)).await;

        assert_eq!(seen, vec![0]);
    }
}
