use std::time::Duration;
use tracing::debug;

/// Wait applied between two attempts of the same item
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BackoffPolicy {
    /// Retry immediately
    #[default]
    NoBackoff,
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * multiplier^(n-1)` before the n-th retry, capped at `max`
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl BackoffPolicy {
    pub fn fixed(delay: Duration) -> Self {
        if delay.is_zero() {
            Self::NoBackoff
        } else {
            Self::Fixed(delay)
        }
    }

    /// Delay before the next attempt, given how many attempts have failed so far
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        match *self {
            Self::NoBackoff => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs.max(0.0))
                }
            }
        }
    }

    /// Sleep for the computed delay; a zero delay returns without yielding to the timer
    pub async fn backoff(&self, failed_attempts: u32) {
        let delay = self.delay_for(failed_attempts);
        if delay.is_zero() {
            return;
        }
        debug!(
            delay_ms = delay.as_millis() as u64,
            failed_attempts, "Backing off before retry"
        );
        tokio::time::sleep(delay).await;
    }
}
