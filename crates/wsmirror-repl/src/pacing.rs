//! Self-imposed throttle between remote mutations.
//!
//! Every mutation is followed by a fixed pause, success or failure. This
//! keeps a long run under the remote's rate limits proactively instead of
//! relying only on reactive retry-after handling.

use std::time::Duration;
use tokio::time::sleep;

/// Post-call delays, per entity kind.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// After each role create/delete.
    pub role: Duration,
    /// After each category or channel create/delete.
    pub channel: Duration,
    /// After each emoji create/delete.
    pub emoji: Duration,
    /// After each sticker create/delete.
    pub sticker: Duration,
    /// After each webhook create.
    pub webhook: Duration,
    /// After the batched profile update.
    pub profile: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            role: Duration::from_millis(400),
            channel: Duration::from_millis(400),
            emoji: Duration::from_millis(500),
            sticker: Duration::from_millis(600),
            webhook: Duration::from_millis(500),
            profile: Duration::from_millis(400),
        }
    }
}

impl Pacing {
    /// No delays at all. For tests.
    pub fn zero() -> Self {
        Self {
            role: Duration::ZERO,
            channel: Duration::ZERO,
            emoji: Duration::ZERO,
            sticker: Duration::ZERO,
            webhook: Duration::ZERO,
            profile: Duration::ZERO,
        }
    }

    /// Pause for the given delay, skipping the timer syscall when zero.
    pub async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
