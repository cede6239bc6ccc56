//! Pacing policy between remote model calls.
//!
//! Gemini quotas are enforced per minute, and a book conversion issues one
//! upload + one generation per page for hundreds of pages. The orchestrator
//! therefore rests between pages; how long depends on whose key is paying.

use std::time::Duration;

/// Rest between pages when the caller supplied their own API key.
pub const PAID_TIER_DELAY: Duration = Duration::from_secs(3);

/// Rest between pages on the shared environment key.
pub const FREE_TIER_DELAY: Duration = Duration::from_secs(15);

/// Decides how long the pipeline rests after each page's remote call.
///
/// Consulted once per remote call, success or failure alike, before the next
/// page is touched. Tests substitute a zero-delay implementation so the
/// orchestrator can be exercised without real waits.
pub trait Pacer: Send + Sync {
    /// Interval to wait before proceeding to the next page.
    fn page_delay(&self) -> Duration;
}

/// Fixed-interval pacing derived from the service tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacer {
    delay: Duration,
}

impl FixedPacer {
    /// Pacer with an explicit interval.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Tier-appropriate pacer: [`PAID_TIER_DELAY`] with a caller credential,
    /// [`FREE_TIER_DELAY`] without one.
    pub fn for_tier(paid: bool) -> Self {
        Self {
            delay: if paid { PAID_TIER_DELAY } else { FREE_TIER_DELAY },
        }
    }
}

impl Pacer for FixedPacer {
    fn page_delay(&self) -> Duration {
        self.delay
    }
}
