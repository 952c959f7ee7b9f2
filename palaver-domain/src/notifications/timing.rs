//! Timing policy for notification presentation.
//!
//! Pure and deterministic: given the same waiter snapshot and clock reading,
//! [`count_timing`] always produces the same result. All the scheduler's
//! deadline decisions funnel through here.

use std::time::Duration;
use tokio::time::Instant;

use palaver_core::config::NotifyTimings;

use super::types::{Timing, Waiter};

/// Computes how long to wait before presenting for a context.
///
/// With no waiter (nothing pending) the delay is the `minimal_delay` floor.
/// With a waiter, the deadline extends to the grouping-window end anchored
/// at the first pending arrival. It is never earlier than the deadline
/// already set, and never beyond `max_group_delay` past the first arrival
/// (unless the existing deadline already is; set deadlines are never
/// shortened).
pub fn count_timing(
    waiter: Option<&Waiter>,
    minimal_delay: Duration,
    timings: &NotifyTimings,
    now: Instant,
) -> Timing {
    let when = match waiter {
        None => now + minimal_delay,
        Some(waiter) => {
            let window_end = waiter.first_pending + timings.grouping_window();
            let cap = waiter.first_pending + timings.max_group_delay();
            waiter.when.max(window_end.min(cap))
        }
    };
    let delay = when.checked_duration_since(now).unwrap_or_default();
    Timing { delay, when }
}
