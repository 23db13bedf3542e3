//! Polling helper for conditions produced by background tasks.

use std::time::Duration;

use tokio::time::{sleep, timeout};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Default bound used by [`eventually`].
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Poll `condition` until it holds or [`DEFAULT_WAIT`] elapses.
///
/// # Panics
///
/// Panics if the condition does not hold in time.
pub async fn eventually(condition: impl FnMut() -> bool) {
    eventually_within(DEFAULT_WAIT, condition).await;
}

/// Poll `condition` until it holds or `limit` elapses.
///
/// # Panics
///
/// Panics if the condition does not hold in time.
pub async fn eventually_within(limit: Duration, mut condition: impl FnMut() -> bool) {
    let polled = timeout(limit, async {
        while !condition() {
            sleep(POLL_INTERVAL).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not reached within {limit:?}");
}
