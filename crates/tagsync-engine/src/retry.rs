//! Bounded retry for eventual-consistency failures.
//!
//! A resource created a moment ago may not be visible to its service's tagging API
//! yet. Calls failing that way are retried with exponential backoff until a window
//! closes; every other failure ends the loop at once.

use std::future::Future;
use std::time::Duration;

use tagsync_config::RetrySettings;
use tagsync_core::ApiError;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

const DEFAULT_WINDOW: Duration = Duration::from_secs(120);
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// How long, and how often, a call is retried while the resource is not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    window: Duration,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// A policy retrying for `window` with the default backoff.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// A policy making exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Builds a policy from configured defaults and an effective window.
    pub fn from_settings(settings: &RetrySettings, window: Duration) -> Self {
        Self::new(window)
            .with_initial_delay(settings.initial_delay())
            .with_max_delay(settings.max_delay())
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn retries_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Delay before retry number `attempt` (0-indexed): doubles each time, capped at
    /// the maximum delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// Why a retried call gave up.
#[derive(Debug)]
pub enum RetryError {
    /// The call failed with a non-transient error.
    Permanent(ApiError),
    /// The window closed while the call still failed transiently.
    Exhausted {
        last: ApiError,
        attempts: u32,
        elapsed: Duration,
    },
    /// The cancellation signal fired.
    Cancelled,
}

/// Runs `call` until it succeeds, fails permanently, the window closes, or `cancel`
/// flips to `true`. Returns the number of attempts on success.
///
/// The first attempt is immediate. A final attempt is made when the window closes,
/// so a resource becoming visible exactly at the deadline still succeeds.
pub async fn retry_transient<F, Fut, P>(
    policy: &RetryPolicy,
    is_transient: P,
    cancel: &mut Option<watch::Receiver<bool>>,
    mut call: F,
) -> Result<u32, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
    P: Fn(&ApiError) -> bool,
{
    let started = Instant::now();
    let deadline = started + policy.window;
    let mut attempts: u32 = 0;

    loop {
        if is_cancelled(cancel) {
            return Err(RetryError::Cancelled);
        }

        attempts += 1;
        let err = match call().await {
            Ok(()) => {
                debug!(attempts, "Tag call succeeded");
                return Ok(attempts);
            }
            Err(err) => err,
        };

        if !is_transient(&err) {
            return Err(RetryError::Permanent(err));
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RetryError::Exhausted {
                last: err,
                attempts,
                elapsed: now - started,
            });
        }

        let delay = policy.delay_for(attempts - 1).min(deadline - now);
        warn!(
            attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Resource not visible to tagging API yet, retrying"
        );
        if wait(delay, cancel).await {
            return Err(RetryError::Cancelled);
        }
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleeps for `delay`; returns `true` if cancelled while waiting.
async fn wait(delay: Duration, cancel: &mut Option<watch::Receiver<bool>>) -> bool {
    let deadline = Instant::now() + delay;
    let Some(rx) = cancel.as_mut() else {
        sleep_until(deadline).await;
        return false;
    };

    loop {
        tokio::select! {
            biased;

            changed = rx.changed() => match changed {
                Ok(()) if *rx.borrow_and_update() => return true,
                Ok(()) => {}
                Err(_) => {
                    // Sender dropped: nobody can cancel any more.
                    sleep_until(deadline).await;
                    return false;
                }
            },
            _ = sleep_until(deadline) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn not_found() -> ApiError {
        ApiError::new("InvalidInstanceID.NotFound", "instance does not exist")
    }

    fn transient(err: &ApiError) -> bool {
        err.code.contains(".NotFound")
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let p = RetryPolicy::new(Duration::from_secs(60))
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(3));
        assert_eq!(p.delay_for(0), Duration::from_millis(500));
        assert_eq!(p.delay_for(1), Duration::from_millis(1000));
        assert_eq!(p.delay_for(2), Duration::from_millis(2000));
        assert_eq!(p.delay_for(3), Duration::from_secs(3));
        assert_eq!(p.delay_for(40), Duration::from_secs(3));
    }

    #[test]
    fn test_policy_from_settings() {
        let settings = RetrySettings {
            window_secs: 120,
            initial_delay_ms: 100,
            max_delay_ms: 800,
        };
        let p = RetryPolicy::from_settings(&settings, Duration::from_secs(300));
        assert_eq!(p.window(), Duration::from_secs(300));
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(5), Duration::from_millis(800));
        assert!(!RetryPolicy::no_retry().retries_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry_transient(&RetryPolicy::default(), transient, &mut None, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { if n < 3 { Err(not_found()) } else { Ok(()) } }
        })
        .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry_transient(&RetryPolicy::default(), transient, &mut None, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::new("UnauthorizedOperation", "denied")) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Permanent(e)) if e.code == "UnauthorizedOperation"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_closes() {
        let window = Duration::from_secs(10);
        let started = Instant::now();
        let result = retry_transient(&RetryPolicy::new(window), transient, &mut None, || async {
            Err(not_found())
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, elapsed, .. }) => {
                assert!(attempts > 1);
                assert!(elapsed >= window && elapsed < window + Duration::from_secs(1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(started.elapsed() < window + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_makes_one_attempt() {
        let result = retry_transient(&RetryPolicy::no_retry(), transient, &mut None, || async {
            Err(not_found())
        })
        .await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let (tx, rx) = watch::channel(false);
        let mut cancel = Some(rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            let _ = tx.send(true);
        });

        let started = Instant::now();
        let result = retry_transient(&RetryPolicy::default(), transient, &mut cancel, || async {
            Err(not_found())
        })
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_does_not_cancel() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry_transient(&RetryPolicy::default(), transient, &mut Some(rx), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { Err(not_found()) } else { Ok(()) } }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }
}
