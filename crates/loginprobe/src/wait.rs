//! Wait mechanisms for synchronization.
//!
//! [`poll_until`] is the one polling loop every auto-wait in the crate runs
//! on. [`CompletionMarker`] builds the submit synchronisation on top of it:
//! tag the `window`, trigger the submit, then wait for the tag to vanish,
//! which only happens once the page has reloaded or navigated.

use crate::driver::BrowserDriver;
use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for wait operations (4 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 4000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default name of the completion marker property
pub const DEFAULT_MARKER: &str = "beforeReload";

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the given timeout and poll interval
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition met
    Ready(T),
    /// Not yet; carries what was observed for the timeout message
    Pending(String),
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the final probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes made
    pub attempts: usize,
}

/// Poll `probe` until it is ready or `options.timeout_ms` elapses.
///
/// The probe always runs at least once, even with a zero timeout. Errors
/// from the probe end the wait immediately.
pub async fn poll_until<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> ProbeResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Probe<T>>>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match probe().await? {
            Probe::Ready(value) => {
                return Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                });
            }
            Probe::Pending(observed) => {
                if start.elapsed() >= options.timeout() {
                    tracing::debug!(waited_for, attempts, "wait timed out");
                    return Err(ProbeError::Timeout {
                        waited_for: waited_for.to_string(),
                        ms: options.timeout_ms,
                        last_observed: observed,
                    });
                }
            }
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Transient `window` property used to detect that a submit has finished.
///
/// A fixed sleep is either too short (flaky) or too long (slow); polling for
/// the property's disappearance waits exactly as long as the page takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionMarker {
    name: String,
}

impl Default for CompletionMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl CompletionMarker {
    /// Marker stored under `window[name]`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the marker and confirm the page reports it as `true`
    pub async fn arm(&self, driver: &mut dyn BrowserDriver, options: &WaitOptions) -> ProbeResult<()> {
        driver
            .set_window_property(&self.name, serde_json::Value::Bool(true))
            .await?;
        let driver: &dyn BrowserDriver = driver;
        let waited_for = format!("window.{} to be true", self.name);
        poll_until(options, &waited_for, || async move {
            Ok(match driver.window_property(&self.name).await? {
                Some(serde_json::Value::Bool(true)) => Probe::Ready(()),
                other => Probe::Pending(format!("{other:?}")),
            })
        })
        .await?;
        Ok(())
    }

    /// Wait until the marker property no longer exists on `window`
    pub async fn await_cleared(
        &self,
        driver: &dyn BrowserDriver,
        options: &WaitOptions,
    ) -> ProbeResult<Duration> {
        let waited_for = format!("window.{} to be cleared", self.name);
        let result = poll_until(options, &waited_for, || async move {
            Ok(match driver.window_property(&self.name).await? {
                None => Probe::Ready(()),
                Some(value) => Probe::Pending(format!("window.{} = {value}", self.name)),
            })
        })
        .await?;
        tracing::debug!(marker = %self.name, elapsed_ms = result.elapsed.as_millis() as u64, "page settled");
        Ok(result.elapsed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, 4000);
            assert_eq!(options.poll_interval_ms, 50);
        }

        #[test]
        fn test_builders() {
            let options = WaitOptions::new().with_timeout(10).with_poll_interval(1);
            assert_eq!(options.timeout(), Duration::from_millis(10));
            assert_eq!(options.poll_interval(), Duration::from_millis(1));
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_ready_on_first_probe() {
            let result = poll_until(&WaitOptions::new(), "instant", || async {
                Ok(Probe::Ready(7))
            })
            .await
            .unwrap();
            assert_eq!(result.value, 7);
            assert_eq!(result.attempts, 1);
        }

        #[tokio::test]
        async fn test_ready_after_retries() {
            let calls = AtomicUsize::new(0);
            let options = WaitOptions::new().with_poll_interval(1);
            let result = poll_until(&options, "third call", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(if n >= 2 {
                        Probe::Ready(n)
                    } else {
                        Probe::Pending(format!("call {n}"))
                    })
                }
            })
            .await
            .unwrap();
            assert_eq!(result.value, 2);
            assert_eq!(result.attempts, 3);
        }

        #[tokio::test]
        async fn test_timeout_reports_last_observation() {
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = poll_until::<(), _, _>(&options, "never", || async {
                Ok(Probe::Pending("still nothing".into()))
            })
            .await
            .unwrap_err();
            match err {
                ProbeError::Timeout {
                    waited_for,
                    ms,
                    last_observed,
                } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(ms, 20);
                    assert_eq!(last_observed, "still nothing");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_zero_timeout_still_probes_once() {
            let options = WaitOptions::new().with_timeout(0);
            let result = poll_until(&options, "once", || async { Ok(Probe::Ready(())) }).await;
            assert!(result.is_ok());
        }

        #[tokio::test]
        async fn test_probe_error_aborts() {
            let calls = AtomicUsize::new(0);
            let err = poll_until::<(), _, _>(&WaitOptions::new(), "err", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProbeError::page("gone")) }
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::PageError { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_marker_name() {
        assert_eq!(CompletionMarker::default().name(), "beforeReload");
        assert_eq!(CompletionMarker::new("x").name(), "x");
    }
}
