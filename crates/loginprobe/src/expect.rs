//! Auto-retrying element assertions.
//!
//! An [`Expectation`] re-queries its locator until the assertion holds or the
//! locator's timeout elapses, so assertions tolerate the page still settling.
//! Assertions chain within one statement:
//!
//! ```ignore
//! scope.get(Element::EmailError)
//!     .to_be_visible().await?
//!     .to_contain_text("Enter a valid email").await?;
//! ```

use crate::driver::{BrowserDriver, ElementSnapshot};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, Probe, WaitOptions};
use std::time::Duration;

/// Assertion builder for one locator
#[derive(Debug, Clone)]
pub struct Expectation<'a> {
    driver: &'a dyn BrowserDriver,
    locator: Locator,
}

impl<'a> Expectation<'a> {
    /// Expectation on `locator` against `driver`
    #[must_use]
    pub fn new(driver: &'a dyn BrowserDriver, locator: Locator) -> Self {
        Self { driver, locator }
    }

    /// Override the retry timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.locator = self.locator.with_timeout(timeout);
        self
    }

    /// The locator under test
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Retry `check` until it passes; a timeout becomes an assertion failure
    async fn holds<P>(&self, expectation: &str, check: P) -> ProbeResult<&Self>
    where
        P: Fn(&[ElementSnapshot]) -> Result<(), String> + Sync,
    {
        let options = self.locator.options();
        let wait = WaitOptions::new()
            .with_timeout(options.timeout.as_millis() as u64)
            .with_poll_interval(options.poll_interval.as_millis() as u64);
        let driver = self.driver;
        let selector = self.locator.selector();
        let check = &check;
        let waited_for = format!("{} {expectation}", self.locator);

        let outcome = poll_until(&wait, &waited_for, || async move {
            let snapshots = driver.query(selector).await?;
            Ok(match check(&snapshots) {
                Ok(()) => Probe::Ready(()),
                Err(observed) => Probe::Pending(observed),
            })
        })
        .await;

        match outcome {
            Ok(_) => {
                tracing::trace!(locator = %self.locator, expectation, "assertion passed");
                Ok(self)
            }
            Err(ProbeError::Timeout {
                ms, last_observed, ..
            }) => Err(ProbeError::assertion(format!(
                "expected {} {expectation}, but {last_observed} (after {ms}ms)",
                self.locator
            ))),
            Err(other) => Err(other),
        }
    }

    /// At least one match, and every match is visible
    pub async fn to_be_visible(&self) -> ProbeResult<&Self> {
        self.holds("to be visible", |els| {
            first(els)?;
            if els.iter().all(|e| e.visible) {
                Ok(())
            } else {
                Err("it is hidden".to_string())
            }
        })
        .await
    }

    /// At least one match, and every match is enabled
    pub async fn to_be_enabled(&self) -> ProbeResult<&Self> {
        self.holds("to be enabled", |els| {
            first(els)?;
            if els.iter().all(|e| e.enabled) {
                Ok(())
            } else {
                Err("it is disabled".to_string())
            }
        })
        .await
    }

    /// Combined text of all matches equals `expected` exactly
    pub async fn to_have_text(&self, expected: &str) -> ProbeResult<&Self> {
        self.holds(&format!("to have text {expected:?}"), |els| {
            first(els)?;
            let actual = combined_text(els);
            if actual == expected {
                Ok(())
            } else {
                Err(format!("text was {actual:?}"))
            }
        })
        .await
    }

    /// Combined text of all matches contains `expected`
    pub async fn to_contain_text(&self, expected: &str) -> ProbeResult<&Self> {
        self.holds(&format!("to contain text {expected:?}"), |els| {
            first(els)?;
            let actual = combined_text(els);
            if actual.contains(expected) {
                Ok(())
            } else {
                Err(format!("text was {actual:?}"))
            }
        })
        .await
    }

    /// Computed `color` of the first match equals `expected`
    pub async fn to_have_color(&self, expected: &str) -> ProbeResult<&Self> {
        self.holds(&format!("to have CSS color {expected:?}"), |els| {
            let el = first(els)?;
            match el.color.as_deref() {
                Some(actual) if normalize_css(actual) == normalize_css(expected) => Ok(()),
                Some(actual) => Err(format!("color was {actual:?}")),
                None => Err("no computed color".to_string()),
            }
        })
        .await
    }

    /// First match carries the `readonly` attribute
    pub async fn to_be_readonly(&self) -> ProbeResult<&Self> {
        self.holds("to have attribute readonly", |els| {
            if first(els)?.readonly {
                Ok(())
            } else {
                Err("it is editable".to_string())
            }
        })
        .await
    }

    /// Exactly `expected` matches
    pub async fn to_have_count(&self, expected: usize) -> ProbeResult<&Self> {
        self.holds(&format!("to have count {expected}"), |els| {
            if els.len() == expected {
                Ok(())
            } else {
                Err(format!("found {}", els.len()))
            }
        })
        .await
    }

    /// First match reports `expected` as its `validationMessage`
    pub async fn to_have_validation_message(&self, expected: &str) -> ProbeResult<&Self> {
        self.holds(&format!("to have validationMessage {expected:?}"), |els| {
            let el = first(els)?;
            match el.validation_message.as_deref() {
                Some(actual) if actual == expected => Ok(()),
                other => Err(format!("validationMessage was {other:?}")),
            }
        })
        .await
    }

    /// First match's validity includes the given flags
    pub async fn to_have_validity(&self, value_missing: bool, valid: bool) -> ProbeResult<&Self> {
        self.holds(
            &format!("to have validity {{ valueMissing: {value_missing}, valid: {valid} }}"),
            |els| {
                let el = first(els)?;
                match el.validity {
                    Some(v) if v.value_missing == value_missing && v.valid == valid => Ok(()),
                    other => Err(format!("validity was {other:?}")),
                }
            },
        )
        .await
    }
}

fn first(els: &[ElementSnapshot]) -> Result<&ElementSnapshot, String> {
    els.first().ok_or_else(|| "no element matched".to_string())
}

fn combined_text(els: &[ElementSnapshot]) -> String {
    els.iter().map(|e| e.text.as_str()).collect::<String>()
}

/// Collapse whitespace so `rgb(232,28,0)` equals `rgb(232, 28, 0)`
fn normalize_css(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase()
}
