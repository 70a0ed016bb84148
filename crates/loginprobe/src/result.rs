//! Result and error types for loginprobe.

use thiserror::Error;

/// Result type for loginprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving or asserting on the login flow
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A wait or auto-retrying assertion ran out of time
    #[error("Timed out after {ms}ms waiting for {waited_for} (last observed: {last_observed})")]
    Timeout {
        /// What was being waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Last state seen before giving up
        last_observed: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// No element matched the selector
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Selector that matched nothing
        selector: String,
    },

    /// More than one element matched a strict locator
    #[error("Strict mode violation: {selector} matched {count} elements")]
    StrictModeViolation {
        /// Selector
        selector: String,
        /// Number of matches
        count: usize,
    },

    /// Element exists but cannot be interacted with
    #[error("Element {selector} is not actionable: {reason}")]
    NotActionable {
        /// Selector
        selector: String,
        /// Why the element was rejected
        reason: String,
    },

    /// Page is not in the origin the caller declared
    #[error("Cross-origin access: expected {expected}, page is at {actual}")]
    CrossOrigin {
        /// Declared origin
        expected: String,
        /// URL the page is actually on
        actual: String,
    },

    /// A fixture needed by a case is not available
    #[error("Fixture {name} unavailable: set the {variable} environment variable")]
    MissingFixture {
        /// Logical fixture name
        name: String,
        /// Environment variable that supplies it
        variable: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// URL could not be parsed
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parser message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }
}
