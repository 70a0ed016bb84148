//! BrowserDriver - the browser automation contract.
//!
//! Everything the helper layer needs from a browser goes through this trait:
//! navigation, element snapshots, clicks, typing, `window` properties and
//! screenshots. Two implementations ship with the crate:
//!
//! - `ChromiumDriver` - real Chromium over CDP (feature `browser`)
//! - [`crate::mock::SimulatedSite`] - in-memory login site for tests

use crate::device::Viewport;
use crate::locator::Selector;
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Native constraint-validation flags of a form control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    /// A required field is empty
    pub value_missing: bool,
    /// The value is not of the expected type (e.g. email)
    #[serde(default)]
    pub type_mismatch: bool,
    /// All constraints pass
    pub valid: bool,
}

impl Validity {
    /// Flags of a valid control
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            value_missing: false,
            type_mismatch: false,
            valid: true,
        }
    }

    /// Flags of an empty required control
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            value_missing: true,
            type_mismatch: false,
            valid: false,
        }
    }
}

/// Point-in-time state of one DOM element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lower-case tag name
    pub tag: String,
    /// `textContent`, trimmed
    #[serde(default)]
    pub text: String,
    /// Rendered with a non-empty box and not hidden by CSS
    pub visible: bool,
    /// Not `disabled`
    pub enabled: bool,
    /// Has the `readonly` attribute
    #[serde(default)]
    pub readonly: bool,
    /// Current `value` for form controls
    #[serde(default)]
    pub value: Option<String>,
    /// Computed CSS `color`, e.g. `rgb(232, 28, 0)`
    #[serde(default)]
    pub color: Option<String>,
    /// Browser-provided `validationMessage`
    #[serde(default)]
    pub validation_message: Option<String>,
    /// Constraint-validation flags for form controls
    #[serde(default)]
    pub validity: Option<Validity>,
}

impl ElementSnapshot {
    /// Create a visible, enabled element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set readonly flag
    #[must_use]
    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set computed colour
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set validation state
    #[must_use]
    pub fn with_validity(mut self, validity: Validity, message: impl Into<String>) -> Self {
        self.validity = Some(validity);
        self.validation_message = Some(message.into());
        self
    }

    /// Whether the element can receive clicks and input
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Abstract driver trait for browser automation
#[async_trait]
pub trait BrowserDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL and wait for the load event
    async fn goto(&mut self, url: &str) -> ProbeResult<()>;

    /// Current top-level URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Resize the layout viewport
    async fn set_viewport(&mut self, viewport: Viewport, mobile: bool) -> ProbeResult<()>;

    /// Snapshot every element matching `selector`, in document order
    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>>;

    /// Click the first element matching `selector`
    async fn click(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Focus the first element matching `selector` and type `text`
    async fn type_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Read `window[name]`; `None` when the property does not exist
    async fn window_property(&self, name: &str) -> ProbeResult<Option<serde_json::Value>>;

    /// Assign `window[name] = value`
    async fn set_window_property(&mut self, name: &str, value: serde_json::Value)
        -> ProbeResult<()>;

    /// PNG screenshot of the viewport; empty when unsupported
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Release the underlying page and context
    async fn close(&mut self) -> ProbeResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snap = ElementSnapshot::new("input")
            .with_value("a@b.c")
            .with_readonly(true)
            .with_validity(Validity::ok(), "");
        assert!(snap.is_actionable());
        assert!(snap.readonly);
        assert_eq!(snap.value.as_deref(), Some("a@b.c"));
        assert_eq!(snap.validity, Some(Validity::ok()));
    }

    #[test]
    fn test_hidden_not_actionable() {
        assert!(!ElementSnapshot::new("a").with_visible(false).is_actionable());
    }

    #[test]
    fn test_snapshot_deserializes_from_page_json() {
        let json = serde_json::json!({
            "tag": "input",
            "text": "",
            "visible": true,
            "enabled": true,
            "readonly": false,
            "value": "",
            "color": "rgb(0, 0, 0)",
            "validationMessage": "Please fill out this field.",
            "validity": { "valueMissing": true, "typeMismatch": false, "valid": false }
        });
        let snap: ElementSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snap.validity, Some(Validity::missing()));
        assert_eq!(
            snap.validation_message.as_deref(),
            Some("Please fill out this field.")
        );
    }

    #[test]
    fn test_snapshot_deserializes_minimal() {
        let json = serde_json::json!({ "tag": "div", "visible": false, "enabled": true });
        let snap: ElementSnapshot = serde_json::from_value(json).unwrap();
        assert!(!snap.visible);
        assert!(snap.validity.is_none());
    }
}
