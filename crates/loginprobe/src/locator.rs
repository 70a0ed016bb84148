//! Locator abstraction for element selection.
//!
//! A [`Locator`] pairs a [`Selector`] with auto-wait options. Locators are
//! strict: an action fails if more than one element matches. The selector is
//! rendered into a JavaScript expression that collects every match, so the
//! same selector value drives both the Chromium driver and the simulated site.

use std::fmt;
use std::time::Duration;

/// Default timeout for auto-waiting (4 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "#username")
    Css(String),
    /// Text content selector
    Text(String),
    /// CSS selector filtered by contained text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Attribute-equals selector, e.g. `[value="a@b.c"]`
    #[must_use]
    pub fn attribute_equals(attribute: &str, value: &str) -> Self {
        Self::Css(format!("[{attribute}=\"{}\"]", escape_attribute_value(value)))
    }

    /// The CSS part of the selector, if any
    #[must_use]
    pub fn css_part(&self) -> Option<&str> {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => Some(css),
            Self::Text(_) => None,
        }
    }

    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_collect_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('body *')).filter(el => el.children.length === 0 && el.textContent.includes({t:?}))"
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({css:?})).filter(el => el.textContent.includes({text:?}))"
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text={t:?}"),
            Self::CssWithText { css, text } => write!(f, "{css} >> text={text:?}"),
        }
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector
#[must_use]
pub fn escape_attribute_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            // CSS newlines end a string token; escape them as hex code points
            '\n' => escaped.push_str("\\a "),
            '\r' => escaped.push_str("\\d "),
            '\u{c}' => escaped.push_str("\\c "),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match for actions
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

/// A locator for finding and interacting with elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Filter by text content
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css(css) | Selector::CssWithText { css, .. } => Selector::CssWithText {
                css,
                text: text.into(),
            },
            Selector::Text(_) => Selector::Text(text.into()),
        };
        Self {
            selector,
            options: self.options,
        }
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.options.poll_interval = poll_interval;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selector.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_collect_query() {
            let query = Selector::css("#username").to_collect_query();
            assert_eq!(query, r##"Array.from(document.querySelectorAll("#username"))"##);
        }

        #[test]
        fn test_attribute_selector_quotes_value() {
            let selector = Selector::attribute_equals("value", "a@b.com");
            assert_eq!(selector, Selector::Css(r#"[value="a@b.com"]"#.to_string()));
        }

        #[test]
        fn test_attribute_selector_escapes_quotes() {
            let selector = Selector::attribute_equals("value", r#"x"y\z"#);
            assert_eq!(selector.css_part(), Some(r#"[value="x\"y\\z"]"#));
        }

        #[test]
        fn test_text_selector_has_no_css() {
            assert!(Selector::text("Log In").css_part().is_none());
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("h1").to_string(), "h1");
            let with_text = Selector::CssWithText {
                css: "h1".into(),
                text: "Log In".into(),
            };
            assert_eq!(with_text.to_string(), r#"h1 >> text="Log In""#);
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let locator = Locator::new("#password");
            assert!(locator.options().strict);
            assert_eq!(locator.options().timeout, Duration::from_millis(4000));
            assert_eq!(locator.selector(), &Selector::css("#password"));
        }

        #[test]
        fn test_with_text_keeps_css() {
            let locator = Locator::new("h1").with_text("Log In");
            assert_eq!(locator.selector().css_part(), Some("h1"));
        }

        #[test]
        fn test_builder_options() {
            let locator = Locator::new("a")
                .with_timeout(Duration::from_secs(9))
                .with_poll_interval(Duration::from_millis(10));
            assert_eq!(locator.options().timeout, Duration::from_secs(9));
            assert_eq!(locator.options().poll_interval, Duration::from_millis(10));
            assert!(locator.options().strict);
        }
    }

    mod escape_props {
        use super::*;
        use proptest::prelude::*;

        /// No `"` that would end the attribute value early, and no raw CSS newline
        fn stays_inside_quotes(escaped: &str) -> bool {
            let mut chars = escaped.chars();
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if chars.next().is_none() {
                            return false;
                        }
                    }
                    '"' | '\n' | '\r' | '\u{c}' => return false,
                    _ => {}
                }
            }
            true
        }

        proptest! {
            #[test]
            fn escaped_values_stay_quoted(value in any::<String>()) {
                prop_assert!(stays_inside_quotes(&escape_attribute_value(&value)));
            }

            #[test]
            fn newlines_become_hex_escapes(
                prefix in "[a-z]{0,8}",
                newline in prop::sample::select(vec!['\n', '\r', '\u{c}']),
            ) {
                let escaped = escape_attribute_value(&format!("{prefix}{newline}"));
                let expected = match newline {
                    '\n' => "\\a ",
                    '\r' => "\\d ",
                    _ => "\\c ",
                };
                prop_assert_eq!(escaped, format!("{prefix}{expected}"));
            }

            #[test]
            fn plain_values_are_unchanged(value in "[a-zA-Z0-9@._-]{0,40}") {
                prop_assert_eq!(escape_attribute_value(&value), value);
            }
        }
    }
}
