//! Locator registry: logical UI element names mapped to selectors.
//!
//! Elements are grouped by functional area. Names are enum variants, so a
//! helper or case cannot refer to an element the registry does not define.

use crate::locator::{Locator, Selector};
use serde::Serialize;
use std::fmt;

/// Functional area an element belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    /// Application navigation (application origin)
    Navigation,
    /// Identity provider login form (identity origin)
    LoginForm,
    /// Post-login application dashboard
    Dashboard,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Navigation => "navigation",
            Self::LoginForm => "loginForm",
            Self::Dashboard => "dashboard",
        })
    }
}

/// Every element the suite touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Element {
    /// Navigation entry that opens the login sub-menu
    LoginButton,
    /// Sub-menu link that leads to the identity provider
    LoginLink,
    /// Sub-navigation item list
    SubNavMenu,
    /// Primary "Continue" button on both login steps
    ContinueButton,
    /// Error text under the email field
    EmailError,
    /// Email input
    EmailField,
    /// Floating label of the email input
    EmailLabel,
    /// Error icon next to an invalid field
    ErrorIcon,
    /// Error text under the password field
    PasswordError,
    /// Password input
    PasswordField,
    /// Page heading
    Heading,
    /// Any input failing native constraint validation
    InvalidInput,
    /// Dashboard root container
    DashboardRoot,
}

impl Element {
    /// Every registered element, in display order
    pub const ALL: [Self; 13] = [
        Self::LoginButton,
        Self::LoginLink,
        Self::SubNavMenu,
        Self::ContinueButton,
        Self::EmailError,
        Self::EmailField,
        Self::EmailLabel,
        Self::ErrorIcon,
        Self::PasswordError,
        Self::PasswordField,
        Self::Heading,
        Self::InvalidInput,
        Self::DashboardRoot,
    ];

    /// CSS selector for this element
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::LoginButton => r#"[data-qa-id="login-select"]"#,
            Self::LoginLink => r#"[data-qa-id="login-hudl"]"#,
            Self::SubNavMenu => ".mainnav__sub > .subnav__inner > .subnav__group > .subnav__items",
            Self::ContinueButton => r#"[data-action-button-primary="true"]"#,
            Self::EmailError => "#error-element-username",
            Self::EmailField => "#username",
            Self::EmailLabel => r#"[data-dynamic-label-for="username"]"#,
            Self::ErrorIcon => ".ulp-input-error-icon",
            Self::PasswordError => "#error-element-password",
            Self::PasswordField => "#password",
            Self::Heading => "h1",
            Self::InvalidInput => "input:invalid",
            Self::DashboardRoot => "#koMain",
        }
    }

    /// Functional area of this element
    #[must_use]
    pub const fn area(self) -> Area {
        match self {
            Self::LoginButton | Self::LoginLink | Self::SubNavMenu => Area::Navigation,
            Self::DashboardRoot => Area::Dashboard,
            _ => Area::LoginForm,
        }
    }

    /// Registry key, e.g. `loginForm.emailField`
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::LoginButton => "navigation.loginButton",
            Self::LoginLink => "navigation.hudlLoginLink",
            Self::SubNavMenu => "navigation.subNavMenu",
            Self::ContinueButton => "loginForm.continueButton",
            Self::EmailError => "loginForm.emailError",
            Self::EmailField => "loginForm.emailField",
            Self::EmailLabel => "loginForm.emailLabel",
            Self::ErrorIcon => "loginForm.errorIcon",
            Self::PasswordError => "loginForm.passwordError",
            Self::PasswordField => "loginForm.passwordField",
            Self::Heading => "loginForm.heading",
            Self::InvalidInput => "loginForm.invalidInput",
            Self::DashboardRoot => "dashboard",
        }
    }

    /// Selector value for this element
    #[must_use]
    pub fn selector(self) -> Selector {
        Selector::css(self.css())
    }

    /// Locator with default auto-wait options
    #[must_use]
    pub fn locator(self) -> Locator {
        Locator::from_selector(self.selector())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Locator for the read-only field pre-filled with `value`
#[must_use]
pub fn prefilled_field(value: &str) -> Locator {
    Locator::from_selector(Selector::attribute_equals("value", value))
}

/// One row of the registry, for listing
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    /// Functional area
    pub area: Area,
    /// Registry key
    pub key: &'static str,
    /// CSS selector
    pub selector: &'static str,
}

/// Every registry row in display order
#[must_use]
pub fn registry() -> Vec<RegistryEntry> {
    Element::ALL
        .into_iter()
        .map(|e| RegistryEntry {
            area: e.area(),
            key: e.key(),
            selector: e.css(),
        })
        .collect()
}
