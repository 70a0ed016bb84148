//! Page objects for the pages the login flow crosses.
//!
//! A page is recognised by its origin plus a ready element that only it
//! renders. The harness uses [`identify`] to report where a failing case
//! stopped.

use crate::result::ProbeResult;
use crate::selectors::Element;
use crate::session::Session;
use serde::Serialize;
use std::fmt;

/// Which origin a page is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The application
    App,
    /// The identity provider
    Identity,
}

/// Trait for page objects representing a page in the flow
pub trait PageObject {
    /// Origin the page lives on
    fn side(&self) -> Side;

    /// Element whose presence means the page has rendered
    fn ready_element(&self) -> Element;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Pages of the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginPage {
    /// Application home page with the navigation
    Home,
    /// Identity provider email step
    EmailStep,
    /// Identity provider password step
    PasswordStep,
    /// Post-login dashboard
    Dashboard,
}

impl LoginPage {
    /// Most specific first, so the password step wins over the email step
    pub const DETECTION_ORDER: [Self; 4] =
        [Self::Dashboard, Self::PasswordStep, Self::EmailStep, Self::Home];
}

impl PageObject for LoginPage {
    fn side(&self) -> Side {
        match self {
            Self::Home | Self::Dashboard => Side::App,
            Self::EmailStep | Self::PasswordStep => Side::Identity,
        }
    }

    fn ready_element(&self) -> Element {
        match self {
            Self::Home => Element::LoginButton,
            Self::EmailStep => Element::EmailField,
            Self::PasswordStep => Element::PasswordField,
            Self::Dashboard => Element::DashboardRoot,
        }
    }

    fn page_name(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::EmailStep => "email step",
            Self::PasswordStep => "password step",
            Self::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for LoginPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.page_name())
    }
}

/// Which page the session is on right now, if any
pub async fn identify(session: &Session) -> ProbeResult<Option<LoginPage>> {
    let url = session.current_url().await?;
    for page in LoginPage::DETECTION_ORDER {
        let origin = match page.side() {
            Side::App => session.app_origin(),
            Side::Identity => session.identity_origin(),
        };
        if !origin.contains(&url) {
            continue;
        }
        let found = session
            .driver()
            .query(&page.ready_element().selector())
            .await?;
        if !found.is_empty() {
            return Ok(Some(page));
        }
    }
    Ok(None)
}
