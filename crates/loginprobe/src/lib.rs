//! Loginprobe: browser end-to-end checks for a hosted login flow
//!
//! The application under test hands its login off to a separate identity
//! provider origin. Loginprobe drives that flow through a browser and checks
//! what a user sees at each step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      LOGINPROBE Architecture                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌─────────────┐   ┌────────┐   │
//! │  │ TestSuite  │──►│ LoginFlow  │──►│ OriginScope │──►│ Driver │   │
//! │  │ (suite)    │   │ (flow)     │   │ (session)   │   │ CDP or │   │
//! │  │            │   │            │   │ + expect    │   │ mock   │   │
//! │  └────────────┘   └────────────┘   └─────────────┘   └────────┘   │
//! │        ▲                 │                                         │
//! │  ┌────────────┐   ┌────────────┐                                   │
//! │  │ TestHarness│   │ selectors  │  fixture  config  wait            │
//! │  └────────────┘   └────────────┘                                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use loginprobe::{login_suite, SimulatedSessions, SiteOptions, TestHarness};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let site = SiteOptions::default();
//! let factory = SimulatedSessions::new(site.clone());
//! let results = TestHarness::new()
//!     .run(
//!         &login_suite(),
//!         &factory,
//!         Arc::new(site.probe_config()),
//!         Arc::new(site.fixtures()),
//!     )
//!     .await;
//! assert!(results.all_passed());
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_futures))]

pub mod config;
pub mod device;
pub mod driver;
pub mod expect;
pub mod fixture;
pub mod flow;
pub mod harness;
pub mod locator;
pub mod mock;
pub mod origin;
pub mod page_object;
pub mod report;
pub mod result;
pub mod selectors;
pub mod session;
pub mod suite;
pub mod wait;

/// Chromium over CDP
#[cfg(feature = "browser")]
pub mod browser;

pub use config::{BrowserSettings, LoginEntry, ProbeConfig, TimeoutConfig};
pub use device::{Viewport, ViewportProfile};
pub use driver::{BrowserDriver, ElementSnapshot, Validity};
pub use expect::Expectation;
pub use fixture::{Credentials, FixtureName, FixtureRegistry, Secret};
pub use flow::LoginFlow;
pub use harness::{
    CaseFn, CaseFuture, SuiteResults, TestCase, TestGroup, TestHarness, TestResult, TestSuite,
};
pub use locator::{Locator, LocatorOptions, Selector};
pub use mock::{SimulatedSessions, SimulatedSite, SiteOptions};
pub use origin::Origin;
pub use page_object::{LoginPage, PageObject, Side};
pub use report::ReportFormat;
pub use result::{ProbeError, ProbeResult};
pub use selectors::{Area, Element};
pub use session::{OriginScope, Session, SessionFactory};
pub use suite::login_suite;
pub use wait::{CompletionMarker, WaitOptions};

#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumSessions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::flow::LoginFlow;
    pub use super::harness::{CaseFuture, TestGroup, TestHarness, TestSuite};
    pub use super::result::{ProbeError, ProbeResult};
    pub use super::selectors::Element;
    pub use super::session::{OriginScope, Session, SessionFactory};
}
