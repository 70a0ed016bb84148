//! Per-case browser sessions and origin-scoped execution contexts.
//!
//! A [`Session`] owns one isolated browser context. Element access goes
//! through an [`OriginScope`], which first waits for the page to be in the
//! declared origin and then re-checks the origin before every action and
//! assertion. Values cross into a scope only as method arguments.

use crate::config::ProbeConfig;
use crate::device::ViewportProfile;
use crate::driver::BrowserDriver;
use crate::expect::Expectation;
use crate::fixture::{FixtureName, FixtureRegistry};
use crate::flow::LoginFlow;
use crate::locator::Locator;
use crate::origin::Origin;
use crate::result::{ProbeError, ProbeResult};
use crate::selectors::Element;
use crate::wait::{poll_until, Probe, WaitOptions};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Creates one fresh, isolated driver per test case
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new isolated browser context
    async fn new_driver(&self) -> ProbeResult<Box<dyn BrowserDriver>>;

    /// Release resources shared between sessions
    async fn shutdown(&self) -> ProbeResult<()> {
        Ok(())
    }
}

/// One test case's browser session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    driver: Box<dyn BrowserDriver>,
    config: Arc<ProbeConfig>,
    fixtures: Arc<FixtureRegistry>,
    app: Origin,
    identity: Origin,
}

impl Session {
    /// Wrap a freshly opened driver
    pub fn new(
        driver: Box<dyn BrowserDriver>,
        config: Arc<ProbeConfig>,
        fixtures: Arc<FixtureRegistry>,
    ) -> ProbeResult<Self> {
        let app = config.app_origin()?;
        let identity = config.idp_origin()?;
        Ok(Self {
            id: Uuid::new_v4(),
            driver,
            config,
            fixtures,
            app,
            identity,
        })
    }

    /// Open a session from `factory`
    pub async fn open(
        factory: &dyn SessionFactory,
        config: Arc<ProbeConfig>,
        fixtures: Arc<FixtureRegistry>,
    ) -> ProbeResult<Self> {
        let driver = factory.new_driver().await?;
        let session = Self::new(driver, config, fixtures)?;
        tracing::debug!(session = %session.id, "session opened");
        Ok(session)
    }

    /// Unique session id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Fixture registry
    #[must_use]
    pub fn fixtures(&self) -> &FixtureRegistry {
        &self.fixtures
    }

    /// Owned fixture value, so it can be passed into a scope
    pub fn fixture(&self, name: FixtureName) -> ProbeResult<String> {
        self.fixtures.get(name).map(str::to_string)
    }

    /// Application origin
    #[must_use]
    pub const fn app_origin(&self) -> &Origin {
        &self.app
    }

    /// Identity provider origin
    #[must_use]
    pub const fn identity_origin(&self) -> &Origin {
        &self.identity
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Apply a viewport profile
    pub async fn set_viewport(&mut self, profile: &ViewportProfile) -> ProbeResult<()> {
        tracing::debug!(profile = profile.name, viewport = %profile.viewport, "set viewport");
        self.driver
            .set_viewport(profile.viewport, profile.is_mobile)
            .await
    }

    /// Navigate the top-level page; relative paths resolve against the app URL
    pub async fn visit(&mut self, url: &str) -> ProbeResult<()> {
        let target = if url.contains("://") {
            url.to_string()
        } else {
            self.app.join(url)?
        };
        tracing::debug!(url = %target, "visit");
        self.driver.goto(&target).await
    }

    /// Current top-level URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// Screenshot of the current page
    pub async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Wait until the page is in `origin`, returning the URL reached
    pub async fn wait_for_origin(&self, origin: &Origin) -> ProbeResult<String> {
        let driver = self.driver.as_ref();
        let waited_for = format!("page to be in {origin}");
        let reached = poll_until(&self.config.page_load_wait(), &waited_for, || async move {
            let url = driver.current_url().await?;
            Ok(if origin.contains(&url) {
                Probe::Ready(url)
            } else {
                Probe::Pending(format!("page at {url}"))
            })
        })
        .await?;
        Ok(reached.value)
    }

    /// Execution context for `origin`; waits for the page to get there
    pub async fn within(&mut self, origin: &Origin) -> ProbeResult<OriginScope<'_>> {
        let url = self.wait_for_origin(origin).await?;
        tracing::trace!(%origin, %url, "entered origin");
        Ok(OriginScope {
            session: self,
            origin: origin.clone(),
        })
    }

    /// Execution context for the application origin
    pub async fn app(&mut self) -> ProbeResult<OriginScope<'_>> {
        let origin = self.app.clone();
        self.within(&origin).await
    }

    /// Execution context for the identity provider origin
    pub async fn identity(&mut self) -> ProbeResult<OriginScope<'_>> {
        let origin = self.identity.clone();
        self.within(&origin).await
    }

    /// Login-flow helpers bound to this session
    pub fn flow(&mut self) -> LoginFlow<'_> {
        LoginFlow::new(self)
    }

    /// Close the browser context
    pub async fn close(mut self) -> ProbeResult<()> {
        tracing::debug!(session = %self.id, "session closed");
        self.driver.close().await
    }
}

/// Page access restricted to one origin
#[derive(Debug)]
pub struct OriginScope<'s> {
    session: &'s mut Session,
    origin: Origin,
}

impl OriginScope<'_> {
    /// Origin this scope is bound to
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Current URL, failing if the page has left the origin
    pub async fn url(&self) -> ProbeResult<String> {
        let url = self.session.driver.current_url().await?;
        if self.origin.contains(&url) {
            Ok(url)
        } else {
            Err(ProbeError::CrossOrigin {
                expected: self.origin.to_string(),
                actual: url,
            })
        }
    }

    /// Navigate within the origin; relative paths resolve against it
    pub async fn visit(&mut self, url: &str) -> ProbeResult<()> {
        let target = if url.contains("://") {
            url.to_string()
        } else {
            self.origin.join(url)?
        };
        if !self.origin.contains(&target) {
            return Err(ProbeError::CrossOrigin {
                expected: self.origin.to_string(),
                actual: target,
            });
        }
        tracing::debug!(url = %target, "visit");
        self.session.driver.goto(&target).await?;
        self.url().await.map(|_| ())
    }

    fn command_wait(&self) -> WaitOptions {
        self.session.config.command_wait()
    }

    fn configured(&self, element: Element) -> Locator {
        let wait = self.command_wait();
        element
            .locator()
            .with_timeout(wait.timeout())
            .with_poll_interval(wait.poll_interval())
    }

    /// Assertions on a registry element
    pub async fn get(&self, element: Element) -> ProbeResult<Expectation<'_>> {
        let locator = self.configured(element);
        self.locate(locator).await
    }

    /// Assertions on an arbitrary locator, with its own timing
    pub async fn locate(&self, locator: Locator) -> ProbeResult<Expectation<'_>> {
        self.url().await?;
        Ok(Expectation::new(self.session.driver.as_ref(), locator))
    }

    /// Wait until the locator resolves to one visible, enabled element
    async fn wait_actionable(&self, locator: &Locator) -> ProbeResult<()> {
        let options = locator.options();
        let wait = WaitOptions::new()
            .with_timeout(options.timeout.as_millis() as u64)
            .with_poll_interval(options.poll_interval.as_millis() as u64);
        let driver = self.session.driver.as_ref();
        let selector = locator.selector();
        let strict = options.strict;
        let waited_for = format!("{locator} to be actionable");

        let outcome = poll_until(&wait, &waited_for, || async move {
            let matches = driver.query(selector).await?;
            if strict && matches.len() > 1 {
                return Err(ProbeError::StrictModeViolation {
                    selector: selector.to_string(),
                    count: matches.len(),
                });
            }
            Ok(match matches.first() {
                None => Probe::Pending(NOTHING_MATCHED.to_string()),
                Some(el) if !el.visible => Probe::Pending("element is hidden".to_string()),
                Some(el) if !el.enabled => Probe::Pending("element is disabled".to_string()),
                Some(_) => Probe::Ready(()),
            })
        })
        .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(ProbeError::Timeout { last_observed, .. }) if last_observed == NOTHING_MATCHED => {
                Err(ProbeError::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
            Err(ProbeError::Timeout { last_observed, .. }) => Err(ProbeError::NotActionable {
                selector: selector.to_string(),
                reason: last_observed,
            }),
            Err(other) => Err(other),
        }
    }

    /// Click a registry element once it is actionable
    pub async fn click(&mut self, element: Element) -> ProbeResult<()> {
        let locator = self.configured(element);
        self.click_locator(&locator).await
    }

    /// Click any locator once it is actionable
    pub async fn click_locator(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.url().await?;
        self.wait_actionable(locator).await?;
        tracing::debug!(%locator, origin = %self.origin, "click");
        self.session.driver.click(locator.selector()).await
    }

    /// Type into a registry element once it is actionable
    pub async fn type_into(&mut self, element: Element, text: &str) -> ProbeResult<()> {
        let locator = self.configured(element);
        self.url().await?;
        self.wait_actionable(&locator).await?;
        tracing::debug!(%locator, chars = text.chars().count(), "type");
        self.session.driver.type_text(locator.selector(), text).await
    }

    /// Wait until the URL contains `fragment`, failing fast if the origin changes
    pub async fn expect_url_contains(&self, fragment: &str) -> ProbeResult<String> {
        let driver = self.session.driver.as_ref();
        let origin = &self.origin;
        let waited_for = format!("URL to include {fragment:?}");
        let result = poll_until(
            &self.session.config.page_load_wait(),
            &waited_for,
            || async move {
                let url = driver.current_url().await?;
                if !origin.contains(&url) {
                    return Err(ProbeError::CrossOrigin {
                        expected: origin.to_string(),
                        actual: url,
                    });
                }
                Ok(if url.contains(fragment) {
                    Probe::Ready(url)
                } else {
                    Probe::Pending(format!("URL was {url}"))
                })
            },
        )
        .await
        .map_err(|err| match err {
            ProbeError::Timeout {
                ms, last_observed, ..
            } => ProbeError::assertion(format!(
                "expected URL to include {fragment:?}, but {last_observed} (after {ms}ms)"
            )),
            other => other,
        })?;
        Ok(result.value)
    }

    /// Set the completion marker and confirm it reads back
    pub async fn arm_marker(&mut self) -> ProbeResult<()> {
        self.url().await?;
        let marker = self.session.config.marker();
        let wait = self.command_wait();
        marker.arm(self.session.driver.as_mut(), &wait).await
    }

    /// Wait for the completion marker to vanish (reload or navigation)
    pub async fn await_marker_cleared(&self) -> ProbeResult<Duration> {
        let marker = self.session.config.marker();
        marker
            .await_cleared(self.session.driver.as_ref(), &self.session.config.page_load_wait())
            .await
    }
}

const NOTHING_MATCHED: &str = "no element matched";
