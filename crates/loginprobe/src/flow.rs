//! Page-interaction helpers for the login flow.
//!
//! Each helper is one named user action. Helpers either complete with the
//! page in the expected state or return the error that fails the case; none
//! of them retry or recover.
//!
//! ```text
//! Anonymous --open_login_menu--> MenuOpen --navigate_to_login_page--> EmailStep
//! EmailStep --submit_email--> PasswordStep --submit_password--> Dashboard
//! ```
//!
//! Any step may land on a validation error instead; the form can then be
//! resubmitted.

use crate::config::LoginEntry;
use crate::result::ProbeResult;
use crate::selectors::Element;
use crate::session::Session;

/// Login-flow helpers bound to one session
#[derive(Debug)]
pub struct LoginFlow<'s> {
    session: &'s mut Session,
}

impl<'s> LoginFlow<'s> {
    /// Helpers for `session`
    pub fn new(session: &'s mut Session) -> Self {
        Self { session }
    }

    /// Click the navigation's login button so the sub-menu shows.
    ///
    /// Idempotent for visibility: a second call leaves the menu open.
    pub async fn open_login_menu(&mut self) -> ProbeResult<()> {
        tracing::debug!("open login menu");
        self.session.app().await?.click(Element::LoginButton).await
    }

    /// Open the menu, follow the login link and wait for the identity
    /// provider's login page. Returns the URL reached.
    pub async fn navigate_to_login_page(&mut self) -> ProbeResult<String> {
        self.open_login_menu().await?;
        self.session.app().await?.click(Element::LoginLink).await?;
        let url = self
            .session
            .identity()
            .await?
            .expect_url_contains("/login")
            .await?;
        tracing::debug!(%url, "reached login page");
        Ok(url)
    }

    /// Type `email`, press continue and wait for the page to reload.
    pub async fn submit_email(&mut self, email: &str) -> ProbeResult<()> {
        let mut idp = self.session.identity().await?;
        idp.type_into(Element::EmailField, email).await?;
        idp.arm_marker().await?;
        idp.click(Element::ContinueButton).await?;
        let settled = idp.await_marker_cleared().await?;
        tracing::debug!(settled_ms = settled.as_millis() as u64, "email submitted");
        Ok(())
    }

    /// Type `password` and press continue.
    ///
    /// With `sync_password_step` on, also waits for the resulting reload or
    /// navigation the same way [`Self::submit_email`] does.
    pub async fn submit_password(&mut self, password: &str) -> ProbeResult<()> {
        let sync = self.session.config().sync_password_step;
        let mut idp = self.session.identity().await?;
        idp.type_into(Element::PasswordField, password).await?;
        if sync {
            idp.arm_marker().await?;
        }
        idp.click(Element::ContinueButton).await?;
        if sync {
            let settled = idp.await_marker_cleared().await?;
            tracing::debug!(settled_ms = settled.as_millis() as u64, "password submitted");
        }
        Ok(())
    }

    /// Reach the login page by the configured entry strategy
    pub async fn open_login_entry(&mut self) -> ProbeResult<String> {
        match self.session.config().login_entry.clone() {
            LoginEntry::Url(url) => {
                self.session.visit(&url).await?;
                self.session
                    .identity()
                    .await?
                    .expect_url_contains("/login")
                    .await
            }
            LoginEntry::Discover => self.discover_login_entry().await,
        }
    }

    /// Drive the UI from the application home page to the login page and
    /// return its URL, so it can be pinned in configuration.
    pub async fn discover_login_entry(&mut self) -> ProbeResult<String> {
        let home = self.session.config().app_url.clone();
        self.session.visit(&home).await?;
        let url = self.navigate_to_login_page().await?;
        tracing::info!(%url, "discovered login entry");
        Ok(url)
    }

    /// Full login: open the login page, then submit email and password
    pub async fn login(&mut self, email: &str, password: &str) -> ProbeResult<()> {
        self.open_login_entry().await?;
        self.submit_email(email).await?;
        self.submit_password(password).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::fixture::FixtureRegistry;
    use crate::mock::{SimulatedSessions, SiteOptions, DEFAULT_EMAIL, DEFAULT_PASSWORD};
    use crate::result::ProbeError;
    use std::sync::Arc;

    async fn open(options: SiteOptions, tweak: impl FnOnce(&mut ProbeConfig)) -> Session {
        let mut config = options.probe_config();
        tweak(&mut config);
        let factory = SimulatedSessions::new(options.clone());
        Session::open(&factory, Arc::new(config), Arc::new(options.fixtures()))
            .await
            .unwrap()
    }

    async fn count(session: &Session, element: Element) -> usize {
        session
            .driver()
            .query(&element.selector())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_navigate_to_login_page() {
        let mut session = open(SiteOptions::default(), |_| {}).await;
        let url = session.flow().discover_login_entry().await.unwrap();
        assert!(url.starts_with("https://identity.example.test/u/login"), "{url}");
    }

    #[tokio::test]
    async fn test_open_login_menu_twice() {
        let mut session = open(SiteOptions::default(), |_| {}).await;
        session.visit("/").await.unwrap();
        let mut flow = session.flow();
        flow.open_login_menu().await.unwrap();
        flow.open_login_menu().await.unwrap();
        let menu = session
            .driver()
            .query(&Element::SubNavMenu.selector())
            .await
            .unwrap();
        assert!(menu[0].visible);
    }

    #[tokio::test]
    async fn test_submit_email_waits_for_reload() {
        let mut session = open(SiteOptions::default().with_latency(5), |_| {}).await;
        let mut flow = session.flow();
        flow.open_login_entry().await.unwrap();
        flow.submit_email("someone@example.test").await.unwrap();
        // no retrying: the password step must already be there
        assert_eq!(count(&session, Element::PasswordField).await, 1);
    }

    #[tokio::test]
    async fn test_unsynchronised_password_step_returns_early() {
        let mut session = open(SiteOptions::default().with_latency(50), |c| {
            c.sync_password_step = false;
        })
        .await;
        let mut flow = session.flow();
        flow.open_login_entry().await.unwrap();
        flow.submit_email("someone@example.test").await.unwrap();
        flow.submit_password("whatever").await.unwrap();
        assert_eq!(count(&session, Element::PasswordError).await, 0);
    }

    #[tokio::test]
    async fn test_synchronised_password_step_waits() {
        let mut session = open(SiteOptions::default().with_latency(5), |_| {}).await;
        let mut flow = session.flow();
        flow.open_login_entry().await.unwrap();
        flow.submit_email("someone@example.test").await.unwrap();
        flow.submit_password("whatever").await.unwrap();
        assert_eq!(count(&session, Element::PasswordError).await, 1);
    }

    #[tokio::test]
    async fn test_login_reaches_dashboard() {
        let mut session = open(SiteOptions::default(), |_| {}).await;
        session
            .flow()
            .login(DEFAULT_EMAIL, DEFAULT_PASSWORD)
            .await
            .unwrap();
        session
            .app()
            .await
            .unwrap()
            .get(Element::DashboardRoot)
            .await
            .unwrap()
            .to_be_visible()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_with_pinned_entry() {
        let options = SiteOptions::default();
        let entry = options.login_entry_url();
        let mut session = open(options, |c| c.login_entry = LoginEntry::Url(entry)).await;
        let url = session.flow().open_login_entry().await.unwrap();
        assert!(url.contains("state=simulated"), "{url}");
    }

    #[tokio::test]
    async fn test_submit_email_outside_identity_origin_fails() {
        let mut session = open(SiteOptions::default(), |c| c.timeouts.page_load_ms = 50).await;
        session.visit("/").await.unwrap();
        let err = session.flow().submit_email("a@b.co").await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }), "{err}");
    }
}
