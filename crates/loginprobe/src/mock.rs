//! Simulated login site for offline testing.
//!
//! [`SimulatedSite`] implements [`BrowserDriver`] over an in-memory model of
//! the application home page, the identity provider's email and password
//! steps and the post-login dashboard. It renders the same selectors, texts
//! and colours as the live pages. Submits that reload the page complete only
//! after `submit_latency` further driver calls, so callers that do not wait
//! for the reload observe the stale page, as they would in a real browser.

use crate::config::{LoginEntry, ProbeConfig, TimeoutConfig};
use crate::device::Viewport;
use crate::driver::{BrowserDriver, ElementSnapshot, Validity};
use crate::fixture::FixtureRegistry;
use crate::locator::Selector;
use crate::origin::Origin;
use crate::result::{ProbeError, ProbeResult};
use crate::selectors::Element;
use crate::session::SessionFactory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Error text colour used by the identity provider
pub const ERROR_RED: &str = "rgb(232, 28, 0)";
/// Native message for an empty required field
pub const REQUIRED_MESSAGE: &str = "Please fill out this field.";
/// Client-side message for a malformed email
pub const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email.";
/// Message for a registered email with the wrong password
pub const WRONG_PASSWORD_MESSAGE: &str = "Your email or password is incorrect. Try again.";
/// Message for an unregistered email
pub const UNKNOWN_USER_MESSAGE: &str = "Incorrect username or password.";

/// Account the simulated provider accepts by default
pub const DEFAULT_EMAIL: &str = "registered.user@example.test";
/// Password of [`DEFAULT_EMAIL`]
pub const DEFAULT_PASSWORD: &str = "correct-horse-battery";

const LOGIN_PATH: &str = "/u/login/identifier";
const PASSWORD_PATH: &str = "/u/login/password";
const STATE: &str = "simulated";
const TEXT_COLOR: &str = "rgb(45, 51, 56)";

/// Shape of the simulated site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOptions {
    /// Application home page
    pub app_url: String,
    /// Identity provider origin
    pub identity_origin: String,
    /// Dashboard path on the application origin
    pub dashboard_path: String,
    /// Registered `(email, password)` pairs
    pub accounts: Vec<(String, String)>,
    /// Driver calls between a reloading submit and the new page appearing
    pub submit_latency: u32,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            app_url: "https://app.example.test".to_string(),
            identity_origin: "https://identity.example.test".to_string(),
            dashboard_path: "/home".to_string(),
            accounts: vec![(DEFAULT_EMAIL.to_string(), DEFAULT_PASSWORD.to_string())],
            submit_latency: 3,
        }
    }
}

impl SiteOptions {
    /// Set the submit latency
    #[must_use]
    pub const fn with_latency(mut self, submit_latency: u32) -> Self {
        self.submit_latency = submit_latency;
        self
    }

    /// Configuration pointing at this site, with short timeouts
    #[must_use]
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            app_url: self.app_url.clone(),
            identity_origin: self.identity_origin.clone(),
            dashboard_path: self.dashboard_path.clone(),
            login_entry: LoginEntry::Discover,
            timeouts: TimeoutConfig {
                command_ms: 1000,
                page_load_ms: 1500,
                poll_interval_ms: 5,
            },
            ..ProbeConfig::default()
        }
    }

    /// Fixtures holding the first registered account
    #[must_use]
    pub fn fixtures(&self) -> FixtureRegistry {
        self.accounts
            .first()
            .map(|(email, password)| FixtureRegistry::with_credentials(email, password))
            .unwrap_or_default()
    }

    /// Versioned login entry URL of this site
    #[must_use]
    pub fn login_entry_url(&self) -> String {
        format!(
            "{}{LOGIN_PATH}?state={STATE}",
            self.identity_origin.trim_end_matches('/')
        )
    }

    fn password(&self, email: &str) -> Option<&str> {
        self.accounts
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(email))
            .map(|(_, p)| p.as_str())
    }
}

/// Factory handing out one fresh [`SimulatedSite`] per session
#[derive(Debug, Default)]
pub struct SimulatedSessions {
    options: SiteOptions,
    opened: AtomicUsize,
}

impl SimulatedSessions {
    /// Factory for sites shaped by `options`
    #[must_use]
    pub fn new(options: SiteOptions) -> Self {
        Self {
            options,
            opened: AtomicUsize::new(0),
        }
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for SimulatedSessions {
    async fn new_driver(&self) -> ProbeResult<Box<dyn BrowserDriver>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedSite::new(self.options.clone())?))
    }
}

/// Which page is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Blank,
    Home { menu_open: bool },
    EmailStep { error: Option<&'static str> },
    PasswordStep { email: String, error: Option<&'static str> },
    Dashboard,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    OpenMenu,
    FollowLoginLink,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Email,
    Password,
}

/// One rendered element
#[derive(Debug, Clone)]
struct Node {
    selectors: Vec<&'static str>,
    value_attr: Option<String>,
    binding: Option<Binding>,
    action: Action,
    snapshot: ElementSnapshot,
}

impl Node {
    fn new(element: Element, tag: &str) -> Self {
        Self {
            selectors: vec![element.css()],
            value_attr: None,
            binding: None,
            action: Action::None,
            snapshot: ElementSnapshot::new(tag).with_color(TEXT_COLOR),
        }
    }

    fn text(mut self, text: &str) -> Self {
        self.snapshot.text = text.to_string();
        self
    }

    fn visible(mut self, visible: bool) -> Self {
        self.snapshot.visible = visible;
        self
    }

    fn color(mut self, color: &str) -> Self {
        self.snapshot.color = Some(color.to_string());
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Required text input bound to a form field
    fn input(element: Element, binding: Binding, value: &str) -> Self {
        let snapshot = if value.is_empty() {
            ElementSnapshot::new("input").with_validity(Validity::missing(), REQUIRED_MESSAGE)
        } else {
            ElementSnapshot::new("input").with_validity(Validity::ok(), "")
        };
        Self {
            selectors: vec![element.css()],
            value_attr: None,
            binding: Some(binding),
            action: Action::None,
            snapshot: snapshot.with_value(value).with_color(TEXT_COLOR),
        }
    }

    /// Server-rendered read-only input
    fn prefilled(element: Element, value: &str) -> Self {
        Self {
            selectors: vec![element.css()],
            value_attr: Some(value.to_string()),
            binding: None,
            action: Action::None,
            snapshot: ElementSnapshot::new("input")
                .with_value(value)
                .with_readonly(true)
                .with_validity(Validity::ok(), "")
                .with_color(TEXT_COLOR),
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => self.matches_css(css),
            Selector::Text(text) => self.snapshot.text.contains(text.as_str()),
            Selector::CssWithText { css, text } => {
                self.matches_css(css) && self.snapshot.text.contains(text.as_str())
            }
        }
    }

    fn matches_css(&self, css: &str) -> bool {
        if self.selectors.iter().any(|s| *s == css) {
            return true;
        }
        if css == Element::InvalidInput.css() {
            return self.snapshot.tag == "input"
                && self.snapshot.validity.is_some_and(|v| !v.valid);
        }
        match (value_attribute_selector(css), &self.value_attr) {
            (Some(wanted), Some(actual)) => wanted == *actual,
            _ => false,
        }
    }
}

/// Value of a `[value="..."]` selector, unescaped
fn value_attribute_selector(css: &str) -> Option<String> {
    let inner = css.strip_prefix("[value=\"")?.strip_suffix("\"]")?;
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('a') => {
                value.push('\n');
                // CSS hex escapes swallow one trailing space
                let rest = chars.as_str();
                if let Some(stripped) = rest.strip_prefix(' ') {
                    chars = stripped.chars();
                }
            }
            Some(other) => value.push(other),
            None => return None,
        }
    }
    Some(value)
}

fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug)]
struct Pending {
    remaining: u32,
    page: Page,
    url: String,
}

#[derive(Debug)]
struct SiteState {
    page: Page,
    url: String,
    email_input: String,
    password_input: String,
    window: HashMap<String, serde_json::Value>,
    pending: Option<Pending>,
    authenticated: bool,
    viewport: Viewport,
    mobile: bool,
    closed: bool,
}

impl SiteState {
    fn load(&mut self, page: Page, url: String) {
        tracing::trace!(%url, "simulated page load");
        if let Page::PasswordStep { email, .. } = &page {
            self.email_input.clone_from(email);
        } else {
            self.email_input.clear();
        }
        self.password_input.clear();
        self.window.clear();
        self.pending = None;
        self.page = page;
        self.url = url;
    }

    /// Advance a pending reload by one driver call
    fn tick(&mut self) {
        let ready = match self.pending.as_mut() {
            Some(pending) if pending.remaining > 0 => {
                pending.remaining -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if ready {
            if let Some(pending) = self.pending.take() {
                self.load(pending.page, pending.url);
            }
        }
    }

    fn nodes(&self) -> Vec<Node> {
        match &self.page {
            Page::Blank | Page::NotFound => Vec::new(),
            Page::Home { menu_open } => vec![
                Node::new(Element::Heading, "h1").text("Hudl"),
                Node::new(Element::LoginButton, "a")
                    .text("Log in")
                    .action(Action::OpenMenu),
                Node::new(Element::SubNavMenu, "ul").visible(*menu_open),
                Node::new(Element::LoginLink, "a")
                    .text("Hudl")
                    .visible(*menu_open)
                    .action(Action::FollowLoginLink),
            ],
            Page::EmailStep { error } => {
                let mut nodes = vec![
                    Node::new(Element::Heading, "h1").text("Log In"),
                    Node::new(Element::EmailLabel, "label").text("Email*"),
                    Node::input(Element::EmailField, Binding::Email, &self.email_input),
                    Node::new(Element::ContinueButton, "button")
                        .text("Continue")
                        .action(Action::Continue),
                ];
                if let Some(message) = error {
                    nodes.push(Node::new(Element::EmailError, "div").text(message).color(ERROR_RED));
                    nodes.push(Node::new(Element::ErrorIcon, "span").color(ERROR_RED));
                }
                nodes
            }
            Page::PasswordStep { email, error } => {
                let mut nodes = vec![
                    Node::new(Element::Heading, "h1").text("Enter Your Password"),
                    Node::prefilled(Element::EmailField, email),
                    Node::input(Element::PasswordField, Binding::Password, &self.password_input),
                    Node::new(Element::ContinueButton, "button")
                        .text("Continue")
                        .action(Action::Continue),
                ];
                if let Some(message) = error {
                    nodes.push(
                        Node::new(Element::PasswordError, "div")
                            .text(message)
                            .color(ERROR_RED),
                    );
                    nodes.push(Node::new(Element::ErrorIcon, "span").color(ERROR_RED));
                }
                nodes
            }
            Page::Dashboard => vec![Node::new(Element::DashboardRoot, "div").text("Home")],
        }
    }

    fn find(&self, selector: &Selector) -> ProbeResult<Node> {
        self.nodes()
            .into_iter()
            .find(|n| n.matches(selector))
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

/// In-memory browser driver over the simulated site
#[derive(Debug)]
pub struct SimulatedSite {
    options: SiteOptions,
    app: Origin,
    identity: Origin,
    state: Mutex<SiteState>,
}

impl SimulatedSite {
    /// A blank page on a site shaped by `options`
    pub fn new(options: SiteOptions) -> ProbeResult<Self> {
        let app = Origin::parse(&options.app_url)?;
        let identity = Origin::parse_exact(&options.identity_origin)?;
        Ok(Self {
            options,
            app,
            identity,
            state: Mutex::new(SiteState {
                page: Page::Blank,
                url: "about:blank".to_string(),
                email_input: String::new(),
                password_input: String::new(),
                window: HashMap::new(),
                pending: None,
                authenticated: false,
                viewport: Viewport::default(),
                mobile: false,
                closed: false,
            }),
        })
    }

    /// Options this site was built with
    #[must_use]
    pub const fn options(&self) -> &SiteOptions {
        &self.options
    }

    /// Current viewport and mobile flag
    pub fn viewport(&self) -> ProbeResult<(Viewport, bool)> {
        let state = self.lock()?;
        Ok((state.viewport, state.mobile))
    }

    fn lock(&self) -> ProbeResult<MutexGuard<'_, SiteState>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ProbeError::page("simulated site state poisoned"))?;
        if state.closed {
            return Err(ProbeError::page("page has been closed"));
        }
        state.tick();
        Ok(state)
    }

    fn identity_url(&self, path: &str) -> ProbeResult<String> {
        self.identity.join(&format!("{path}?state={STATE}"))
    }

    fn route(&self, url: &str, authenticated: bool) -> ProbeResult<(Page, String)> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let origin = Origin::of(&parsed);
        let path = parsed.path();

        if origin.as_ref() == Some(&self.app) {
            if path == self.options.dashboard_path {
                return Ok(if authenticated {
                    (Page::Dashboard, url.to_string())
                } else {
                    (Page::Home { menu_open: false }, self.app.join("/")?)
                });
            }
            let page = if path == "/" || path.is_empty() {
                Page::Home { menu_open: false }
            } else {
                Page::NotFound
            };
            return Ok((page, url.to_string()));
        }
        if origin.as_ref() == Some(&self.identity) {
            let page = if path.starts_with("/u/login") {
                Page::EmailStep { error: None }
            } else {
                Page::NotFound
            };
            return Ok((page, url.to_string()));
        }
        Err(ProbeError::NavigationError {
            url: url.to_string(),
            message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        })
    }

    fn schedule(&self, state: &mut SiteState, page: Page, url: String) {
        state.pending = Some(Pending {
            remaining: self.options.submit_latency,
            page,
            url,
        });
    }

    fn press_continue(&self, state: &mut SiteState) -> ProbeResult<()> {
        match state.page.clone() {
            Page::EmailStep { .. } => {
                let email = state.email_input.trim().to_string();
                if email.is_empty() {
                    // native validation blocks the submit
                    return Ok(());
                }
                if !is_well_formed_email(&email) {
                    state.page = Page::EmailStep {
                        error: Some(INVALID_EMAIL_MESSAGE),
                    };
                    return Ok(());
                }
                let url = self.identity_url(PASSWORD_PATH)?;
                self.schedule(state, Page::PasswordStep { email, error: None }, url);
            }
            Page::PasswordStep { email, .. } => {
                if state.password_input.is_empty() {
                    return Ok(());
                }
                match self.options.password(&email) {
                    Some(expected) if expected == state.password_input => {
                        state.authenticated = true;
                        let url = self.app.join(&self.options.dashboard_path)?;
                        self.schedule(state, Page::Dashboard, url);
                    }
                    Some(_) => {
                        let url = self.identity_url(PASSWORD_PATH)?;
                        let page = Page::PasswordStep {
                            email,
                            error: Some(WRONG_PASSWORD_MESSAGE),
                        };
                        self.schedule(state, page, url);
                    }
                    None => {
                        let url = self.identity_url(PASSWORD_PATH)?;
                        let page = Page::PasswordStep {
                            email,
                            error: Some(UNKNOWN_USER_MESSAGE),
                        };
                        self.schedule(state, page, url);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for SimulatedSite {
    async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock()?;
        let (page, landed) = self.route(url, state.authenticated)?;
        state.load(page, landed);
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock()?.url.clone())
    }

    async fn set_viewport(&mut self, viewport: Viewport, mobile: bool) -> ProbeResult<()> {
        let mut state = self.lock()?;
        state.viewport = viewport;
        state.mobile = mobile;
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>> {
        let state = self.lock()?;
        Ok(state
            .nodes()
            .into_iter()
            .filter(|n| n.matches(selector))
            .map(|n| n.snapshot)
            .collect())
    }

    async fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        let mut state = self.lock()?;
        let node = state.find(selector)?;
        if !node.snapshot.is_actionable() {
            return Err(ProbeError::NotActionable {
                selector: selector.to_string(),
                reason: "element is hidden or disabled".to_string(),
            });
        }
        match node.action {
            Action::None => {}
            Action::OpenMenu => {
                if let Page::Home { menu_open } = &mut state.page {
                    *menu_open = true;
                }
            }
            Action::FollowLoginLink => {
                let url = self.options.login_entry_url();
                self.schedule(&mut state, Page::EmailStep { error: None }, url);
            }
            Action::Continue => self.press_continue(&mut state)?,
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let mut state = self.lock()?;
        let node = state.find(selector)?;
        if node.snapshot.readonly {
            return Err(ProbeError::InputError {
                message: format!("{selector} is read-only"),
            });
        }
        match node.binding {
            Some(Binding::Email) => state.email_input.push_str(text),
            Some(Binding::Password) => state.password_input.push_str(text),
            None => {
                return Err(ProbeError::InputError {
                    message: format!("{selector} is not a text field"),
                })
            }
        }
        Ok(())
    }

    async fn window_property(&self, name: &str) -> ProbeResult<Option<serde_json::Value>> {
        Ok(self.lock()?.window.get(name).cloned())
    }

    async fn set_window_property(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> ProbeResult<()> {
        self.lock()?.window.insert(name.to_string(), value);
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        drop(self.lock()?);
        Ok(Vec::new())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ProbeError::page("simulated site state poisoned"))?;
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn site() -> SimulatedSite {
        SimulatedSite::new(SiteOptions::default().with_latency(0)).unwrap()
    }

    async fn count(site: &SimulatedSite, element: Element) -> usize {
        site.query(&element.selector()).await.unwrap().len()
    }

    mod routing_tests {
        use super::*;

        #[tokio::test]
        async fn test_home_page() {
            let mut site = site();
            site.goto("https://app.example.test/").await.unwrap();
            let button = site.query(&Element::LoginButton.selector()).await.unwrap();
            assert_eq!(button.len(), 1);
            let menu = site.query(&Element::SubNavMenu.selector()).await.unwrap();
            assert!(!menu[0].visible);
        }

        #[tokio::test]
        async fn test_unknown_host_fails() {
            let mut site = site();
            let err = site.goto("https://nowhere.invalid/").await.unwrap_err();
            assert!(matches!(err, ProbeError::NavigationError { .. }));
        }

        #[tokio::test]
        async fn test_dashboard_requires_login() {
            let mut site = site();
            site.goto("https://app.example.test/home").await.unwrap();
            assert_eq!(count(&site, Element::DashboardRoot).await, 0);
            assert_eq!(
                site.current_url().await.unwrap(),
                "https://app.example.test/"
            );
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_menu_open_is_idempotent() {
            let mut site = site();
            site.goto("https://app.example.test/").await.unwrap();
            site.click(&Element::LoginButton.selector()).await.unwrap();
            site.click(&Element::LoginButton.selector()).await.unwrap();
            let link = site.query(&Element::LoginLink.selector()).await.unwrap();
            assert!(link[0].visible);
        }

        #[tokio::test]
        async fn test_hidden_link_not_clickable() {
            let mut site = site();
            site.goto("https://app.example.test/").await.unwrap();
            let err = site.click(&Element::LoginLink.selector()).await.unwrap_err();
            assert!(matches!(err, ProbeError::NotActionable { .. }));
        }

        #[tokio::test]
        async fn test_empty_email_is_invalid() {
            let mut site = site();
            site.goto(&SiteOptions::default().login_entry_url()).await.unwrap();
            let invalid = site.query(&Element::InvalidInput.selector()).await.unwrap();
            assert_eq!(invalid.len(), 1);
            assert_eq!(invalid[0].validity, Some(Validity::missing()));
            assert_eq!(invalid[0].validation_message.as_deref(), Some(REQUIRED_MESSAGE));
        }

        #[tokio::test]
        async fn test_malformed_email_shows_client_error() {
            let mut site = site();
            site.goto(&SiteOptions::default().login_entry_url()).await.unwrap();
            site.type_text(&Element::EmailField.selector(), "nope").await.unwrap();
            site.click(&Element::ContinueButton.selector()).await.unwrap();
            let error = site.query(&Element::EmailError.selector()).await.unwrap();
            assert_eq!(error[0].text, INVALID_EMAIL_MESSAGE);
            assert_eq!(error[0].color.as_deref(), Some(ERROR_RED));
        }

        #[tokio::test]
        async fn test_email_submit_reloads_and_clears_window() {
            let mut site = SimulatedSite::new(SiteOptions::default().with_latency(2)).unwrap();
            site.goto(&SiteOptions::default().login_entry_url()).await.unwrap();
            site.type_text(&Element::EmailField.selector(), "a@b.co").await.unwrap();
            site.set_window_property("beforeReload", serde_json::json!(true))
                .await
                .unwrap();
            site.click(&Element::ContinueButton.selector()).await.unwrap();
            // stale page until the latency elapses
            assert!(site.window_property("beforeReload").await.unwrap().is_some());
            assert!(site.window_property("beforeReload").await.unwrap().is_some());
            assert!(site.window_property("beforeReload").await.unwrap().is_none());
            assert_eq!(count(&site, Element::PasswordField).await, 1);
            let prefilled = site
                .query(&Selector::attribute_equals("value", "a@b.co"))
                .await
                .unwrap();
            assert!(prefilled[0].readonly);
        }

        #[tokio::test]
        async fn test_typed_value_is_not_an_attribute() {
            let mut site = site();
            site.goto(&SiteOptions::default().login_entry_url()).await.unwrap();
            site.type_text(&Element::EmailField.selector(), "a@b.co").await.unwrap();
            let matches = site
                .query(&Selector::attribute_equals("value", "a@b.co"))
                .await
                .unwrap();
            assert!(matches.is_empty());
        }

        #[tokio::test]
        async fn test_closed_site_rejects_calls() {
            let mut site = site();
            site.close().await.unwrap();
            assert!(site.current_url().await.is_err());
        }
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_value_selector_round_trip() {
            for value in ["plain@x.io", "quote\"d", "back\\slash", "line\nbreak"] {
                let Selector::Css(css) = Selector::attribute_equals("value", value) else {
                    unreachable!()
                };
                assert_eq!(value_attribute_selector(&css).as_deref(), Some(value));
            }
        }

        #[test]
        fn test_email_shapes() {
            assert!(is_well_formed_email("valid_email_address@gmail.com"));
            assert!(!is_well_formed_email("unregistered_email_address"));
            assert!(!is_well_formed_email("a@b"));
            assert!(!is_well_formed_email("a b@c.d"));
            assert!(!is_well_formed_email("@c.d"));
        }
    }
}
