//! Test harness for running test suites.
//!
//! Cases run strictly one after another. Each case gets a fresh [`Session`]
//! from the [`SessionFactory`], so no cookies or page state carry over from
//! the previous case.

use crate::config::ProbeConfig;
use crate::device::ViewportProfile;
use crate::fixture::FixtureRegistry;
use crate::page_object::identify;
use crate::result::ProbeResult;
use crate::session::{Session, SessionFactory};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Future returned by a case body or hook
pub type CaseFuture<'a> = BoxFuture<'a, ProbeResult<()>>;

/// A case body or before-each hook
pub type CaseFn = for<'a> fn(&'a mut Session) -> CaseFuture<'a>;

/// A single test case
#[derive(Clone)]
pub struct TestCase {
    /// Test name
    pub name: String,
    body: CaseFn,
}

impl TestCase {
    /// Create a new test case
    #[must_use]
    pub fn new(name: impl Into<String>, body: CaseFn) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// Cases sharing a viewport and a before-each hook
#[derive(Clone)]
pub struct TestGroup {
    /// Group name
    pub name: String,
    /// Viewport applied before the hook
    pub viewport: Option<ViewportProfile>,
    before_each: Option<CaseFn>,
    /// Cases in declaration order
    pub cases: Vec<TestCase>,
}

impl TestGroup {
    /// Create an empty group
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            viewport: None,
            before_each: None,
            cases: Vec::new(),
        }
    }

    /// Run every case under this viewport
    #[must_use]
    pub const fn with_viewport(mut self, profile: ViewportProfile) -> Self {
        self.viewport = Some(profile);
        self
    }

    /// Run `hook` before every case
    #[must_use]
    pub fn with_before_each(mut self, hook: CaseFn) -> Self {
        self.before_each = Some(hook);
        self
    }

    /// Add a case
    #[must_use]
    pub fn with_case(mut self, name: impl Into<String>, body: CaseFn) -> Self {
        self.cases.push(TestCase::new(name, body));
        self
    }

    /// Full display name of one of this group's cases
    #[must_use]
    pub fn case_name(&self, case: &TestCase) -> String {
        format!("{} > {}", self.name, case.name)
    }
}

impl std::fmt::Debug for TestGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestGroup")
            .field("name", &self.name)
            .field("viewport", &self.viewport)
            .field("before_each", &self.before_each.is_some())
            .field("cases", &self.cases)
            .finish()
    }
}

/// A test suite containing multiple groups
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Groups in declaration order
    pub groups: Vec<TestGroup>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Add a group
    #[must_use]
    pub fn with_group(mut self, group: TestGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.cases.len()).sum()
    }

    /// Full names of the cases selected by `filter`
    #[must_use]
    pub fn case_names(&self, filter: Option<&str>) -> Vec<String> {
        self.selected(filter)
            .map(|(group, case)| group.case_name(case))
            .collect()
    }

    fn selected<'a>(
        &'a self,
        filter: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a TestGroup, &'a TestCase)> + 'a {
        self.groups
            .iter()
            .flat_map(|g| g.cases.iter().map(move |c| (g, c)))
            .filter(move |(g, c)| filter.map_or(true, |f| matches_filter(&g.case_name(c), f)))
    }
}

fn matches_filter(name: &str, filter: &str) -> bool {
    name.to_lowercase().contains(&filter.to_lowercase())
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Full test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Page the case stopped on, when it failed
    #[serde(default)]
    pub page: Option<String>,
    /// Failure screenshot, when one was captured
    #[serde(default)]
    pub screenshot: Option<PathBuf>,
    /// Test duration in milliseconds
    pub duration_ms: u64,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            page: None,
            screenshot: None,
            duration_ms: 0,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            page: None,
            screenshot: None,
            duration_ms: 0,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual test results
    pub results: Vec<TestResult>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteResults {
    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Test harness for running suites
#[derive(Debug, Default, Clone)]
pub struct TestHarness {
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Only run cases whose full name contains this (case-insensitive)
    pub filter: Option<String>,
}

impl TestHarness {
    /// Create a new test harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Restrict the run to matching cases
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Run a test suite
    pub async fn run(
        &self,
        suite: &TestSuite,
        factory: &dyn SessionFactory,
        config: Arc<ProbeConfig>,
        fixtures: Arc<FixtureRegistry>,
    ) -> SuiteResults {
        self.run_observed(suite, factory, config, fixtures, |_| {})
            .await
    }

    /// Run a test suite, calling `on_result` after every case
    pub async fn run_observed<F>(
        &self,
        suite: &TestSuite,
        factory: &dyn SessionFactory,
        config: Arc<ProbeConfig>,
        fixtures: Arc<FixtureRegistry>,
        mut on_result: F,
    ) -> SuiteResults
    where
        F: FnMut(&TestResult),
    {
        let start = Instant::now();
        let mut results = Vec::new();

        for (group, case) in suite.selected(self.filter.as_deref()) {
            let result = run_case(group, case, factory, &config, &fixtures).await;
            on_result(&result);
            let failed = !result.passed;
            results.push(result);
            if failed && self.fail_fast {
                tracing::warn!("fail-fast: stopping after first failure");
                break;
            }
        }

        SuiteResults {
            suite_name: suite.name.clone(),
            results,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

async fn run_case(
    group: &TestGroup,
    case: &TestCase,
    factory: &dyn SessionFactory,
    config: &Arc<ProbeConfig>,
    fixtures: &Arc<FixtureRegistry>,
) -> TestResult {
    let name = group.case_name(case);
    tracing::info!(case = %name, "case started");
    let start = Instant::now();

    let mut session = match Session::open(factory, Arc::clone(config), Arc::clone(fixtures)).await
    {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(case = %name, error = %err, "could not open session");
            return TestResult::fail(name, err.to_string())
                .with_duration_ms(start.elapsed().as_millis() as u64);
        }
    };

    let outcome = async {
        if let Some(profile) = &group.viewport {
            session.set_viewport(profile).await?;
        }
        if let Some(hook) = group.before_each {
            hook(&mut session).await?;
        }
        (case.body)(&mut session).await
    }
    .await;

    let mut result = match outcome {
        Ok(()) => TestResult::pass(&name),
        Err(err) => {
            tracing::warn!(case = %name, error = %err, "case failed");
            let mut failed = TestResult::fail(&name, err.to_string());
            failed.page = identify(&session)
                .await
                .ok()
                .flatten()
                .map(|p| p.to_string());
            failed.screenshot = capture(&session, &config.screenshot_dir(), &name).await;
            failed
        }
    };

    if let Err(err) = session.close().await {
        tracing::warn!(case = %name, error = %err, "could not close session");
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(case = %name, passed = result.passed, ms = result.duration_ms, "case finished");
    result
}

/// Save a failure screenshot; `None` when the driver has none or saving fails
async fn capture(session: &Session, dir: &Path, name: &str) -> Option<PathBuf> {
    let png = match session.screenshot().await {
        Ok(png) if !png.is_empty() => png,
        Ok(_) => return None,
        Err(err) => {
            tracing::warn!(error = %err, "screenshot failed");
            return None;
        }
    };
    let path = dir.join(format!("{}.png", slug(name)));
    match save_png(dir, &path, &png).await {
        Ok(()) => Some(path),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not save screenshot");
            None
        }
    }
}

async fn save_png(dir: &Path, path: &Path, png: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, png).await
}

/// File-name-safe form of a case name
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{BrowserDriver, ElementSnapshot};
    use crate::locator::Selector;
    use crate::mock::{SimulatedSessions, SimulatedSite, SiteOptions};
    use crate::result::ProbeError;
    use crate::selectors::Element;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn passing(_s: &mut Session) -> CaseFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn failing(_s: &mut Session) -> CaseFuture<'_> {
        Box::pin(async { Err(ProbeError::assertion("boom")) })
    }

    fn visit_home(s: &mut Session) -> CaseFuture<'_> {
        Box::pin(async move { s.visit("/").await })
    }

    fn sees_login_button(s: &mut Session) -> CaseFuture<'_> {
        Box::pin(async move {
            s.app()
                .await?
                .get(Element::LoginButton)
                .await?
                .to_be_visible()
                .await?;
            Ok(())
        })
    }

    fn suite() -> TestSuite {
        TestSuite::new("demo")
            .with_group(
                TestGroup::new("alpha")
                    .with_case("one", passing)
                    .with_case("two", failing),
            )
            .with_group(
                TestGroup::new("beta")
                    .with_before_each(visit_home)
                    .with_case("three", sees_login_button),
            )
    }

    fn env() -> (SimulatedSessions, Arc<ProbeConfig>, Arc<FixtureRegistry>) {
        let options = SiteOptions::default().with_latency(0);
        let config = Arc::new(options.probe_config());
        let fixtures = Arc::new(options.fixtures());
        (SimulatedSessions::new(options), config, fixtures)
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_case_names_and_filter() {
            let suite = suite();
            assert_eq!(suite.test_count(), 3);
            assert_eq!(
                suite.case_names(None),
                vec!["alpha > one", "alpha > two", "beta > three"]
            );
            assert_eq!(suite.case_names(Some("BETA")), vec!["beta > three"]);
        }

        #[test]
        fn test_slug() {
            assert_eq!(
                slug("Login Page > should show error (no password)"),
                "login-page-should-show-error-no-password"
            );
        }

        #[test]
        fn test_results_counts() {
            let results = SuiteResults {
                suite_name: "s".into(),
                results: vec![TestResult::pass("a"), TestResult::fail("b", "x")],
                duration_ms: 1,
            };
            assert!(!results.all_passed());
            assert_eq!(results.passed_count(), 1);
            assert_eq!(results.failures()[0].name, "b");
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_runs_each_case_in_fresh_session() {
            let (factory, config, fixtures) = env();
            let results = TestHarness::new()
                .run(&suite(), &factory, config, fixtures)
                .await;
            assert_eq!(results.total(), 3);
            assert_eq!(results.failed_count(), 1);
            assert_eq!(results.failures()[0].error.as_deref(), Some("Assertion failed: boom"));
            assert_eq!(factory.opened(), 3);
        }

        #[tokio::test]
        async fn test_fail_fast_stops() {
            let (factory, config, fixtures) = env();
            let results = TestHarness::new()
                .with_fail_fast()
                .run(&suite(), &factory, config, fixtures)
                .await;
            assert_eq!(results.total(), 2);
        }

        #[tokio::test]
        async fn test_filter_and_observer() {
            let (factory, config, fixtures) = env();
            let mut seen = Vec::new();
            let results = TestHarness::new()
                .with_filter("three")
                .run_observed(&suite(), &factory, config, fixtures, |r| {
                    seen.push(r.name.clone());
                })
                .await;
            assert!(results.all_passed());
            assert_eq!(seen, vec!["beta > three"]);
        }

        #[tokio::test]
        async fn test_failure_records_page() {
            fn fails_on_home(s: &mut Session) -> CaseFuture<'_> {
                Box::pin(async move {
                    s.visit("/").await?;
                    Err(ProbeError::assertion("nope"))
                })
            }
            let (factory, config, fixtures) = env();
            let suite = TestSuite::new("s")
                .with_group(TestGroup::new("g").with_case("c", fails_on_home));
            let results = TestHarness::new().run(&suite, &factory, config, fixtures).await;
            assert_eq!(results.results[0].page.as_deref(), Some("home"));
            assert!(results.results[0].screenshot.is_none());
        }
    }

    mod screenshot_tests {
        use super::*;

        /// Simulated site that also produces screenshot bytes
        #[derive(Debug)]
        struct Camera(SimulatedSite);

        #[async_trait]
        impl BrowserDriver for Camera {
            async fn goto(&mut self, url: &str) -> ProbeResult<()> {
                self.0.goto(url).await
            }
            async fn current_url(&self) -> ProbeResult<String> {
                self.0.current_url().await
            }
            async fn set_viewport(&mut self, v: crate::device::Viewport, m: bool) -> ProbeResult<()> {
                self.0.set_viewport(v, m).await
            }
            async fn query(&self, s: &Selector) -> ProbeResult<Vec<ElementSnapshot>> {
                self.0.query(s).await
            }
            async fn click(&mut self, s: &Selector) -> ProbeResult<()> {
                self.0.click(s).await
            }
            async fn type_text(&mut self, s: &Selector, t: &str) -> ProbeResult<()> {
                self.0.type_text(s, t).await
            }
            async fn window_property(&self, n: &str) -> ProbeResult<Option<serde_json::Value>> {
                self.0.window_property(n).await
            }
            async fn set_window_property(&mut self, n: &str, v: serde_json::Value) -> ProbeResult<()> {
                self.0.set_window_property(n, v).await
            }
            async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
                Ok(b"captured".to_vec())
            }
            async fn close(&mut self) -> ProbeResult<()> {
                self.0.close().await
            }
        }

        struct Cameras(AtomicUsize);

        #[async_trait]
        impl SessionFactory for Cameras {
            async fn new_driver(&self) -> ProbeResult<Box<dyn BrowserDriver>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(Camera(SimulatedSite::new(SiteOptions::default())?)))
            }
        }

        #[tokio::test]
        async fn test_failure_screenshot_saved() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = SiteOptions::default().probe_config();
            config.output_dir = dir.path().to_path_buf();
            let suite = TestSuite::new("s")
                .with_group(TestGroup::new("Group").with_case("Broken Case", failing));
            let results = TestHarness::new()
                .run(
                    &suite,
                    &Cameras(AtomicUsize::new(0)),
                    Arc::new(config),
                    Arc::new(FixtureRegistry::default()),
                )
                .await;
            let shot = results.results[0].screenshot.clone().unwrap();
            assert_eq!(shot, dir.path().join("screenshots/group-broken-case.png"));
            assert_eq!(std::fs::read(shot).unwrap(), b"captured");
        }
    }
}
