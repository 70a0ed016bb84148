//! The login-flow suite end to end against the simulated site, plus a live
//! run against the real site when `LOGINPROBE_LIVE=1`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use loginprobe::mock::{DEFAULT_EMAIL, DEFAULT_PASSWORD};
use loginprobe::{
    login_suite, FixtureRegistry, SimulatedSessions, SiteOptions, SuiteResults, TestHarness,
};
use std::sync::Arc;

async fn run_simulated(
    options: SiteOptions,
    fixtures: FixtureRegistry,
    harness: TestHarness,
) -> SuiteResults {
    let factory = SimulatedSessions::new(options.clone());
    let output = tempfile::tempdir().unwrap();
    let mut config = options.probe_config();
    config.output_dir = output.path().to_path_buf();
    harness
        .run(&login_suite(), &factory, Arc::new(config), Arc::new(fixtures))
        .await
}

fn failures(results: &SuiteResults) -> String {
    results
        .failures()
        .iter()
        .map(|r| format!("{}: {}", r.name, r.error.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_full_suite_passes_against_simulated_site() {
    let options = SiteOptions::default();
    let fixtures = options.fixtures();
    let results = run_simulated(options, fixtures, TestHarness::new()).await;

    assert_eq!(results.suite_name, "Login Flow");
    assert_eq!(results.total(), 17);
    assert!(results.all_passed(), "{}", failures(&results));
}

#[tokio::test]
async fn test_suite_passes_with_immediate_reloads() {
    let options = SiteOptions::default().with_latency(0);
    let fixtures = options.fixtures();
    let results = run_simulated(options, fixtures, TestHarness::new()).await;
    assert!(results.all_passed(), "{}", failures(&results));
}

#[tokio::test]
async fn test_each_case_gets_its_own_session() {
    let options = SiteOptions::default();
    let factory = SimulatedSessions::new(options.clone());
    let suite = login_suite();
    let filter = "Login Page >";
    assert_eq!(suite.case_names(Some(filter)).len(), 8);

    let results = TestHarness::new()
        .with_filter(filter)
        .run(
            &suite,
            &factory,
            Arc::new(options.probe_config()),
            Arc::new(options.fixtures()),
        )
        .await;
    assert_eq!(results.total(), 8);
    assert_eq!(factory.opened(), 8);
}

#[tokio::test]
async fn test_missing_credentials_fail_only_dependent_cases() {
    let options = SiteOptions::default();
    let results = run_simulated(options, FixtureRegistry::default(), TestHarness::new()).await;

    let failed: Vec<&str> = results.failures().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        failed,
        vec![
            "Login Page > should show error for invalid credentials (registered email)",
            "Successful Login > should navigate to dashboard with valid credentials",
        ]
    );
    for result in results.failures() {
        let error = result.error.as_deref().unwrap();
        assert!(error.contains("EMAIL_ADDRESS"), "{error}");
    }
}

#[tokio::test]
async fn test_wrong_credentials_fail_the_dashboard_case() {
    let options = SiteOptions::default();
    let fixtures = FixtureRegistry::with_credentials(DEFAULT_EMAIL, "not-the-password");
    let results = run_simulated(
        options,
        fixtures,
        TestHarness::new().with_filter("Successful Login"),
    )
    .await;

    assert_eq!(results.total(), 1);
    let result = &results.results[0];
    assert!(!result.passed);
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("page to be in https://app.example.test"), "{error}");
    assert_eq!(result.page.as_deref(), Some("password step"));
}

#[tokio::test]
async fn test_fail_fast_stops_the_run() {
    let options = SiteOptions::default();
    let results = run_simulated(
        options,
        FixtureRegistry::default(),
        TestHarness::new().with_fail_fast().with_filter("invalid credentials"),
    )
    .await;
    // the registered-email case runs first and fails on the missing fixture
    assert_eq!(results.total(), 1);
    assert_eq!(results.failed_count(), 1);
}

#[tokio::test]
async fn test_pinned_login_entry() {
    let options = SiteOptions::default();
    let factory = SimulatedSessions::new(options.clone());
    let mut config = options.probe_config();
    config.login_entry = loginprobe::LoginEntry::Url(options.login_entry_url());
    let results = TestHarness::new()
        .with_filter("Login")
        .run(
            &login_suite(),
            &factory,
            Arc::new(config),
            Arc::new(FixtureRegistry::with_credentials(DEFAULT_EMAIL, DEFAULT_PASSWORD)),
        )
        .await;
    assert!(results.all_passed(), "{}", failures(&results));
}

/// Runs the suite against the configured real site
#[cfg(feature = "browser")]
#[tokio::test]
async fn test_live_site() {
    use loginprobe::{ChromiumSessions, ProbeConfig, ViewportProfile};

    if std::env::var("LOGINPROBE_LIVE").as_deref() != Ok("1") {
        eprintln!("skipping live run: set LOGINPROBE_LIVE=1");
        return;
    }

    let config = ProbeConfig::load(None).expect("configuration");
    let factory = ChromiumSessions::launch(&config.browser, ViewportProfile::DESKTOP.viewport)
        .await
        .expect("chromium");
    let results = TestHarness::new()
        .run(
            &login_suite(),
            &factory,
            Arc::new(config),
            Arc::new(FixtureRegistry::from_env()),
        )
        .await;
    let _ = loginprobe::SessionFactory::shutdown(&factory).await;
    assert!(results.all_passed(), "{}", failures(&results));
}
