//! Command implementations

use crate::commands::{ListArgs, RunArgs, TargetArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use loginprobe::fixture::FixtureName;
use loginprobe::report::{self, ReportFormat};
use loginprobe::selectors::registry;
use loginprobe::{
    login_suite, FixtureRegistry, ProbeConfig, Session, SessionFactory, SimulatedSessions,
    SiteOptions, SuiteResults, TestHarness,
};
use std::sync::Arc;
use std::time::Duration;

/// Configuration, fixtures and session source for one invocation
struct Target {
    config: ProbeConfig,
    fixtures: FixtureRegistry,
    factory: Box<dyn SessionFactory>,
}

impl Target {
    async fn resolve(args: &TargetArgs, output: Option<&std::path::Path>) -> CliResult<Self> {
        let mut target = if args.simulated {
            simulated(args)?
        } else {
            let mut config = ProbeConfig::load(args.config.as_deref())?;
            if args.headed {
                config.browser.headless = false;
            }
            let factory = launch(&config).await?;
            Self {
                config,
                fixtures: FixtureRegistry::from_env(),
                factory,
            }
        };
        if let Some(dir) = output {
            target.config.output_dir = dir.to_path_buf();
        }
        Ok(target)
    }

    async fn shutdown(&self) {
        if let Err(err) = self.factory.shutdown().await {
            tracing::warn!(error = %err, "browser shutdown failed");
        }
    }
}

/// The built-in site; a config file may still override timeouts and output
fn simulated(args: &TargetArgs) -> CliResult<Target> {
    let site = SiteOptions::default();
    let mut config = site.probe_config();
    if let Some(ref path) = args.config {
        let file = ProbeConfig::from_file(path)?;
        config.timeouts = file.timeouts;
        config.output_dir = file.output_dir;
        config.sync_password_step = file.sync_password_step;
    }
    tracing::info!(app_url = %config.app_url, "using simulated site");
    Ok(Target {
        config,
        fixtures: site.fixtures(),
        factory: Box::new(SimulatedSessions::new(site)),
    })
}

#[cfg(feature = "browser")]
async fn launch(config: &ProbeConfig) -> CliResult<Box<dyn SessionFactory>> {
    let viewport = loginprobe::ViewportProfile::DESKTOP.viewport;
    let sessions = loginprobe::ChromiumSessions::launch(&config.browser, viewport).await?;
    Ok(Box::new(sessions))
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn launch(_config: &ProbeConfig) -> CliResult<Box<dyn SessionFactory>> {
    Err(CliError::config(
        "built without browser support; rebuild with --features browser or pass --simulated",
    ))
}

/// Runs commands against a reporter
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a runner for `config`
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run the suite; `Ok(false)` when any case failed
    pub async fn run(&mut self, args: &RunArgs) -> CliResult<bool> {
        let target = Target::resolve(&args.target, args.output.as_deref()).await?;
        let results = self.run_suite(args, &target).await;
        target.shutdown().await;
        let results = results?;
        Ok(results.all_passed())
    }

    async fn run_suite(&mut self, args: &RunArgs, target: &Target) -> CliResult<SuiteResults> {
        let suite = login_suite();
        let mut harness = TestHarness::new();
        if let Some(ref filter) = args.filter {
            harness = harness.with_filter(filter.as_str());
        }
        if args.fail_fast {
            harness = harness.with_fail_fast();
        }

        let selected = suite.case_names(args.filter.as_deref()).len();
        if selected == 0 {
            return Err(CliError::invalid_argument(format!(
                "no case matches filter {:?}",
                args.filter.as_deref().unwrap_or_default()
            )));
        }

        let format = ReportFormat::from(args.format);
        let live_output = format == ReportFormat::Text;
        if live_output {
            self.reporter.header(&suite.name);
        }
        self.reporter.start_progress(selected as u64, &suite.name);

        let reporter = &self.reporter;
        let results = harness
            .run_observed(
                &suite,
                target.factory.as_ref(),
                Arc::new(target.config.clone()),
                Arc::new(target.fixtures.clone()),
                |result| {
                    reporter.increment(1);
                    if live_output {
                        reporter.case_result(result);
                    }
                },
            )
            .await;
        self.reporter.finish();

        let path = report::write_report(&results, format, &target.config.output_dir).await?;
        if live_output {
            self.reporter.summary(
                results.passed_count(),
                results.failed_count(),
                Duration::from_millis(results.duration_ms),
            );
            if self.config.verbosity.is_verbose() {
                self.reporter.info(&format!("report: {}", path.display()));
            }
        } else {
            print!("{}", report::render(&results, format)?);
        }
        Ok(results)
    }

    /// Print the names of the selected cases
    pub fn list(&self, args: &ListArgs) -> CliResult<()> {
        let names = login_suite().case_names(args.filter.as_deref());
        if names.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no case matches filter {:?}",
                args.filter.as_deref().unwrap_or_default()
            )));
        }
        for name in names {
            println!("{name}");
        }
        Ok(())
    }

    /// Print the locator registry
    pub fn selectors(&self) {
        let entries = registry();
        let key_width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
        let area_width = entries
            .iter()
            .map(|e| e.area.to_string().len())
            .max()
            .unwrap_or(0);
        for entry in entries {
            println!(
                "{:<area_width$}  {:<key_width$}  {}",
                entry.area.to_string(),
                entry.key,
                entry.selector
            );
        }
    }

    /// Print the fixture registry from the environment
    pub fn fixtures(&self) {
        let fixtures = FixtureRegistry::from_env();
        for name in FixtureName::ALL {
            println!("{name} = {}", fixtures.display_value(name));
        }
        if !fixtures.has_credentials() {
            self.reporter
                .info("credentials unset: the cases that log in will fail");
        }
    }

    /// Discover and print the login page URL
    pub async fn discover(&self, args: &TargetArgs) -> CliResult<String> {
        let target = Target::resolve(args, None).await?;
        let url = discover_with(&target).await;
        target.shutdown().await;
        let url = url?;
        println!("{url}");
        self.reporter
            .info("pin it with login_entry: { url: ... } or LOGINPROBE_LOGIN_ENTRY_URL");
        Ok(url)
    }
}

async fn discover_with(target: &Target) -> CliResult<String> {
    let mut session = Session::open(
        target.factory.as_ref(),
        Arc::new(target.config.clone()),
        Arc::new(target.fixtures.clone()),
    )
    .await?;
    let url = session.flow().discover_login_entry().await;
    if let Err(err) = session.close().await {
        tracing::warn!(error = %err, "could not close session");
    }
    url.map_err(CliError::from)
}
