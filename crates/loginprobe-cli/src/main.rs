//! Loginprobe CLI: run the login-flow suite
//!
//! ## Usage
//!
//! ```bash
//! loginprobe run                          # Run the suite in headless Chromium
//! loginprobe run --filter mobile --headed # One viewport, visible browser
//! loginprobe run --simulated --format tap # Against the built-in site
//! loginprobe discover                     # Print the login page URL
//! ```

use clap::Parser;
use loginprobe_cli::{Cli, CliConfig, CliResult, Commands, SuiteRunner, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `Ok(false)` when the suite ran and a case failed
async fn run(cli: Cli, config: CliConfig) -> CliResult<bool> {
    let mut runner = SuiteRunner::new(config);
    match cli.command {
        Commands::Run(args) => runner.run(&args).await,
        Commands::List(args) => runner.list(&args).map(|()| true),
        Commands::Selectors => {
            runner.selectors();
            Ok(true)
        }
        Commands::Fixtures => {
            runner.fixtures();
            Ok(true)
        }
        Commands::Discover(args) => runner.discover(&args.target).await.map(|_| true),
    }
}
