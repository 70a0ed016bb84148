//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use loginprobe::ReportFormat;
use std::path::PathBuf;

/// Loginprobe: browser end-to-end checks for a hosted login flow
#[derive(Parser, Debug)]
#[command(name = "loginprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures and summary only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the login-flow suite
    Run(RunArgs),

    /// List the suite's cases
    List(ListArgs),

    /// Print the locator registry
    Selectors,

    /// Print the fixture registry (secrets masked)
    Fixtures,

    /// Find the login page URL by driving the UI from the home page
    Discover(DiscoverArgs),
}

/// Browser target shared by `run` and `discover`
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// YAML configuration file
    #[arg(short, long, env = "LOGINPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Use the built-in simulated site instead of a browser
    #[arg(long)]
    pub simulated: bool,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Browser target
    #[command(flatten)]
    pub target: TargetArgs,

    /// Only run cases whose name contains this (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Output directory for screenshots and the report file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only list cases whose name contains this (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the discover command
#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Browser target
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Report format argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// TAP version 13
    Tap,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Tap => Self::Tap,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
