//! Run configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. Loading applies, in order: defaults, the optional YAML
//! file, then environment overrides.

use crate::origin::Origin;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{CompletionMarker, WaitOptions, DEFAULT_MARKER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides `app_url`
pub const APP_URL_ENV: &str = "LOGINPROBE_APP_URL";
/// Overrides `identity_origin`
pub const IDENTITY_ORIGIN_ENV: &str = "LOGINPROBE_IDENTITY_ORIGIN";
/// Pins `login_entry` to a literal URL
pub const LOGIN_ENTRY_URL_ENV: &str = "LOGINPROBE_LOGIN_ENTRY_URL";
/// Overrides `browser.headless`
pub const HEADLESS_ENV: &str = "LOGINPROBE_HEADLESS";
/// Overrides `browser.chromium_path`
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// How the suite reaches the identity provider's login page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "LoginEntryRepr", into = "LoginEntryRepr")]
pub enum LoginEntry {
    /// Drive the navigation menu to find the page at run time
    #[default]
    Discover,
    /// Navigate straight to this URL
    Url(String),
}

/// YAML shape: `discover` or `{ url: ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LoginEntryRepr {
    Mode(String),
    Url { url: String },
}

impl TryFrom<LoginEntryRepr> for LoginEntry {
    type Error = String;

    fn try_from(repr: LoginEntryRepr) -> Result<Self, Self::Error> {
        match repr {
            LoginEntryRepr::Mode(mode) if mode == "discover" => Ok(Self::Discover),
            LoginEntryRepr::Mode(other) => Err(format!(
                "unknown login_entry mode {other:?} (expected `discover` or `{{ url: ... }}`)"
            )),
            LoginEntryRepr::Url { url } => Ok(Self::Url(url)),
        }
    }
}

impl From<LoginEntry> for LoginEntryRepr {
    fn from(entry: LoginEntry) -> Self {
        match entry {
            LoginEntry::Discover => Self::Mode("discover".to_string()),
            LoginEntry::Url(url) => Self::Url { url },
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-command auto-wait budget
    pub command_ms: u64,
    /// Budget for page loads and origin changes
    pub page_load_ms: u64,
    /// Interval between polls
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            command_ms: 4000,
            page_load_ms: 60_000,
            poll_interval_ms: 50,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Chromium executable; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Root configuration for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Application home page
    pub app_url: String,
    /// Identity provider origin (no path)
    pub identity_origin: String,
    /// Path of the post-login dashboard, relative to `app_url`
    pub dashboard_path: String,
    /// Login page entry strategy
    pub login_entry: LoginEntry,
    /// Timeouts
    pub timeouts: TimeoutConfig,
    /// Browser settings
    pub browser: BrowserSettings,
    /// `window` property used as the completion marker
    pub completion_marker: String,
    /// Also synchronise the password submit on the completion marker
    pub sync_password_step: bool,
    /// Directory for screenshots and reports
    pub output_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            app_url: "https://www.hudl.com".to_string(),
            identity_origin: "https://identity.hudl.com".to_string(),
            dashboard_path: "/home".to_string(),
            login_entry: LoginEntry::Discover,
            timeouts: TimeoutConfig::default(),
            browser: BrowserSettings::default(),
            completion_marker: DEFAULT_MARKER.to_string(),
            sync_password_step: true,
            output_dir: PathBuf::from("target/loginprobe"),
        }
    }
}

impl ProbeConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file
    pub fn from_file(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Defaults, then `path` if given, then the process environment; validated
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(
            app_url = %config.app_url,
            identity_origin = %config.identity_origin,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ProbeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = read(APP_URL_ENV) {
            self.app_url = url;
        }
        if let Some(origin) = read(IDENTITY_ORIGIN_ENV) {
            self.identity_origin = origin;
        }
        if let Some(url) = read(LOGIN_ENTRY_URL_ENV) {
            self.login_entry = LoginEntry::Url(url);
        }
        if let Some(flag) = read(HEADLESS_ENV) {
            self.browser.headless = parse_flag(HEADLESS_ENV, &flag)?;
        }
        if let Some(path) = read(CHROMIUM_PATH_ENV) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Check URLs, origins and timeouts
    pub fn validate(&self) -> ProbeResult<()> {
        self.app_origin()?;
        self.idp_origin()?;
        self.dashboard_url()?;
        if let LoginEntry::Url(url) = &self.login_entry {
            let entry = Origin::parse(url)?;
            if entry != self.idp_origin()? {
                tracing::warn!(%url, "login entry URL is outside the identity origin");
            }
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(ProbeError::config("timeouts.poll_interval_ms must be positive"));
        }
        if self.completion_marker.trim().is_empty() {
            return Err(ProbeError::config("completion_marker must not be empty"));
        }
        Ok(())
    }

    /// Origin of `app_url`
    pub fn app_origin(&self) -> ProbeResult<Origin> {
        Origin::parse(&self.app_url)
    }

    /// Identity provider origin
    pub fn idp_origin(&self) -> ProbeResult<Origin> {
        Origin::parse_exact(&self.identity_origin)
    }

    /// Absolute dashboard URL
    pub fn dashboard_url(&self) -> ProbeResult<String> {
        self.app_origin()?.join(&self.dashboard_path)
    }

    /// Wait options for element commands
    #[must_use]
    pub const fn command_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.timeouts.command_ms, self.timeouts.poll_interval_ms)
    }

    /// Wait options for page loads and origin changes
    #[must_use]
    pub const fn page_load_wait(&self) -> WaitOptions {
        WaitOptions::from_millis(self.timeouts.page_load_ms, self.timeouts.poll_interval_ms)
    }

    /// Completion marker
    #[must_use]
    pub fn marker(&self) -> CompletionMarker {
        CompletionMarker::new(self.completion_marker.clone())
    }

    /// Where failure screenshots go
    #[must_use]
    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }
}

fn parse_flag(key: &str, value: &str) -> ProbeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProbeError::config(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = ProbeConfig::default();
            assert_eq!(config.app_url, "https://www.hudl.com");
            assert_eq!(config.identity_origin, "https://identity.hudl.com");
            assert_eq!(config.login_entry, LoginEntry::Discover);
            assert_eq!(config.timeouts.command_ms, 4000);
            assert_eq!(config.timeouts.page_load_ms, 60_000);
            assert!(config.browser.headless);
            assert!(config.sync_password_step);
            assert_eq!(config.marker().name(), "beforeReload");
            config.validate().unwrap();
        }

        #[test]
        fn test_derived_urls() {
            let config = ProbeConfig::default();
            assert_eq!(config.dashboard_url().unwrap(), "https://www.hudl.com/home");
            assert_eq!(config.idp_origin().unwrap().host(), "identity.hudl.com");
            assert_eq!(
                config.screenshot_dir(),
                PathBuf::from("target/loginprobe/screenshots")
            );
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_empty_document_is_default() {
            assert_eq!(ProbeConfig::from_yaml_str("").unwrap(), ProbeConfig::default());
        }

        #[test]
        fn test_partial_document() {
            let config = ProbeConfig::from_yaml_str(
                "app_url: http://127.0.0.1:8080\ntimeouts:\n  command_ms: 250\n",
            )
            .unwrap();
            assert_eq!(config.app_url, "http://127.0.0.1:8080");
            assert_eq!(config.timeouts.command_ms, 250);
            assert_eq!(config.timeouts.page_load_ms, 60_000);
        }

        #[test]
        fn test_login_entry_forms() {
            let discover = ProbeConfig::from_yaml_str("login_entry: discover").unwrap();
            assert_eq!(discover.login_entry, LoginEntry::Discover);

            let pinned = ProbeConfig::from_yaml_str(
                "login_entry:\n  url: https://identity.hudl.com/authorize?x=1\n",
            )
            .unwrap();
            assert_eq!(
                pinned.login_entry,
                LoginEntry::Url("https://identity.hudl.com/authorize?x=1".into())
            );

            assert!(ProbeConfig::from_yaml_str("login_entry: guess").is_err());
        }

        #[test]
        fn test_yaml_round_trip_of_pinned_entry() {
            let mut config = ProbeConfig::default();
            config.login_entry = LoginEntry::Url("https://identity.hudl.com/a".into());
            let yaml = serde_yaml_ng::to_string(&config).unwrap();
            assert_eq!(ProbeConfig::from_yaml_str(&yaml).unwrap(), config);
        }

        #[test]
        fn test_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("probe.yaml");
            std::fs::write(&path, "sync_password_step: false\n").unwrap();
            let config = ProbeConfig::from_file(&path).unwrap();
            assert!(!config.sync_password_step);
        }

        #[test]
        fn test_missing_file() {
            let err = ProbeConfig::from_file(Path::new("/nonexistent/probe.yaml")).unwrap_err();
            assert!(matches!(err, ProbeError::ConfigError { .. }));
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let mut config = ProbeConfig::default();
            config
                .apply_overrides(lookup(&[
                    (APP_URL_ENV, "http://localhost:3000"),
                    (LOGIN_ENTRY_URL_ENV, "https://identity.hudl.com/authorize?s=1"),
                    (HEADLESS_ENV, "false"),
                    (CHROMIUM_PATH_ENV, "/usr/bin/chromium"),
                ]))
                .unwrap();
            assert_eq!(config.app_url, "http://localhost:3000");
            assert!(matches!(config.login_entry, LoginEntry::Url(_)));
            assert!(!config.browser.headless);
            assert_eq!(
                config.browser.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );
        }

        #[test]
        fn test_blank_override_ignored() {
            let mut config = ProbeConfig::default();
            config.apply_overrides(lookup(&[(APP_URL_ENV, "  ")])).unwrap();
            assert_eq!(config.app_url, "https://www.hudl.com");
        }

        #[test]
        fn test_bad_flag_rejected() {
            let mut config = ProbeConfig::default();
            let err = config
                .apply_overrides(lookup(&[(HEADLESS_ENV, "maybe")]))
                .unwrap_err();
            assert!(err.to_string().contains(HEADLESS_ENV));
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn test_identity_origin_with_path_rejected() {
            let config = ProbeConfig {
                identity_origin: "https://identity.hudl.com/u/login".into(),
                ..ProbeConfig::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_bad_app_url_rejected() {
            let config = ProbeConfig {
                app_url: "not a url".into(),
                ..ProbeConfig::default()
            };
            assert!(matches!(
                config.validate().unwrap_err(),
                ProbeError::InvalidUrl { .. }
            ));
        }

        #[test]
        fn test_zero_poll_interval_rejected() {
            let mut config = ProbeConfig::default();
            config.timeouts.poll_interval_ms = 0;
            assert!(config.validate().is_err());
        }
    }
}
