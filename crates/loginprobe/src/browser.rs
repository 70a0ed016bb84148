//! Chromium control over the Chrome `DevTools` Protocol.
//!
//! One Chromium process is launched per run. Every session gets its own
//! incognito browser context and page, so cookies and storage never leak
//! between test cases.

use crate::config::BrowserSettings;
use crate::device::Viewport;
use crate::driver::{BrowserDriver, ElementSnapshot};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::session::SessionFactory;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Launched Chromium shared by every session of a run
#[derive(Debug)]
pub struct ChromiumSessions {
    browser: Arc<Mutex<CdpBrowser>>,
    viewport: Viewport,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumSessions {
    /// Launch Chromium
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    pub async fn launch(settings: &BrowserSettings, viewport: Viewport) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder().window_size(viewport.width, viewport.height);

        if !settings.headless {
            builder = builder.with_head();
        }

        if !settings.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunchError { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        // Spawn handler task
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(headless = settings.headless, "chromium launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            viewport,
            handle,
        })
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessions {
    async fn new_driver(&self) -> ProbeResult<Box<dyn BrowserDriver>> {
        let (page, context) = {
            let browser = self.browser.lock().await;
            let context = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(page_err)?;
            let params = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context.clone())
                .build()
                .map_err(ProbeError::page)?;
            let page = browser.new_page(params).await.map_err(page_err)?;
            (page, context)
        };

        let mut driver = ChromiumDriver {
            page,
            context: Some(context),
            browser: Arc::clone(&self.browser),
        };
        driver.set_viewport(self.viewport, false).await?;
        Ok(Box::new(driver))
    }

    async fn shutdown(&self) -> ProbeResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| ProbeError::BrowserLaunchError {
                message: e.to_string(),
            })?;
        self.handle.abort();
        tracing::info!("chromium closed");
        Ok(())
    }
}

/// One page in its own incognito context
#[derive(Debug)]
pub struct ChromiumDriver {
    page: CdpPage,
    context: Option<BrowserContextId>,
    browser: Arc<Mutex<CdpBrowser>>,
}

/// `window` property lookup result
#[derive(Debug, Deserialize)]
struct PropertyProbe {
    present: bool,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

fn page_err(e: impl Display) -> ProbeError {
    ProbeError::page(e.to_string())
}

/// The page navigated away while a script was running
fn is_navigation_race(err: &ProbeError) -> bool {
    let message = err.to_string();
    message.contains("Execution context was destroyed")
        || message.contains("Cannot find context with specified id")
        || message.contains("Inspected target navigated or closed")
}

fn snapshot_script(selector: &Selector) -> String {
    format!(
        r"(() => {{
  const els = {collect};
  return els.map(el => {{
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const visible = rect.width > 0 && rect.height > 0
      && style.visibility !== 'hidden' && style.display !== 'none';
    return {{
      tag: el.tagName.toLowerCase(),
      text: (el.textContent || '').trim(),
      visible,
      enabled: !el.disabled,
      readonly: el.hasAttribute('readonly'),
      value: typeof el.value === 'string' ? el.value : null,
      color: style.color,
      validationMessage: typeof el.validationMessage === 'string' ? el.validationMessage : null,
      validity: el.validity ? {{
        valueMissing: el.validity.valueMissing,
        typeMismatch: el.validity.typeMismatch,
        valid: el.validity.valid,
      }} : null,
    }};
  }});
}})()",
        collect = selector.to_collect_query()
    )
}

/// Script that focuses (and optionally clicks) the first match
fn first_match_script(selector: &Selector, click: bool) -> String {
    let action = if click { "el.click();" } else { "el.focus();" };
    format!(
        "(() => {{ const el = {}[0]; if (!el) return false; el.scrollIntoView({{block: 'center'}}); {action} return true; }})()",
        selector.to_collect_query()
    )
}

impl ChromiumDriver {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(page_err)?
            .into_value()
            .map_err(page_err)
    }

    async fn run_on_first(&self, selector: &Selector, click: bool) -> ProbeResult<()> {
        let found: bool = self.eval(first_match_script(selector, click)).await?;
        if found {
            Ok(())
        } else {
            Err(ProbeError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(page_err)?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn set_viewport(&mut self, viewport: Viewport, mobile: bool) -> ProbeResult<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(if mobile { 2.0 } else { 1.0 })
            .mobile(mobile)
            .build()
            .map_err(ProbeError::page)?;
        self.page.execute(params).await.map_err(page_err)?;
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementSnapshot>> {
        match self.eval(snapshot_script(selector)).await {
            Err(err) if is_navigation_race(&err) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        match selector {
            Selector::Css(css) => {
                let element = self.page.find_element(css.as_str()).await.map_err(|_| {
                    ProbeError::ElementNotFound {
                        selector: selector.to_string(),
                    }
                })?;
                element.click().await.map_err(page_err)?;
                Ok(())
            }
            _ => self.run_on_first(selector, true).await,
        }
    }

    async fn type_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let css = match selector {
            Selector::Css(css) => css.clone(),
            _ => {
                self.run_on_first(selector, false).await?;
                ":focus".to_string()
            }
        };
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(|_| ProbeError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element
            .click()
            .await
            .map_err(|e| ProbeError::InputError {
                message: e.to_string(),
            })?
            .type_str(text)
            .await
            .map_err(|e| ProbeError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn window_property(&self, name: &str) -> ProbeResult<Option<serde_json::Value>> {
        let key = serde_json::to_string(name)?;
        let script = format!(
            "(() => Object.prototype.hasOwnProperty.call(window, {key}) \
             ? {{ present: true, value: window[{key}] ?? null }} \
             : {{ present: false }})()"
        );
        match self.eval::<PropertyProbe>(script).await {
            Ok(probe) if probe.present => {
                Ok(Some(probe.value.unwrap_or(serde_json::Value::Null)))
            }
            Ok(_) => Ok(None),
            // a destroyed context means the window the property lived on is gone
            Err(err) if is_navigation_race(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set_window_property(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> ProbeResult<()> {
        let key = serde_json::to_string(name)?;
        let script = format!("(() => {{ window[{key}] = {value}; return true; }})()");
        let _: bool = self.eval(script).await?;
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot =
            self.page
                .execute(params)
                .await
                .map_err(|e| ProbeError::ScreenshotError {
                    message: e.to_string(),
                })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| ProbeError::ScreenshotError {
                message: e.to_string(),
            })
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.page.clone().close().await.map_err(page_err)?;
        if let Some(context) = self.context.take() {
            let browser = self.browser.lock().await;
            browser
                .dispose_browser_context(context)
                .await
                .map_err(page_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_with_missing_executable_fails() {
        let settings = BrowserSettings {
            chromium_path: Some("/nonexistent/loginprobe-chromium".into()),
            ..BrowserSettings::default()
        };
        let err = ChromiumSessions::launch(&settings, Viewport::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ProbeError::BrowserLaunchError { .. }),
            "{err}"
        );
    }

    #[test]
    fn test_snapshot_script_embeds_selector() {
        let script = snapshot_script(&Selector::css("#username"));
        assert!(script.contains("document.querySelectorAll(\"#username\")"));
        assert!(script.contains("validationMessage"));
    }

    #[test]
    fn test_first_match_script() {
        let click = first_match_script(&Selector::text("Log In"), true);
        assert!(click.contains("el.click()"));
        let focus = first_match_script(&Selector::css("#password"), false);
        assert!(focus.contains("el.focus()"));
    }

    #[test]
    fn test_navigation_race_detection() {
        let err = ProbeError::page("Execution context was destroyed, most likely because of a navigation");
        assert!(is_navigation_race(&err));
        assert!(!is_navigation_race(&ProbeError::page("boom")));
    }
}
