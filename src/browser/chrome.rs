use crate::core::{BrowserConfig, Config, CssSelector, PageDriver, WaitCondition};
use crate::errors::{DriverError, DriverResult, Result, TableError};
use async_trait::async_trait;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::types::RemoteError;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const CLEAR_INPUT_JS: &str = r#"
    function() {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    }
"#;

// Chrome's reply to a selector it cannot parse
const INVALID_SELECTOR_MESSAGE: &str = "DOM Error while querying";

/// Sort a headless_chrome lookup failure for `selector` into a [`DriverError`].
///
/// Only `NoElementFound` means nothing matched. A rejected selector is
/// `InvalidSelector`; everything else is a session failure.
fn lookup_error(err: anyhow::Error, selector: &str) -> DriverError {
    if err.downcast_ref::<NoElementFound>().is_some() {
        return DriverError::NotFound(selector.to_string());
    }
    let rejected = err
        .downcast_ref::<RemoteError>()
        .map(|remote| remote.message.contains(INVALID_SELECTOR_MESSAGE))
        .unwrap_or(false);
    if rejected {
        DriverError::InvalidSelector(format!("{}: {}", selector, err))
    } else {
        DriverError::session(err)
    }
}

/// DOM node id of an element in the driver's tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeElement {
    node_id: u32,
}

/// [`PageDriver`] over a local Chrome tab.
pub struct ChromeDriver {
    // Owns the browser process; dropping it closes Chrome.
    _browser: Browser,
    tab: Arc<Tab>,
    session_id: String,
}

impl ChromeDriver {
    /// Start Chrome and open a tab, retrying up to `session.launch_attempts` times.
    pub async fn launch(config: &Config) -> Result<Self> {
        let attempts = config.session.launch_attempts.max(1);
        let backoff = Duration::from_millis(config.session.retry_backoff_ms);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::launch_once(&config.browser) {
                Ok((browser, tab)) => {
                    let session_id = uuid::Uuid::new_v4().to_string();
                    info!("Chrome session {} started on attempt {}", session_id, attempt);
                    return Ok(Self {
                        _browser: browser,
                        tab,
                        session_id,
                    });
                }
                Err(e) => {
                    warn!("Chrome launch attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                    if attempt < attempts {
                        tokio::time::sleep(backoff * attempt).await;
                    }
                }
            }
        }

        Err(TableError::SessionBootstrapFailure {
            attempts,
            last_error,
        })
    }

    fn launch_once(config: &BrowserConfig) -> std::result::Result<(Browser, Arc<Tab>), String> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--ignore-certificate-errors"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| e.to_string())?;

        let browser = Browser::new(launch_options).map_err(|e| e.to_string())?;
        let tab = browser.new_tab().map_err(|e| e.to_string())?;
        tab.set_default_timeout(Duration::from_millis(config.navigation_timeout_ms));

        Ok((browser, tab))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn navigate(&self, url: &Url) -> Result<()> {
        debug!("Session {} navigating to {}", self.session_id, url);
        self.tab
            .navigate_to(url.as_str())
            .map_err(DriverError::session)?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| DriverError::Session(format!("navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let png = self
            .tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(DriverError::session)?;
        Ok(png)
    }

    fn element(&self, handle: &ChromeElement) -> DriverResult<Element<'_>> {
        Element::new(&self.tab, handle.node_id).map_err(|e| {
            if e.downcast_ref::<NoElementFound>().is_some() {
                DriverError::StaleElement(format!("node {}", handle.node_id))
            } else {
                DriverError::session(e)
            }
        })
    }

    fn handle(element: &Element<'_>) -> ChromeElement {
        ChromeElement {
            node_id: element.node_id,
        }
    }

    fn is_present(&self, selector: &CssSelector) -> DriverResult<bool> {
        match self.tab.find_element(selector.as_str()) {
            Ok(_) => Ok(true),
            Err(e) => match lookup_error(e, selector.as_str()) {
                DriverError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = ChromeElement;

    async fn locate(&self, selector: &CssSelector) -> DriverResult<ChromeElement> {
        let element = self
            .tab
            .find_element(selector.as_str())
            .map_err(|e| lookup_error(e, selector.as_str()))?;
        Ok(Self::handle(&element))
    }

    async fn locate_all(&self, selector: &CssSelector) -> DriverResult<Vec<ChromeElement>> {
        // find_elements reports an empty match as NoElementFound
        match self.tab.find_elements(selector.as_str()) {
            Ok(elements) => Ok(elements.iter().map(Self::handle).collect()),
            Err(e) => match lookup_error(e, selector.as_str()) {
                DriverError::NotFound(_) => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn locate_within(
        &self,
        parent: &ChromeElement,
        selector: &CssSelector,
    ) -> DriverResult<ChromeElement> {
        let parent = self.element(parent)?;
        let element = parent
            .find_element(selector.as_str())
            .map_err(|e| lookup_error(e, selector.as_str()))?;
        Ok(Self::handle(&element))
    }

    async fn text(&self, element: &ChromeElement) -> DriverResult<String> {
        let text = self
            .element(element)?
            .get_inner_text()
            .map_err(DriverError::session)?;
        Ok(text.trim().to_string())
    }

    async fn attribute(&self, element: &ChromeElement, name: &str) -> DriverResult<Option<String>> {
        self.element(element)?
            .get_attribute_value(name)
            .map_err(DriverError::session)
    }

    async fn click(&self, element: &ChromeElement) -> DriverResult<()> {
        self.element(element)?
            .click()
            .map_err(DriverError::session)?;
        Ok(())
    }

    async fn send_keys(&self, element: &ChromeElement, text: &str) -> DriverResult<()> {
        self.element(element)?
            .type_into(text)
            .map_err(DriverError::session)?;
        Ok(())
    }

    async fn clear(&self, element: &ChromeElement) -> DriverResult<()> {
        self.element(element)?
            .call_js_fn(CLEAR_INPUT_JS, vec![], false)
            .map_err(DriverError::session)?;
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &CssSelector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> DriverResult<()> {
        let start = Instant::now();

        loop {
            let present = self.is_present(selector)?;
            let satisfied = match condition {
                WaitCondition::Appear => present,
                WaitCondition::Disappear => !present,
            };
            if satisfied {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    condition,
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(message: &str) -> anyhow::Error {
        RemoteError {
            code: -32000,
            message: message.to_string(),
        }
        .into()
    }

    #[test]
    fn no_element_found_is_not_found() {
        let err = lookup_error(NoElementFound {}.into(), "#inputs th");
        assert_eq!(err, DriverError::NotFound("#inputs th".to_string()));
    }

    #[test]
    fn rejected_selector_is_invalid() {
        let err = lookup_error(remote("DOM Error while querying"), "div.[[");
        assert!(matches!(err, DriverError::InvalidSelector(ref m) if m.starts_with("div.[[")));
    }

    #[test]
    fn other_remote_errors_are_session_failures() {
        let err = lookup_error(remote("No target with given id found"), "#inputs th");
        assert!(matches!(err, DriverError::Session(ref m) if m.contains("No target with given id")));
        assert!(!err.is_timeout());
    }

    #[test]
    fn transport_errors_are_session_failures() {
        let err = lookup_error(anyhow::anyhow!("connection closed"), "#inputs th");
        assert_eq!(err, DriverError::Session("connection closed".to_string()));
    }
}
