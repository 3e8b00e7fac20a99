//! Chrome DevTools Protocol implementation of the page driver

use crate::driver::PageDriver;
use async_trait::async_trait;
use gatecheck_core::{BrowserSettings, GatecheckError, Locator, Result};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Live browser context driven over CDP
pub struct ChromeDriver {
    /// Underlying browser instance (kept alive for tab lifetime)
    #[allow(dead_code)]
    browser: Browser,
    /// Current active tab
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch a browser with the given settings
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            settings.headless, settings.window_width, settings.window_height
        );

        let launch_options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some((settings.window_width, settings.window_height)))
            .build()
            .map_err(|e| GatecheckError::Driver(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| GatecheckError::Driver(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| GatecheckError::Driver(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_secs(settings.nav_timeout_secs));

        info!("Browser launched successfully");

        Ok(Self { browser, tab })
    }

    /// Connect to an existing browser instance
    ///
    /// # Arguments
    /// * `port` - Chrome DevTools Protocol port (typically 9222)
    pub async fn connect(port: u16) -> Result<Self> {
        info!("Connecting to existing browser on port {}", port);

        let browser = Browser::connect(format!("http://127.0.0.1:{}", port))
            .map_err(|e| GatecheckError::Driver(format!("Failed to connect to browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| GatecheckError::Driver(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab })
    }

    fn find(&self, locator: &Locator) -> Result<Element<'_>> {
        let found = match Query::from(locator) {
            Query::Css(selector) => self.tab.find_element(&selector),
            Query::XPath(expr) => self.tab.find_element_by_xpath(&expr),
        };
        found.map_err(|_| GatecheckError::ElementNotFound {
            locator: locator.to_string(),
        })
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| GatecheckError::Driver(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| GatecheckError::Driver(format!("Navigation timeout for {}: {}", url, e)))?;

        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| GatecheckError::Driver(format!("Reload failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| GatecheckError::Driver(format!("Navigation timeout after reload: {}", e)))?;
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        debug!("Waiting for {} (timeout: {:?})", locator, timeout);

        let waited = match Query::from(locator) {
            Query::Css(selector) => self
                .tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .map(|_| ()),
            Query::XPath(expr) => self
                .tab
                .wait_for_xpath_with_custom_timeout(&expr, timeout)
                .map(|_| ()),
        };

        waited.map_err(|_| GatecheckError::StepTimeout {
            description: locator.to_string(),
            waited_ms: timeout.as_millis() as u64,
        })
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        let script = format!("{} !== null", Query::from(locator).js_lookup());
        let value = self.evaluate(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = {};
                if (!el) return false;
                const style = window.getComputedStyle(el);
                if (style.display === 'none' || style.visibility === 'hidden') return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})()"#,
            Query::from(locator).js_lookup()
        );
        let value = self.evaluate(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("Clicking {}", locator);
        self.find(locator)?
            .click()
            .map_err(|e| GatecheckError::Driver(format!("Click on {} failed: {}", locator, e)))?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        debug!("Filling {}", locator);
        self.find(locator)?
            .type_into(text)
            .map_err(|e| GatecheckError::Driver(format!("Typing into {} failed: {}", locator, e)))?;
        Ok(())
    }

    async fn hover(&self, locator: &Locator) -> Result<()> {
        debug!("Hovering {}", locator);
        self.find(locator)?
            .move_mouse_over()
            .map_err(|e| GatecheckError::Driver(format!("Hover over {} failed: {}", locator, e)))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| GatecheckError::Driver(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| GatecheckError::Driver(format!("Screenshot capture failed: {}", e)))
    }

    async fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| GatecheckError::Driver(format!("Content capture failed: {}", e)))
    }

    async fn clear_storage(&self) -> Result<()> {
        debug!("Clearing client-side storage");
        self.evaluate("localStorage.clear(); sessionStorage.clear();")
            .await?;
        Ok(())
    }
}

/// A locator lowered to one of the two query languages CDP understands
enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    /// JavaScript expression resolving to the first matching element or null
    fn js_lookup(&self) -> String {
        match self {
            Query::Css(selector) => {
                format!("document.querySelector({})", js_literal(selector))
            }
            Query::XPath(expr) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_literal(expr)
            ),
        }
    }
}

impl From<&Locator> for Query {
    fn from(locator: &Locator) -> Self {
        match locator {
            Locator::Css(selector) => Query::Css(selector.clone()),
            Locator::XPath(expr) => Query::XPath(expr.clone()),
            Locator::Text(needle) => Query::XPath(text_xpath(needle)),
        }
    }
}

/// XPath matching the deepest element whose normalized text contains the
/// needle, so clicks land on the labeled control rather than on `body`
fn text_xpath(needle: &str) -> String {
    let lit = xpath_literal(needle);
    format!(
        "//*[contains(normalize-space(.), {lit})][not(.//*[contains(normalize-space(.), {lit})])]",
        lit = lit
    )
}

/// Quote a string as an XPath 1.0 literal
///
/// XPath has no escape syntax; strings containing both quote kinds need the
/// concat() form.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Quote a string as a JavaScript literal for injected probe scripts
fn js_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
