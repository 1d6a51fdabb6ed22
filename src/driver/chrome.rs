//! [`PageDriver`] backed by a Chromium session over CDP (`chromiumoxide`).
//!
//! # Stale detection
//!
//! CDP reports a missing child and a detached parent with the same
//! "could not find node" error. When an element-scoped call fails, the
//! element is asked whether it is still connected to the document; a
//! disconnected element is reported as stale, anything else as not found or
//! a driver error.
//!
//! Transport failures (closed websocket, dead browser process) are never
//! folded into a lookup miss or a stale card; they surface as
//! [`ScrapeError::Driver`] and end the run.

use super::{By, Lookup, PageDriver};
use crate::error::{Result, ScrapeError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const IS_CONNECTED_JS: &str = "function() { return this.isConnected; }";

pub struct ChromeDriver {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch Chromium and open a blank page.
    #[instrument(level = "info")]
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(1280, 1024)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::Driver(format!("Failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Driver(format!("Failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Driver(format!("Failed to create page: {e}")))?;

        info!(headless, "Browser launched");
        Ok(Self {
            browser: Some(browser),
            page,
            handler,
        })
    }

    async fn query(&self, by: By, selector: &str) -> Result<Option<Element>> {
        let res = match by {
            By::Css => self.page.find_element(selector).await,
            By::XPath => self.page.find_xpath(selector).await,
        };
        match res {
            Ok(el) => Ok(Some(el)),
            Err(e) if is_session_loss(&e) => Err(session_lost(e)),
            Err(e) => {
                debug!(selector, error = %e, "Lookup miss");
                Ok(None)
            }
        }
    }
}

/// The connection to the browser is gone, as opposed to a protocol-level
/// error about one node or object.
fn is_session_loss(e: &CdpError) -> bool {
    matches!(
        e,
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::NoResponse | CdpError::ChannelSendError(_)
    )
}

fn session_lost(e: CdpError) -> ScrapeError {
    ScrapeError::Driver(format!("Browser session lost: {e}"))
}

/// Ask the page whether `element` is still in the document.
///
/// An object the page can no longer resolve (released, or its execution
/// context gone after a navigation) counts as detached.
async fn check_attached(element: &Element) -> Result<bool> {
    match element.call_js_fn(IS_CONNECTED_JS, false).await {
        Ok(ret) => Ok(ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false)),
        Err(e) if is_session_loss(&e) => Err(session_lost(e)),
        Err(e) => {
            debug!(error = %e, "Element no longer resolvable");
            Ok(false)
        }
    }
}

/// Map a failed element-scoped call to stale or a plain driver error.
async fn element_error(element: &Element, e: CdpError) -> ScrapeError {
    if is_session_loss(&e) {
        return session_lost(e);
    }
    match check_attached(element).await {
        Ok(true) => ScrapeError::Driver(e.to_string()),
        Ok(false) => ScrapeError::StaleHandle,
        Err(lost) => lost,
    }
}

impl PageDriver for ChromeDriver {
    type Handle = Element;

    #[instrument(level = "info", skip(self))]
    async fn open(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Driver(format!("Failed to navigate to {url}: {e}")))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            let closed = browser.close().await;
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "Browser process did not exit cleanly");
            }
            self.handler.abort();
            closed.map_err(|e| ScrapeError::Driver(format!("Failed to close browser: {e}")))?;
            info!("Browser closed");
        }
        Ok(())
    }

    async fn find(&self, by: By, selector: &str, timeout: Duration) -> Result<Lookup<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(el) = self.query(by, selector).await? {
                return Ok(Lookup::Found(el));
            }
            if Instant::now() >= deadline {
                return Ok(Lookup::NotFound);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(&self, by: By, selector: &str) -> Result<Vec<Element>> {
        let res = match by {
            By::Css => self.page.find_elements(selector).await,
            By::XPath => self.page.find_xpaths(selector).await,
        };
        match res {
            Ok(els) => Ok(els),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) if is_session_loss(&e) => Err(session_lost(e)),
            Err(e) => Err(ScrapeError::Driver(format!("find_all({selector}) failed: {e}"))),
        }
    }

    async fn find_within(&self, parent: &Element, selector: &str) -> Result<Lookup<Element>> {
        match parent.find_element(selector).await {
            Ok(el) => Ok(Lookup::Found(el)),
            Err(e) if is_session_loss(&e) => Err(session_lost(e)),
            Err(e) => {
                if !check_attached(parent).await? {
                    return Ok(Lookup::Stale);
                }
                debug!(selector, error = %e, "Child lookup miss");
                Ok(Lookup::NotFound)
            }
        }
    }

    async fn is_attached(&self, element: &Element) -> Result<bool> {
        check_attached(element).await
    }

    async fn wait_until_present(&self, by: By, selector: &str, timeout: Duration) -> Result<bool> {
        Ok(self.find(by, selector, timeout).await?.found().is_some())
    }

    async fn click(&self, element: &Element) -> Result<()> {
        match element.click().await {
            Ok(_) => Ok(()),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
        if let Err(e) = element.focus().await {
            return Err(element_error(element, e).await);
        }
        match element.type_str(text).await {
            Ok(_) => Ok(()),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn submit(&self, element: &Element) -> Result<()> {
        match element.press_key("Enter").await {
            Ok(_) => Ok(()),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn get_attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        match element.attribute(name).await {
            Ok(value) => Ok(value),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn read_text(&self, element: &Element) -> Result<String> {
        match element.inner_text().await {
            Ok(text) => Ok(text.unwrap_or_default()),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        match element.scroll_into_view().await {
            Ok(_) => Ok(()),
            Err(e) => Err(element_error(element, e).await),
        }
    }

    async fn select_by_label(&self, select: &Element, label: &str) -> Result<bool> {
        let label_js = serde_json::to_string(label)
            .map_err(|e| ScrapeError::Driver(format!("Cannot encode option label: {e}")))?;
        let script = format!(
            r#"function() {{
                const wanted = {label_js}.trim().toLowerCase();
                const opt = Array.from(this.options || [])
                    .find(o => o.text.trim().toLowerCase() === wanted);
                if (!opt) return false;
                this.value = opt.value;
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"#
        );
        match select.call_js_fn(script, false).await {
            Ok(ret) => Ok(ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false)),
            Err(e) => Err(element_error(select, e).await),
        }
    }
}
