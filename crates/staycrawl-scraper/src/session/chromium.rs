//! Headless Chromium engine driven over the DevTools protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{BrowsingContext, RenderingEngine};
use crate::error::ScraperError;

/// How often `wait_for_selector` re-checks the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct ChromiumSettings {
    pub headless: bool,
    pub user_agent: String,
    pub accept_language: String,
}

/// A Chromium process plus the task pumping its CDP event stream.
pub struct ChromiumEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
    connection_closed: Arc<AtomicBool>,
    default: ChromiumContext,
    settings: ChromiumSettings,
}

impl ChromiumEngine {
    /// Starts Chromium and opens the default tab.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Session`] if the browser cannot be found,
    /// configured, or started.
    pub async fn launch(settings: ChromiumSettings) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--lang={}", primary_language(&settings.accept_language)))
            .window_size(1366, 768);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| ScraperError::Session(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Session(format!("browser launch failed: {e}")))?;

        let connection_closed = Arc::new(AtomicBool::new(false));
        let closed_flag = Arc::clone(&connection_closed);
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
            closed_flag.store(true, Ordering::SeqCst);
        });

        let mut engine = Self {
            default: ChromiumContext::detached(),
            browser,
            handler_task,
            connection_closed,
            settings,
        };
        match engine.open_tab().await {
            Ok(tab) => engine.default = tab,
            Err(e) => {
                engine.handler_task.abort();
                return Err(ScraperError::Session(format!("default tab: {e}")));
            }
        }
        tracing::info!(headless = engine.settings.headless, "chromium session started");
        Ok(engine)
    }

    async fn open_tab(&self) -> Result<ChromiumContext, ScraperError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| self.classify(&e, "open tab"))?;

        let mut overrides = SetUserAgentOverrideParams::new(self.settings.user_agent.clone());
        overrides.accept_language = Some(self.settings.accept_language.clone());
        page.execute(overrides)
            .await
            .map_err(|e| self.classify(&e, "set headers"))?;

        Ok(ChromiumContext {
            page: Some(page),
            connection_closed: Arc::clone(&self.connection_closed),
        })
    }

    fn classify(&self, err: &CdpError, action: &str) -> ScraperError {
        classify(err, action, &self.connection_closed)
    }
}

fn primary_language(accept_language: &str) -> &str {
    accept_language
        .split([',', ';'])
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("en-US")
}

/// Maps a CDP failure to the crawl's error taxonomy: a dead connection is a
/// session failure, anything else is local to the current page.
fn classify(err: &CdpError, action: &str, connection_closed: &AtomicBool) -> ScraperError {
    let dead = connection_closed.load(Ordering::SeqCst)
        || matches!(err, CdpError::Ws(_) | CdpError::ChannelSendError(_));
    if dead {
        ScraperError::Session(format!("{action}: {err}"))
    } else {
        ScraperError::Script(format!("{action}: {err}"))
    }
}

#[async_trait]
impl RenderingEngine for ChromiumEngine {
    type Context = ChromiumContext;

    fn default_context(&self) -> &ChromiumContext {
        &self.default
    }

    async fn new_context(&self) -> Result<ChromiumContext, ScraperError> {
        self.open_tab().await
    }

    async fn shutdown(mut self) -> Result<(), ScraperError> {
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "waiting for chromium to exit failed");
        }
        self.handler_task.abort();
        result
            .map(|_| ())
            .map_err(|e| ScraperError::Session(format!("browser close failed: {e}")))
    }
}

/// One Chromium tab.
pub struct ChromiumContext {
    page: Option<Page>,
    connection_closed: Arc<AtomicBool>,
}

impl ChromiumContext {
    /// Placeholder used only while the engine is being constructed.
    fn detached() -> Self {
        Self {
            page: None,
            connection_closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Session("tab is not attached".to_owned()))
    }

    fn classify(&self, err: &CdpError, action: &str) -> ScraperError {
        classify(err, action, &self.connection_closed)
    }

    async fn selector_present(&self, selector: &str) -> Result<bool, ScraperError> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| ScraperError::Script(format!("encode selector: {e}")))?;
        let script = format!("document.querySelector({literal}) !== null");
        let value = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| self.classify(&e, "query selector"))?;
        Ok(value.into_value::<bool>().unwrap_or(false))
    }
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.page()?.goto(url).await.map_err(|e| match self.classify(&e, "navigate") {
            ScraperError::Script(reason) => ScraperError::Navigation {
                url: url.to_owned(),
                reason,
            },
            other => other,
        })?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        let poll = async {
            loop {
                match self.selector_present(selector).await {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => tracing::trace!(selector, error = %e, "selector probe failed"),
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(ScraperError::ElementTimeout {
                selector: selector.to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        self.wait_for_selector(selector, timeout).await?;
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| self.classify(&e, "find element"))?;
        element
            .click()
            .await
            .map_err(|e| self.classify(&e, "click"))?;
        Ok(())
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page()?
            .content()
            .await
            .map_err(|e| self.classify(&e, "read content"))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        let page = self.page()?.clone();
        page.close().await.map_err(|e| self.classify(&e, "close tab"))
    }
}
