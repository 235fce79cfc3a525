//! In-memory rendering engine serving canned HTML by URL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{BrowsingContext, RenderingEngine};
use crate::error::ScraperError;

#[derive(Debug, Clone)]
pub(crate) enum FakePage {
    Html(String),
    /// Navigation never completes.
    Hang,
    /// Navigation fails immediately.
    Fail,
    /// Navigation reports a dead browser.
    Crash,
}

impl FakePage {
    pub(crate) fn html(body: &str) -> Self {
        FakePage::Html(body.to_owned())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeStats {
    pub(crate) opened: AtomicUsize,
    pub(crate) closed: AtomicUsize,
    pub(crate) clicks: Mutex<Vec<String>>,
    pub(crate) navigations: Mutex<Vec<String>>,
    shut_down: AtomicBool,
}

impl FakeStats {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub(crate) struct FakeContext {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<FakeStats>,
    current: Mutex<Option<String>>,
}

impl FakeContext {
    /// A detached tab already showing `html`.
    pub(crate) fn with_html(html: &str) -> Self {
        Self {
            pages: Arc::new(HashMap::new()),
            stats: Arc::new(FakeStats::default()),
            current: Mutex::new(Some(html.to_owned())),
        }
    }

    fn current_html(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    fn matches(&self, selector: &str) -> bool {
        let Some(html) = self.current_html() else {
            return false;
        };
        let Ok(selector) = Selector::parse(selector) else {
            return false;
        };
        let document = Html::parse_document(&html);
        let found = document.select(&selector).next().is_some();
        found
    }
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.stats.navigations.lock().unwrap().push(url.to_owned());
        match self.pages.get(url).cloned() {
            Some(FakePage::Html(body)) => {
                *self.current.lock().unwrap() = Some(body);
                Ok(())
            }
            Some(FakePage::Hang) => std::future::pending().await,
            Some(FakePage::Crash) => Err(ScraperError::Session("browser crashed".to_owned())),
            Some(FakePage::Fail) | None => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            }),
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScraperError> {
        if self.matches(selector) {
            Ok(())
        } else {
            Err(ScraperError::ElementTimeout {
                selector: selector.to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError> {
        self.wait_for_selector(selector, timeout).await?;
        self.stats.clicks.lock().unwrap().push(selector.to_owned());
        Ok(())
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.current_html()
            .ok_or_else(|| ScraperError::Script("no document loaded".to_owned()))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FakeEngine {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<FakeStats>,
    default: FakeContext,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        let pages = Arc::new(HashMap::new());
        let stats = Arc::new(FakeStats::default());
        let default = FakeContext {
            pages: Arc::clone(&pages),
            stats: Arc::clone(&stats),
            current: Mutex::new(None),
        };
        Self {
            pages,
            stats,
            default,
        }
    }

    pub(crate) fn with_page(self, url: &str, page: FakePage) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(url.to_owned(), page);
        let pages = Arc::new(pages);
        Self {
            default: FakeContext {
                pages: Arc::clone(&pages),
                stats: Arc::clone(&self.stats),
                current: Mutex::new(None),
            },
            pages,
            stats: self.stats,
        }
    }

    pub(crate) fn stats(&self) -> Arc<FakeStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl RenderingEngine for FakeEngine {
    type Context = FakeContext;

    fn default_context(&self) -> &FakeContext {
        &self.default
    }

    async fn new_context(&self) -> Result<FakeContext, ScraperError> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeContext {
            pages: Arc::clone(&self.pages),
            stats: Arc::clone(&self.stats),
            current: Mutex::new(None),
        })
    }

    async fn shutdown(self) -> Result<(), ScraperError> {
        self.stats.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
