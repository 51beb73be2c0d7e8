//! Browser automation seam consumed by the scraper.
//!
//! The scraper only needs five capabilities: open an isolated context,
//! navigate, wait for a selector, pull text/markup out by selector, close.
//! The default backend is plain HTTP (`reqwest` + `scraper`): the storefront
//! ships its plan data inside the `__NEXT_DATA__` script tag, so no script
//! execution is needed to read prices. Tests inject a scripted fake instead.

use std::time::Duration;

use scraper::{Html, Selector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("timed out after {0:?} waiting for `{1}`")]
    WaitTimeout(Duration, String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no page loaded")]
    NoPage,
    #[error("invalid selector `{0}`")]
    BadSelector(String),
}

/// HTTP-ish status of the last navigation, reduced to what the scraper's
/// URL-fallback logic cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    Ok,
    Redirect,
    NotFound,
    RateLimited,
    Other(u16),
}

impl NavStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => NavStatus::Ok,
            301 | 302 | 303 | 307 | 308 => NavStatus::Redirect,
            404 => NavStatus::NotFound,
            429 => NavStatus::RateLimited,
            other => NavStatus::Other(other),
        }
    }
}

/// An isolated browsing context. One per country, so no cookies, cache or
/// locale state bleeds between extractions.
pub trait PageContext {
    fn navigate(&mut self, url: &str) -> Result<NavStatus, BrowserError>;

    /// Block until `selector` matches in the current page, or time out.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Outer HTML of the first element matching `selector` (`"html"` for the
    /// whole document).
    fn extract_text(&self, selector: &str) -> Result<String, BrowserError>;

    fn close(self: Box<Self>);
}

/// Factory for isolated contexts.
pub trait Browser {
    fn open_context(&self) -> Result<Box<dyn PageContext>, BrowserError>;
}

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain-HTTP backend. Each context builds its own client so cookie jars are
/// never shared across countries.
pub struct HttpBrowser {
    timeout: Duration,
}

impl HttpBrowser {
    pub fn new(timeout: Duration) -> Self {
        HttpBrowser { timeout }
    }
}

impl Browser for HttpBrowser {
    fn open_context(&self) -> Result<Box<dyn PageContext>, BrowserError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            // Redirects are reported, not followed; the scraper decides
            // whether to fall back to the next storefront URL.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .build()?;
        Ok(Box::new(HttpContext { client, page: None }))
    }
}

struct HttpContext {
    client: reqwest::blocking::Client,
    page: Option<Html>,
}

fn parse_selector(selectors: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selectors).map_err(|_| BrowserError::BadSelector(selectors.to_string()))
}

impl PageContext for HttpContext {
    fn navigate(&mut self, url: &str) -> Result<NavStatus, BrowserError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()?;
        let status = NavStatus::from_code(response.status().as_u16());
        let body = response.text()?;
        self.page = Some(Html::parse_document(&body));
        Ok(status)
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let sel = parse_selector(selector)?;
        let page = self.page.as_ref().ok_or(BrowserError::NoPage)?;
        if page.select(&sel).next().is_some() {
            return Ok(());
        }
        // Static HTML never changes after load, so a single miss is final;
        // a scripted-DOM backend would poll up to the deadline here.
        Err(BrowserError::WaitTimeout(timeout, selector.to_string()))
    }

    fn extract_text(&self, selector: &str) -> Result<String, BrowserError> {
        let page = self.page.as_ref().ok_or(BrowserError::NoPage)?;
        let sel = parse_selector(selector)?;
        let element = page
            .select(&sel)
            .next()
            .ok_or_else(|| BrowserError::WaitTimeout(Duration::ZERO, selector.to_string()))?;
        Ok(element.html())
    }

    fn close(self: Box<Self>) {}
}
