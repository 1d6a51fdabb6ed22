//! Page automation capabilities consumed by the scraping core.
//!
//! The core never talks to a browser directly. Everything it needs from the
//! live page goes through [`PageDriver`], implemented for a real Chromium
//! session by [`chrome::ChromeDriver`] and by an in-memory page in tests.
//!
//! # Contract
//!
//! - Every call either returns within its bound or reports a timeout.
//! - Calls against one driver are strictly sequenced; the page is a single
//!   mutable resource and the core never overlaps requests against it.
//! - Expected absence is a value ([`Lookup::NotFound`]), not an error.
//! - A handle detached by page mutation reports [`Lookup::Stale`] on lookup,
//!   or [`ScrapeError::StaleHandle`] on read/interaction.

pub mod chrome;

use crate::error::Result;
use std::time::Duration;

/// Selector strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum By {
    Css,
    XPath,
}

impl By {
    /// Configured selectors are CSS unless prefixed with `xpath:`.
    pub fn parse(selector: &str) -> (By, &str) {
        match selector.strip_prefix("xpath:") {
            Some(xpath) => (By::XPath, xpath),
            None => (By::Css, selector),
        }
    }
}

/// Result of a single element lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<H> {
    Found(H),
    NotFound,
    Stale,
}

impl<H> Lookup<H> {
    pub fn found(self) -> Option<H> {
        match self {
            Lookup::Found(h) => Some(h),
            Lookup::NotFound | Lookup::Stale => None,
        }
    }
}

/// Capabilities of one live browser page.
///
/// `find_within` lookups are relative to a parent handle and take no wait:
/// result cards are already rendered when the core inspects them.
pub trait PageDriver {
    /// Opaque reference into the live page.
    type Handle;

    /// Navigate the session to `url`.
    async fn open(&self, url: &str) -> Result<()>;

    /// End the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;

    /// Single lookup, polling until found or `timeout` elapses.
    async fn find(&self, by: By, selector: &str, timeout: Duration) -> Result<Lookup<Self::Handle>>;

    /// All current matches in document order, no implicit wait.
    async fn find_all(&self, by: By, selector: &str) -> Result<Vec<Self::Handle>>;

    /// Single CSS lookup under `parent`.
    async fn find_within(&self, parent: &Self::Handle, selector: &str) -> Result<Lookup<Self::Handle>>;

    async fn wait_until_present(&self, by: By, selector: &str, timeout: Duration) -> Result<bool>;

    async fn click(&self, element: &Self::Handle) -> Result<()>;

    async fn type_text(&self, element: &Self::Handle, text: &str) -> Result<()>;

    /// Submit the form the element belongs to (Enter key).
    async fn submit(&self, element: &Self::Handle) -> Result<()>;

    async fn get_attribute(&self, element: &Self::Handle, name: &str) -> Result<Option<String>>;

    async fn read_text(&self, element: &Self::Handle) -> Result<String>;

    async fn scroll_into_view(&self, element: &Self::Handle) -> Result<()>;

    /// Whether the element is still part of the document. `false` once the
    /// page has replaced or removed it.
    async fn is_attached(&self, element: &Self::Handle) -> Result<bool>;

    /// Choose the `<option>` whose visible label matches (case-insensitive).
    /// Returns `false` when no option carries that label.
    async fn select_by_label(&self, select: &Self::Handle, label: &str) -> Result<bool>;
}
