//! Search flow on the news site: open, search, choose the sort order.
//!
//! The entry page may show a cookie banner; it is dismissed when present.
//! A missing search box ends the run. A missing sort control or an unknown
//! sort label only costs the requested ordering, so the run continues with
//! the site's default.
//!
//! Changing the sort refetches the result list asynchronously. The flow
//! waits until the first card listed before the change has left the page,
//! so collection never starts on the old ordering.

use crate::config::SiteConfig;
use crate::driver::{By, Lookup, PageDriver};
use crate::error::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct SearchFlow<'a, D> {
    driver: &'a D,
    config: &'a SiteConfig,
}

impl<'a, D: PageDriver> SearchFlow<'a, D> {
    pub fn new(driver: &'a D, config: &'a SiteConfig) -> Self {
        Self { driver, config }
    }

    /// Open the site, run the search and apply the sort order.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, search_phrase: &str, sort_category: &str) -> Result<()> {
        self.driver.open(&self.config.entry_url).await?;
        self.dismiss_cookie_banner().await?;
        self.search(search_phrase).await?;
        self.sort_by(sort_category).await?;
        Ok(())
    }

    async fn dismiss_cookie_banner(&self) -> Result<()> {
        let (by, selector) = By::parse(&self.config.selectors.cookie_accept);
        if let Lookup::Found(button) = self
            .driver
            .find(by, selector, self.config.timeouts.lookup())
            .await?
        {
            self.driver.click(&button).await?;
            info!("Dismissed cookie banner");
        }
        Ok(())
    }

    async fn search(&self, search_phrase: &str) -> Result<()> {
        let s = &self.config.selectors;
        let t = &self.config.timeouts;

        // The trigger only exists on layouts that hide the search bar.
        let (by, selector) = By::parse(&s.search_trigger);
        if let Lookup::Found(trigger) = self.driver.find(by, selector, t.lookup()).await? {
            self.driver.click(&trigger).await?;
        }

        let (by, selector) = By::parse(&s.search_input);
        let input = match self.driver.find(by, selector, t.element()).await? {
            Lookup::Found(input) => input,
            Lookup::NotFound | Lookup::Stale => {
                return Err(ScrapeError::Timeout {
                    what: "search input".to_string(),
                    secs: t.element_secs,
                });
            }
        };
        self.driver.type_text(&input, search_phrase).await?;

        let (by, selector) = By::parse(&s.search_submit);
        match self.driver.find(by, selector, t.lookup()).await? {
            Lookup::Found(button) => self.driver.click(&button).await?,
            Lookup::NotFound | Lookup::Stale => self.driver.submit(&input).await?,
        }

        let (by, results) = By::parse(&s.results);
        if !self.driver.wait_until_present(by, results, t.element()).await? {
            // No results is a valid outcome; the collector reports it.
            info!(%search_phrase, "No result cards after search");
        } else {
            info!(%search_phrase, "Search results loaded");
        }
        Ok(())
    }

    async fn sort_by(&self, sort_category: &str) -> Result<()> {
        let s = &self.config.selectors;
        let (by, selector) = By::parse(&s.sort_select);
        let select = match self
            .driver
            .find(by, selector, self.config.timeouts.lookup())
            .await?
        {
            Lookup::Found(select) => select,
            Lookup::NotFound | Lookup::Stale => {
                warn!(%sort_category, "No sort control; keeping default order");
                return Ok(());
            }
        };

        let (by, results) = By::parse(&s.results);
        let first_before = self.driver.find_all(by, results).await?.into_iter().next();

        match self.driver.select_by_label(&select, sort_category).await {
            Ok(true) => {
                info!(%sort_category, "Applied sort order");
                if let Some(card) = first_before {
                    self.wait_for_refresh(&card).await?;
                }
                self.driver
                    .wait_until_present(by, results, self.config.timeouts.element())
                    .await?;
            }
            Ok(false) => warn!(%sort_category, "Unknown sort option; keeping default order"),
            Err(ScrapeError::StaleHandle) => {
                warn!(%sort_category, "Sort control went stale; keeping default order")
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Poll until `card` is detached, bounded by the element timeout.
    async fn wait_for_refresh(&self, card: &D::Handle) -> Result<()> {
        let deadline = Instant::now() + self.config.timeouts.element();
        loop {
            if !self.driver.is_attached(card).await? {
                debug!("Result list refreshed after sorting");
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = self.config.timeouts.element_secs,
                    "Result list did not refresh after sorting; order may be stale"
                );
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
