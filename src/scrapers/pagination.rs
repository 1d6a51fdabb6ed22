//! "Show more" pagination on the search results page.
//!
//! A button that goes stale between lookup and click is looked up again
//! once. If the fresh button is stale too, the list is treated as complete
//! so the cards collected so far are kept.

use crate::config::SiteConfig;
use crate::driver::{By, Lookup, PageDriver};
use crate::error::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of asking the page for more results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The button was clicked; new cards may follow.
    Clicked,
    /// No button on the page: the result list is complete.
    NoMore,
}

pub struct LoadMoreButton<'a, D> {
    driver: &'a D,
    config: &'a SiteConfig,
}

impl<'a, D: PageDriver> LoadMoreButton<'a, D> {
    pub fn new(driver: &'a D, config: &'a SiteConfig) -> Self {
        Self { driver, config }
    }

    /// Scroll to the show-more button and click it.
    pub async fn reveal_more(&self) -> Result<RevealOutcome> {
        let (by, selector) = By::parse(&self.config.selectors.show_more);
        let timeout = self.config.timeouts.lookup();
        let mut attempt = 1;
        loop {
            let button = match self.driver.find(by, selector, timeout).await? {
                Lookup::Found(button) => button,
                Lookup::NotFound | Lookup::Stale => {
                    info!("No show-more button; result list is complete");
                    return Ok(RevealOutcome::NoMore);
                }
            };
            match self.press(&button).await {
                Ok(()) => {
                    debug!(attempt, "Clicked show-more");
                    return Ok(RevealOutcome::Clicked);
                }
                Err(ScrapeError::StaleHandle) if attempt == 1 => {
                    debug!("Show-more button went stale; looking it up again");
                    attempt += 1;
                }
                Err(ScrapeError::StaleHandle) => {
                    warn!("Show-more button stale twice; treating result list as complete");
                    return Ok(RevealOutcome::NoMore);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn press(&self, button: &D::Handle) -> Result<()> {
        self.driver.scroll_into_view(button).await?;
        self.driver.click(button).await
    }

    /// Wait until more than `seen` result cards are on the page.
    ///
    /// Returns `false` if the reveal timeout elapses first.
    pub async fn wait_for_more(&self, seen: usize) -> Result<bool> {
        let (by, results) = By::parse(&self.config.selectors.results);
        let deadline = Instant::now() + self.config.timeouts.reveal();
        loop {
            let count = self.driver.find_all(by, results).await?.len();
            if count > seen {
                debug!(seen, count, "New results revealed");
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
