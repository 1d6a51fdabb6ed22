//! Field extraction from one search result card.
//!
//! Two entry points:
//! - [`ArticleExtractor::read_date`]: date field only, used by the collector
//!   while deciding where the date window ends
//! - [`ArticleExtractor::extract`]: every field, used once an article is
//!   known to be in range
//!
//! A stale card is reported as [`ScrapeError::StaleHandle`] and never retried
//! here; the caller knows how to re-resolve the card by position. Any other
//! failure is reported as [`ScrapeError::ExtractionFailed`] so that it costs
//! one card, not the run.

use crate::config::Selectors;
use crate::driver::{Lookup, PageDriver};
use crate::error::{Result, ScrapeError};
use crate::models::{DATE_NOT_FOUND, RawArticle};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy)]
pub struct ArticleExtractor<'a> {
    selectors: &'a Selectors,
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(selectors: &'a Selectors) -> Self {
        Self { selectors }
    }

    /// Date text of a card, or `None` when the card has no date element.
    pub async fn read_date<D: PageDriver>(&self, driver: &D, card: &D::Handle) -> Result<Option<String>> {
        self.read_date_text(driver, card).await.map_err(card_error)
    }

    async fn read_date_text<D: PageDriver>(&self, driver: &D, card: &D::Handle) -> Result<Option<String>> {
        match driver.find_within(card, &self.selectors.article_date).await? {
            Lookup::Found(el) => Ok(Some(driver.read_text(&el).await?.trim().to_string())),
            Lookup::NotFound => Ok(None),
            Lookup::Stale => Err(ScrapeError::StaleHandle),
        }
    }

    /// Read title, date, description and thumbnail URL from a card.
    ///
    /// Missing date becomes [`DATE_NOT_FOUND`], missing description an empty
    /// string and missing image `None`. A missing title fails the card.
    #[instrument(level = "debug", skip_all)]
    pub async fn extract<D: PageDriver>(&self, driver: &D, card: &D::Handle) -> Result<RawArticle> {
        self.extract_fields(driver, card).await.map_err(card_error)
    }

    async fn extract_fields<D: PageDriver>(&self, driver: &D, card: &D::Handle) -> Result<RawArticle> {
        let s = self.selectors;

        let title = match driver.find_within(card, &s.article_title).await? {
            Lookup::Found(el) => driver.read_text(&el).await?.trim().to_string(),
            Lookup::NotFound => {
                return Err(ScrapeError::ExtractionFailed("title element not found".to_string()));
            }
            Lookup::Stale => return Err(ScrapeError::StaleHandle),
        };

        let date_text = self
            .read_date_text(driver, card)
            .await?
            .unwrap_or_else(|| DATE_NOT_FOUND.to_string());

        let description = match driver.find_within(card, &s.article_description).await? {
            Lookup::Found(el) => driver.read_text(&el).await?.trim().to_string(),
            Lookup::NotFound => String::new(),
            Lookup::Stale => return Err(ScrapeError::StaleHandle),
        };

        let image_url = match driver.find_within(card, &s.article_image).await? {
            Lookup::Found(el) => driver
                .get_attribute(&el, "src")
                .await?
                .filter(|src| !src.trim().is_empty()),
            Lookup::NotFound => None,
            Lookup::Stale => return Err(ScrapeError::StaleHandle),
        };

        debug!(%title, %date_text, has_image = image_url.is_some(), "Extracted card");
        Ok(RawArticle {
            title,
            date_text,
            description,
            image_url,
        })
    }
}

/// Keep stale cards distinguishable; everything else fails just this card.
fn card_error(e: ScrapeError) -> ScrapeError {
    match e {
        ScrapeError::StaleHandle => ScrapeError::StaleHandle,
        ScrapeError::ExtractionFailed(reason) => ScrapeError::ExtractionFailed(reason),
        other => ScrapeError::ExtractionFailed(other.to_string()),
    }
}
