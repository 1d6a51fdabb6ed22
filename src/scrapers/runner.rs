//! Turn collected cards into finished, persisted records.
//!
//! Per-card failure policy:
//! - stale card: re-resolve it by position in the live result list and
//!   retry extraction once; if that fails too, skip it
//! - any other per-card failure: skip it and keep going
//! - thumbnail download failure: keep the record without a picture
//!
//! Each record is appended to the sink as soon as it is built, so rows
//! written before a later crash remain valid output.

use crate::analysis::{contains_money, count_phrase};
use crate::config::SiteConfig;
use crate::driver::{By, PageDriver};
use crate::error::{Result, ScrapeError};
use crate::models::{ArticleRecord, RawArticle};
use crate::outputs::RecordSink;
use crate::outputs::images::ImageFetcher;
use crate::scrapers::collector::CollectedCard;
use crate::scrapers::extractor::ArticleExtractor;
use crate::utils::resolve_url;
use tracing::{debug, info, instrument, warn};

pub struct ScrapeRunner<'a, D, S, I> {
    driver: &'a D,
    config: &'a SiteConfig,
    sink: &'a mut S,
    images: &'a I,
    search_phrase: &'a str,
    extractor: ArticleExtractor<'a>,
}

impl<'a, D, S, I> ScrapeRunner<'a, D, S, I>
where
    D: PageDriver,
    S: RecordSink,
    I: ImageFetcher,
{
    pub fn new(
        driver: &'a D,
        config: &'a SiteConfig,
        sink: &'a mut S,
        images: &'a I,
        search_phrase: &'a str,
    ) -> Self {
        Self {
            driver,
            config,
            sink,
            images,
            search_phrase,
            extractor: ArticleExtractor::new(&config.selectors),
        }
    }

    /// Extract, analyse and persist every card, in order.
    ///
    /// Records are pushed onto `records` as they are persisted. Returns the
    /// number of skipped cards. Only sink failures abort the batch.
    #[instrument(level = "info", skip_all, fields(cards = cards.len()))]
    pub async fn process(
        &mut self,
        cards: Vec<CollectedCard<D::Handle>>,
        records: &mut Vec<ArticleRecord>,
    ) -> Result<usize> {
        let mut skipped = 0usize;
        for card in cards {
            let raw = match self.extract_with_reresolve(&card).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(position = card.position, error = %e, "Skipping article");
                    skipped += 1;
                    continue;
                }
            };

            let record = self.build_record(raw).await;
            self.sink.append(&record)?;
            debug!(position = card.position, title = %record.title, "Persisted record");
            records.push(record);
        }
        info!(produced = records.len(), skipped, "Processed collected articles");
        Ok(skipped)
    }

    async fn extract_with_reresolve(&self, card: &CollectedCard<D::Handle>) -> Result<RawArticle> {
        match self.extractor.extract(self.driver, &card.handle).await {
            Err(ScrapeError::StaleHandle) => {
                debug!(position = card.position, "Stale card; re-resolving by position");
                let (by, results) = By::parse(&self.config.selectors.results);
                let fresh = self
                    .driver
                    .find_all(by, results)
                    .await
                    .map_err(|e| ScrapeError::ExtractionFailed(format!("re-resolve failed: {e}")))?
                    .into_iter()
                    .nth(card.position)
                    .ok_or_else(|| {
                        ScrapeError::NotFound(format!("result card at position {}", card.position))
                    })?;
                self.extractor.extract(self.driver, &fresh).await
            }
            other => other,
        }
    }

    async fn build_record(&self, raw: RawArticle) -> ArticleRecord {
        let image_url = raw
            .image_url
            .as_deref()
            .and_then(|src| resolve_url(&self.config.entry_url, src));
        let image_filename = match image_url {
            Some(url) => match self.images.fetch(&url).await {
                Ok(filename) => Some(filename),
                Err(e) => {
                    warn!(%url, error = %e, "Image download failed; keeping record without picture");
                    None
                }
            },
            None => None,
        };

        let search_phrase_count =
            count_phrase([raw.title.as_str(), raw.description.as_str()], self.search_phrase);
        let contains_money = contains_money(&format!("{} {}", raw.title, raw.description));

        ArticleRecord {
            title: raw.title,
            date_text: raw.date_text,
            description: raw.description,
            image_filename,
            search_phrase_count,
            contains_money,
        }
    }
}
