//! Incremental collection of in-window result cards.
//!
//! The collector walks the result list in page order, revealing more results
//! only while every card seen so far is inside the [`DateWindow`]:
//!
//! ```text
//!            all revealed cards inspected
//! Collecting ───────────────────────────▶ Revealing
//!     ▲  │                                  │  │
//!     │  │ card dated outside window        │  │ no button / nothing new
//!     │  ▼                                  │  ▼    before the reveal timeout
//!     │ Done(Boundary)                      │ Done(Exhausted)
//!     └─────────────────────────────────────┘
//!                 new cards appeared
//! ```
//!
//! # Precondition
//!
//! Results must be sorted newest first. The first card dated outside the
//! window is taken as proof that every later card is older still, and the
//! collector stops there without backtracking. If the site stops sorting by
//! date, in-window cards that follow an out-of-window one are not collected.
//!
//! Cards with no date, or a date in none of the known layouts, are skipped
//! and do not count as boundary evidence.

use crate::config::SiteConfig;
use crate::dates::{DateWindow, format_canonical, parse_date};
use crate::driver::{By, PageDriver};
use crate::error::{Result, ScrapeError};
use crate::models::Termination;
use crate::scrapers::extractor::ArticleExtractor;
use crate::scrapers::pagination::{LoadMoreButton, RevealOutcome};
use tracing::{debug, info, instrument, warn};

/// An in-window card and its position in the result list.
#[derive(Debug)]
pub struct CollectedCard<H> {
    pub position: usize,
    pub handle: H,
}

#[derive(Debug)]
pub struct Collection<H> {
    pub cards: Vec<CollectedCard<H>>,
    /// Number of cards whose date was inspected.
    pub inspected: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Collecting,
    Revealing,
    Done(Termination),
}

/// What a single card told us.
enum Verdict {
    InWindow,
    Skip,
    Boundary,
}

pub struct IncrementalCollector<'a, D> {
    driver: &'a D,
    config: &'a SiteConfig,
    extractor: ArticleExtractor<'a>,
    pager: LoadMoreButton<'a, D>,
}

impl<'a, D: PageDriver> IncrementalCollector<'a, D> {
    pub fn new(driver: &'a D, config: &'a SiteConfig) -> Self {
        Self {
            driver,
            config,
            extractor: ArticleExtractor::new(&config.selectors),
            pager: LoadMoreButton::new(driver, config),
        }
    }

    /// Collect every card up to the window boundary, in page order.
    #[instrument(level = "info", skip_all, fields(start = %window.start(), end = %window.end()))]
    pub async fn collect(&self, window: &DateWindow) -> Result<Collection<D::Handle>> {
        let mut cards = Vec::new();
        let mut inspected = 0usize;
        // Position whose date read already hit a stale card once.
        let mut stale_retry_at: Option<usize> = None;
        let mut state = State::Collecting;

        loop {
            state = match state {
                State::Collecting => {
                    let (by, results) = By::parse(&self.config.selectors.results);
                    let revealed = self.driver.find_all(by, results).await?;
                    if revealed.is_empty() && inspected == 0 {
                        info!("Search returned no results");
                        State::Done(Termination::Exhausted)
                    } else {
                        let mut next = State::Revealing;
                        for (position, handle) in revealed.into_iter().enumerate().skip(inspected) {
                            match self.judge(&handle, position, window).await {
                                Ok(verdict) => {
                                    inspected = position + 1;
                                    match verdict {
                                        Verdict::InWindow => cards.push(CollectedCard { position, handle }),
                                        Verdict::Skip => {}
                                        Verdict::Boundary => {
                                            next = State::Done(Termination::Boundary);
                                            break;
                                        }
                                    }
                                }
                                Err(ScrapeError::StaleHandle) if stale_retry_at != Some(position) => {
                                    // Page mutated under us: re-list and retry this position once.
                                    debug!(position, "Stale card while reading date; re-resolving");
                                    stale_retry_at = Some(position);
                                    inspected = position;
                                    next = State::Collecting;
                                    break;
                                }
                                Err(e) if e.is_recoverable() => {
                                    warn!(position, error = %e, "Could not read card date; skipping");
                                    inspected = position + 1;
                                }
                                Err(e) => return Err(e),
                            }
                        }
                        next
                    }
                }
                State::Revealing => match self.pager.reveal_more().await? {
                    RevealOutcome::NoMore => State::Done(Termination::Exhausted),
                    RevealOutcome::Clicked => {
                        if self.pager.wait_for_more(inspected).await? {
                            State::Collecting
                        } else {
                            warn!(
                                inspected,
                                timeout_secs = self.config.timeouts.reveal_secs,
                                "No new results after show-more; treating list as exhausted"
                            );
                            State::Done(Termination::Exhausted)
                        }
                    }
                },
                State::Done(termination) => {
                    info!(
                        collected = cards.len(),
                        inspected,
                        ?termination,
                        "Collection finished"
                    );
                    return Ok(Collection {
                        cards,
                        inspected,
                        termination,
                    });
                }
            };
        }
    }

    async fn judge(&self, card: &D::Handle, position: usize, window: &DateWindow) -> Result<Verdict> {
        let Some(text) = self.extractor.read_date(self.driver, card).await? else {
            warn!(position, "Card has no date; skipping");
            return Ok(Verdict::Skip);
        };
        let Some(date) = parse_date(&text) else {
            warn!(position, date_text = %text, "Unrecognized date format; skipping");
            return Ok(Verdict::Skip);
        };
        let date_label = format_canonical(&date);
        if window.contains(&date) {
            debug!(position, date = %date_label, "Card in window");
            Ok(Verdict::InWindow)
        } else {
            info!(position, date = %date_label, "Card outside window; stopping at boundary");
            Ok(Verdict::Boundary)
        }
    }
}
