//! Run-scoped resources and the top-level run.
//!
//! [`RunContext`] owns everything a run touches: the browser session, the
//! record sink and the image fetcher. [`run`] consumes it and releases it on
//! every exit path, including the failure path, so a crashed run still
//! leaves a closed browser and a flushed spreadsheet behind.

use crate::config::SiteConfig;
use crate::dates::DateWindow;
use crate::driver::PageDriver;
use crate::error::{Result, ScrapeError};
use crate::models::RunReport;
use crate::outputs::RecordSink;
use crate::outputs::images::ImageFetcher;
use crate::scrapers::collector::IncrementalCollector;
use crate::scrapers::runner::ScrapeRunner;
use crate::scrapers::search::SearchFlow;
use chrono::{DateTime, Local};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Validated run parameters.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub search_phrase: String,
    pub sort_category: String,
    pub window: DateWindow,
}

impl SearchRequest {
    /// Validate inputs and fix the date window relative to `now`.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidArgument`] for an empty phrase or negative
    /// `num_months`.
    pub fn new(
        search_phrase: &str,
        sort_category: &str,
        num_months: i64,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let search_phrase = search_phrase.trim();
        if search_phrase.is_empty() {
            return Err(ScrapeError::InvalidArgument(
                "search phrase must not be empty".to_string(),
            ));
        }
        Ok(Self {
            search_phrase: search_phrase.to_string(),
            sort_category: sort_category.trim().to_string(),
            window: DateWindow::build(now, num_months)?,
        })
    }
}

pub struct RunContext<D, S, I> {
    pub driver: D,
    pub sink: S,
    pub images: I,
    pub config: SiteConfig,
}

impl<D, S, I> RunContext<D, S, I>
where
    D: PageDriver,
    S: RecordSink,
{
    pub fn new(driver: D, sink: S, images: I, config: SiteConfig) -> Self {
        Self {
            driver,
            sink,
            images,
            config,
        }
    }

    /// Flush the sink and close the session. Failures are logged only.
    pub async fn finish(mut self) {
        if let Err(e) = self.sink.flush() {
            error!(error = %e, "Failed to flush output");
        }
        if let Err(e) = self.driver.close().await {
            error!(error = %e, "Failed to close browser session");
        }
    }
}

/// Search, collect, extract and persist.
///
/// A run-level failure is logged and recorded in [`RunReport::failure`];
/// records persisted before it stay in the report and in the sink.
#[instrument(level = "info", skip_all, fields(phrase = %request.search_phrase, sort = %request.sort_category))]
pub async fn run<D, S, I>(mut ctx: RunContext<D, S, I>, request: &SearchRequest) -> RunReport
where
    D: PageDriver,
    S: RecordSink,
    I: ImageFetcher,
{
    let t0 = Instant::now();
    let mut report = RunReport {
        records: Vec::new(),
        collected: 0,
        skipped: 0,
        termination: None,
        failure: None,
    };

    if let Err(e) = scrape(&mut ctx, request, &mut report).await {
        error!(
            error = %e,
            persisted = report.records.len(),
            "Run aborted; keeping records written so far"
        );
        report.failure = Some(e.to_string());
    }
    ctx.finish().await;

    let elapsed = t0.elapsed();
    info!(
        collected = report.collected,
        produced = report.records.len(),
        skipped = report.skipped,
        termination = ?report.termination,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Run complete"
    );
    report
}

async fn scrape<D, S, I>(
    ctx: &mut RunContext<D, S, I>,
    request: &SearchRequest,
    report: &mut RunReport,
) -> Result<()>
where
    D: PageDriver,
    S: RecordSink,
    I: ImageFetcher,
{
    SearchFlow::new(&ctx.driver, &ctx.config)
        .run(&request.search_phrase, &request.sort_category)
        .await?;

    let collection = IncrementalCollector::new(&ctx.driver, &ctx.config)
        .collect(&request.window)
        .await?;
    debug!(inspected = collection.inspected, "Dates inspected");
    report.collected = collection.cards.len();
    report.termination = Some(collection.termination);

    let mut runner = ScrapeRunner::new(
        &ctx.driver,
        &ctx.config,
        &mut ctx.sink,
        &ctx.images,
        &request.search_phrase,
    );
    report.skipped = runner.process(collection.cards, &mut report.records).await?;
    Ok(())
}
