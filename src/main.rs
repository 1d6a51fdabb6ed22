//! # News Window Scraper
//!
//! Searches a news site for a phrase, keeps the results published within a
//! trailing window of months, and writes one spreadsheet row per article
//! plus its downloaded thumbnail.
//!
//! ## Usage
//!
//! ```sh
//! news_window_scraper --search-phrase climate --num-months 2 -o ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Validate**: build the date window from `num_months` before touching the browser
//! 2. **Search**: open the site in Chromium, search and sort newest first
//! 3. **Collect**: reveal results page by page until one falls outside the window
//! 4. **Extract & persist**: read each article, analyse it, append it to the
//!    CSV and download its image, one record at a time

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod cli;
mod config;
mod context;
mod dates;
mod driver;
mod error;
mod models;
mod outputs;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::SiteConfig;
use context::{RunContext, SearchRequest, run};
use driver::chrome::ChromeDriver;
use outputs::images::{FsImageStore, HttpImageFetcher};
use outputs::report::write_report;
use outputs::spreadsheet::CsvSink;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("news_window_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Invalid input fails here, before any browser or file work.
    let params = args.run_params().await?;
    let request = SearchRequest::new(
        &params.search_phrase,
        &params.sort_category,
        params.num_months,
        Local::now(),
    )?;
    info!(
        phrase = %request.search_phrase,
        sort = %request.sort_category,
        start = %request.window.start(),
        end = %request.window.end(),
        "Run parameters"
    );

    let site = SiteConfig::load(args.config.as_deref()).await?;

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let sink = CsvSink::open(&args.output_dir.join(&args.output_file))?;
    let images = HttpImageFetcher::new(
        FsImageStore::new(args.output_dir.join("images")),
        site.timeouts.download(),
    )?;
    let driver = ChromeDriver::launch(!args.headed).await?;

    let ctx = RunContext::new(driver, sink, images, site);
    let report = run(ctx, &request).await;

    if let Some(reason) = &report.failure {
        error!(
            reason = %truncate_for_log(reason, 300),
            persisted = report.records.len(),
            "Run ended early; partial results kept"
        );
    }
    if let Err(e) = write_report(&report, &args.output_dir).await {
        error!(error = %e, "Failed to write run report");
    }
    info!(
        records = report.records.len(),
        output = %args.output_dir.join(&args.output_file).display(),
        "Execution complete"
    );

    Ok(())
}
