//! Command-line interface definitions.
//!
//! Every option can also be supplied through an environment variable. Run
//! parameters come either from flags or from a JSON work-item payload
//! (`--work-item`), in which case the payload wins.

use crate::error::{Result, ScrapeError};
use crate::models::WorkItem;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Last three months of results for "climate", newest first
/// news_window_scraper --search-phrase climate --num-months 3
///
/// # Parameters from a work item, custom output location
/// news_window_scraper --work-item ./input.json -o ./output
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Phrase to search for
    #[arg(short, long, env = "SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Sort option to apply to the results, by its visible label
    #[arg(long, env = "SORT_CATEGORY", default_value = "Date")]
    pub sort_category: String,

    /// Months of results to keep; 0 and 1 both mean the current month
    #[arg(short, long, env = "NUM_MONTHS", default_value_t = 0, allow_negative_numbers = true)]
    pub num_months: i64,

    /// JSON work-item payload with search_phrase, news_category and num_months
    #[arg(short, long, env = "WORK_ITEM")]
    pub work_item: Option<PathBuf>,

    /// Directory for the spreadsheet and downloaded images
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Spreadsheet file name inside the output directory
    #[arg(long, env = "OUTPUT_FILE", default_value = "news_results.csv")]
    pub output_file: String,

    /// Optional path to a site config YAML file (selectors, timeouts)
    #[arg(short, long, env = "SITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

/// Run parameters after merging flags and the optional work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub search_phrase: String,
    pub sort_category: String,
    pub num_months: i64,
}

impl Cli {
    /// Resolve run parameters, reading the work item if one was given.
    #[instrument(level = "info", skip(self))]
    pub async fn run_params(&self) -> Result<RunParams> {
        if let Some(path) = &self.work_item {
            let text = tokio::fs::read_to_string(path).await?;
            let item: WorkItem = serde_json::from_str(&text)
                .map_err(|e| ScrapeError::Config(format!("bad work item {}: {e}", path.display())))?;
            info!(path = %path.display(), "Loaded work item");
            return Ok(RunParams {
                search_phrase: item.search_phrase,
                sort_category: item.news_category,
                num_months: item.num_months,
            });
        }

        let search_phrase = self.search_phrase.clone().ok_or_else(|| {
            ScrapeError::InvalidArgument("--search-phrase or --work-item is required".to_string())
        })?;
        Ok(RunParams {
            search_phrase,
            sort_category: self.sort_category.clone(),
            num_months: self.num_months,
        })
    }
}
