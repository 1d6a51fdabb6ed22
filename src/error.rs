//! Error taxonomy for a scrape run.
//!
//! Failures split into two tiers:
//! - **Per-article** ([`ScrapeError::StaleHandle`], [`ScrapeError::NotFound`],
//!   [`ScrapeError::Timeout`], [`ScrapeError::ExtractionFailed`]): the article
//!   is skipped and the batch continues.
//! - **Run-level** (everything else): caught once at the top of the run,
//!   logged, and followed by cleanup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Element handle is no longer attached to the page")]
    StaleHandle,

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScrapeError {
    /// True for failures scoped to a single article or sub-element.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScrapeError::StaleHandle
                | ScrapeError::NotFound(_)
                | ScrapeError::Timeout { .. }
                | ScrapeError::ExtractionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
