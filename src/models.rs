//! Data models for extracted articles and run input.
//!
//! - [`RawArticle`]: fields read off one result card, before analysis
//! - [`ArticleRecord`]: finished row written to the spreadsheet
//! - [`WorkItem`]: run parameters as delivered by a work-item payload
//! - [`RunReport`]: what a run produced and why it stopped

use serde::{Deserialize, Serialize};

/// Sentinel stored in `date_text` when a card has no date element.
pub const DATE_NOT_FOUND: &str = "Date not found";

/// Spreadsheet columns, in output order.
pub const RECORD_HEADERS: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Picture Filename",
    "Search Phrase Count",
    "Contains Money",
];

/// Fields read from one search result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    /// Date text as printed, or [`DATE_NOT_FOUND`].
    pub date_text: String,
    pub description: String,
    /// `src` of the thumbnail, if the card has one.
    pub image_url: Option<String>,
}

/// A finished article row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub date_text: String,
    pub description: String,
    pub image_filename: Option<String>,
    pub search_phrase_count: usize,
    pub contains_money: bool,
}

impl ArticleRecord {
    /// Render as a row matching [`RECORD_HEADERS`].
    pub fn to_row(&self) -> [String; 6] {
        [
            self.title.clone(),
            self.date_text.clone(),
            self.description.clone(),
            self.image_filename.clone().unwrap_or_default(),
            self.search_phrase_count.to_string(),
            if self.contains_money { "True" } else { "False" }.to_string(),
        ]
    }
}

/// Run parameters from a JSON work-item payload.
///
/// ```json
/// {"search_phrase": "climate", "news_category": "Date", "num_months": 2}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkItem {
    pub search_phrase: String,
    #[serde(default = "default_category")]
    pub news_category: String,
    #[serde(default)]
    pub num_months: i64,
}

fn default_category() -> String {
    "Date".to_string()
}

/// How the collector stopped revealing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// An in-order article fell outside the window.
    Boundary,
    /// No more results could be revealed.
    Exhausted,
}

/// Outcome of a run, including partial runs cut short by a session failure.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: Vec<ArticleRecord>,
    pub collected: usize,
    pub skipped: usize,
    pub termination: Option<Termination>,
    /// Set when the run ended on a run-level failure.
    pub failure: Option<String>,
}
