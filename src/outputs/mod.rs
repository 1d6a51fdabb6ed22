//! Output sinks for finished records and downloaded thumbnails.
//!
//! # Submodules
//!
//! - [`spreadsheet`]: Appends [`ArticleRecord`] rows to a spreadsheet-compatible CSV file
//! - [`images`]: Downloads thumbnails and stores them next to the spreadsheet
//! - [`report`]: Writes the JSON run summary
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_results.csv   # one row per article, flushed after each row
//! ├── run_report.json    # counts, termination reason, persisted records
//! └── images/
//!     ├── photo-1.jpg
//!     └── photo-2.jpg
//! ```

pub mod images;
pub mod report;
pub mod spreadsheet;

use crate::error::Result;
use crate::models::ArticleRecord;

/// Append-only destination for finished records.
///
/// Every successful `append` must be durable on return, so a crash later in
/// the run keeps all rows written so far.
pub trait RecordSink {
    fn append(&mut self, record: &ArticleRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
