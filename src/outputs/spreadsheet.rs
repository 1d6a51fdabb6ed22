//! CSV spreadsheet sink.
//!
//! The header row is written once, when the file is new or empty. Each
//! record is flushed as soon as it is appended.

use super::RecordSink;
use crate::error::Result;
use crate::models::{ArticleRecord, RECORD_HEADERS};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    /// Open `path` for appending, writing the header row if the file is empty.
    #[instrument(level = "info", fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if size == 0 {
            writer.write_record(RECORD_HEADERS)?;
            writer.flush()?;
            debug!("Wrote header row");
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, record: &ArticleRecord) -> Result<()> {
        self.writer.write_record(record.to_row())?;
        self.writer.flush()?;
        self.rows += 1;
        debug!(row = self.rows, title = %record.title, "Appended record");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        info!(path = %self.path.display(), rows = self.rows, "Flushed spreadsheet");
        Ok(())
    }
}
