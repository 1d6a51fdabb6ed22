//! Date parsing and the trailing month window used to scope a run.
//!
//! The search results page prints dates in a handful of layouts. They are
//! tried in a fixed order and the first one that parses wins:
//!
//! | Layout | Example |
//! |--------|---------|
//! | `<Month name> <day>, <year>` | `March 4, 2024` |
//! | `<day> <Month abbrev> <year>` | `4 Mar 2024` |
//! | `Last update <day> <Month abbrev> <year>` | `Last update 4 Mar 2024` |
//!
//! Anything else is reported as unknown (`None`) and never raises.

use crate::error::{Result, ScrapeError};
use chrono::{DateTime, Datelike, Local, Months, NaiveDate, TimeZone};
use tracing::{debug, instrument};

const MONTH_DAY_YEAR: &str = "%B %d, %Y";
const DAY_MONTH_YEAR: &str = "%d %b %Y";
const LAST_UPDATE_PREFIX: &str = "Last update ";

/// Layout used when writing a parsed date back out as text.
pub const CANONICAL_LAYOUT: &str = "%B %-d, %Y";

/// Parse a result-page date string into a local instant (midnight of that day).
///
/// Returns `None` for text outside the accepted layouts.
pub fn parse_date(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    let date = NaiveDate::parse_from_str(text, MONTH_DAY_YEAR)
        .or_else(|_| NaiveDate::parse_from_str(text, DAY_MONTH_YEAR))
        .ok()
        .or_else(|| {
            text.strip_prefix(LAST_UPDATE_PREFIX)
                .and_then(|rest| NaiveDate::parse_from_str(rest.trim(), DAY_MONTH_YEAR).ok())
        })?;
    local_midnight(date)
}

/// Format an instant with the canonical `March 4, 2024` layout.
pub fn format_canonical(instant: &DateTime<Local>) -> String {
    instant.format(CANONICAL_LAYOUT).to_string()
}

fn local_midnight(date: NaiveDate) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    // A DST gap at midnight has no local representation; take the first valid one.
    Local.from_local_datetime(&naive).earliest()
}

/// Inclusive `[start, end]` range of instants an article must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Local>,
    end: DateTime<Local>,
}

impl DateWindow {
    /// Build the window for a run.
    ///
    /// `num_months == 0` and `num_months == 1` both mean "the current calendar
    /// month so far"; `n > 1` extends `start` back to the first day of the
    /// month `n - 1` months before `now`'s month. `end` is always `now`.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::InvalidArgument`] if `num_months` is negative or the
    /// resulting start date is out of range.
    #[instrument(level = "debug")]
    pub fn build(now: DateTime<Local>, num_months: i64) -> Result<Self> {
        if num_months < 0 {
            return Err(ScrapeError::InvalidArgument(format!(
                "num_months must be >= 0, got {num_months}"
            )));
        }
        let back = u32::try_from(num_months.saturating_sub(1).max(0)).map_err(|_| {
            ScrapeError::InvalidArgument(format!("num_months {num_months} is too large"))
        })?;

        let start = now
            .date_naive()
            .with_day(1)
            .and_then(|first| first.checked_sub_months(Months::new(back)))
            .and_then(local_midnight)
            .ok_or_else(|| {
                ScrapeError::InvalidArgument(format!(
                    "num_months {num_months} reaches before the supported calendar range"
                ))
            })?;

        debug!(%start, end = %now, "Built date window");
        Ok(Self { start, end: now })
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn end(&self) -> DateTime<Local> {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: &DateTime<Local>) -> bool {
        self.start <= *instant && *instant <= self.end
    }
}
