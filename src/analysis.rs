//! Text heuristics applied to every extracted article.
//!
//! - [`count_phrase`]: case-insensitive, non-overlapping occurrences of the
//!   search phrase summed across several fields
//! - [`contains_money`]: whether a text mentions a dollar amount

use once_cell::sync::Lazy;
use regex::Regex;

/// `$12`, `$12.50`, `$1,200,000.00`, `11 dollars`, `20 USD`.
static MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?|\d+(?:[.,]\d+)*\s*(?:dollars?|usd)\b")
        .expect("money pattern is valid")
});

/// Count case-insensitive occurrences of `phrase` across `texts`.
///
/// Matches are counted left to right without overlap within each text. An
/// empty phrase counts as zero.
pub fn count_phrase<I, S>(texts: I, phrase: &str) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = phrase.to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    texts
        .into_iter()
        .map(|t| t.as_ref().to_lowercase().matches(needle.as_str()).count())
        .sum()
}

/// Heuristic: does the text mention a dollar amount?
///
/// False negatives on other currency notations are expected.
pub fn contains_money(text: &str) -> bool {
    MONEY_RE.is_match(text)
}
