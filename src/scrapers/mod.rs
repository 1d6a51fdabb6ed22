//! Search-result scraping for the news site.
//!
//! A run moves through these stages, each in its own submodule:
//!
//! 1. **Search** ([`search`]): open the site, search, pick the sort order
//! 2. **Collect** ([`collector`]): walk result cards newest first, clicking
//!    "show more" ([`pagination`]) until a card falls outside the date window
//! 3. **Extract** ([`extractor`]): read title, date, description and image
//!    from each collected card
//! 4. **Persist** ([`runner`]): analyse each article and append it to the
//!    output sinks one record at a time
//!
//! # Failure Handling
//!
//! | Failure | Scope | Handling |
//! |---------|-------|----------|
//! | Stale card | one article | re-resolve by position, retry once, then skip |
//! | Missing title / lookup error | one article | skip |
//! | Missing date | one article | collector skips it; extractor records `Date not found` |
//! | Image download | one field | record kept without a picture |
//! | Session loss, sink write | run | stop, clean up, keep rows already written |

pub mod collector;
pub mod extractor;
pub mod pagination;
pub mod runner;
pub mod search;
