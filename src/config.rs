//! Site settings: entry URL, selectors and per-operation timeouts.
//!
//! Selectors are an unstable contract with the target site, so they live
//! here rather than in the flow code. Built-in defaults match the current
//! Al Jazeera search page; a YAML file can override any field.
//!
//! ```yaml
//! entry_url: https://www.aljazeera.com
//! selectors:
//!   show_more: button.show-more-button
//! timeouts:
//!   reveal_secs: 20
//! ```

use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub entry_url: String,
    pub selectors: Selectors,
    pub timeouts: Timeouts,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            entry_url: "https://www.aljazeera.com".to_string(),
            selectors: Selectors::default(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Page selectors. An `xpath:` prefix marks an XPath selector.
///
/// `article_*` selectors are relative to one result card and always CSS.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub cookie_accept: String,
    pub search_trigger: String,
    pub search_input: String,
    pub search_submit: String,
    pub sort_select: String,
    pub results: String,
    pub show_more: String,
    pub article_title: String,
    pub article_date: String,
    pub article_description: String,
    pub article_image: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            cookie_accept: "#onetrust-accept-btn-handler".to_string(),
            search_trigger: ".site-header__search-trigger button".to_string(),
            search_input: "input.search-bar__input".to_string(),
            search_submit: "button.search-bar__button".to_string(),
            sort_select: "select#search-sort-option".to_string(),
            results: ".search-result__list article.gc".to_string(),
            show_more: "button.show-more-button".to_string(),
            article_title: "h3.gc__title span".to_string(),
            article_date: ".gc__date__date span[aria-hidden]".to_string(),
            article_description: ".gc__excerpt p".to_string(),
            article_image: "img.article-card__image".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Optional page furniture (cookie banner, show-more button, sort box).
    pub lookup_secs: u64,
    /// Elements the flow cannot continue without (search box, first results).
    pub element_secs: u64,
    /// New results appearing after a reveal-more click.
    pub reveal_secs: u64,
    /// Thumbnail download.
    pub download_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup_secs: 5,
            element_secs: 10,
            reveal_secs: 15,
            download_secs: 15,
        }
    }
}

impl Timeouts {
    pub fn lookup(&self) -> Duration {
        Duration::from_secs(self.lookup_secs)
    }

    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    pub fn reveal(&self) -> Duration {
        Duration::from_secs(self.reveal_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }
}

impl SiteConfig {
    /// Load from a YAML file, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), entry_url = %config.entry_url, "Loaded site configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ScrapeError::Config(e.to_string()))
    }
}
