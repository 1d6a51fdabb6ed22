//! In-memory doubles for the page, the record sink and image retrieval.
//!
//! [`FakePage`] models the search results page as a list of article cards,
//! of which a prefix is "revealed". Clicking the show-more button reveals the
//! next batch. Selectors are matched against [`Selectors::default`], so the
//! production flow code runs against it unchanged.
//!
//! Choosing a sort option re-renders the list: cards listed before the sort
//! report detached afterwards. With [`FakePage::unsorted_until_sort`] the
//! page first shows a different ordering and swaps in the sorted list only
//! after a few attachment checks, like a site that refetches asynchronously.

use crate::config::Selectors;
use crate::driver::{By, Lookup, PageDriver};
use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use crate::outputs::RecordSink;
use crate::outputs::images::ImageFetcher;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeArticle {
    pub title: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl FakeArticle {
    pub fn dated(title: &str, date: &str) -> Self {
        Self {
            title: title.to_string(),
            date: Some(date.to_string()),
            description: Some(format!("About {title}")),
            image: Some(format!("https://cdn.example.com/img/{}.jpg", title.replace(' ', "-"))),
        }
    }

    pub fn without_date(mut self) -> Self {
        self.date = None;
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Date,
    Description,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeHandle {
    Card(usize),
    Field(usize, Field),
    ShowMore,
    CookieAccept,
    SearchTrigger,
    SearchInput,
    SearchSubmit,
    SortSelect,
}

#[derive(Debug, Default)]
struct FakeState {
    revealed: usize,
    reveal_clicks: usize,
    date_reads: Vec<usize>,
    stale_title_lookups: HashMap<usize, usize>,
    stale_date_lookups: HashMap<usize, usize>,
    broken_titles: HashSet<usize>,
    broken_dates: HashSet<usize>,
    stale_show_more: usize,
    sorted: bool,
    sort_pending: Option<usize>,
    list_replaced: bool,
    opened: Vec<String>,
    typed: Vec<String>,
    selected_sort: Option<String>,
}

pub struct FakePage {
    selectors: Selectors,
    articles: Vec<FakeArticle>,
    unsorted: Option<Vec<FakeArticle>>,
    sort_lag: usize,
    batch: usize,
    stalled: bool,
    has_search: bool,
    has_sort: bool,
    sort_labels: Vec<String>,
    closed: Arc<AtomicBool>,
    state: Mutex<FakeState>,
}

impl FakePage {
    /// `batch` cards are visible initially and each show-more click adds `batch` more.
    pub fn new(articles: Vec<FakeArticle>, batch: usize) -> Self {
        let revealed = batch.min(articles.len());
        Self {
            selectors: Selectors::default(),
            articles,
            unsorted: None,
            sort_lag: 0,
            batch,
            stalled: false,
            has_search: true,
            has_sort: true,
            sort_labels: vec!["Date".to_string(), "Relevance".to_string()],
            closed: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(FakeState {
                revealed,
                ..FakeState::default()
            }),
        }
    }

    /// Show-more stays clickable but never reveals anything.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub fn without_search_box(mut self) -> Self {
        self.has_search = false;
        self
    }

    pub fn without_sort(mut self) -> Self {
        self.has_sort = false;
        self
    }

    /// The next `times` title lookups on card `index` report a stale parent.
    pub fn stale_title(self, index: usize, times: usize) -> Self {
        self.state().stale_title_lookups.insert(index, times);
        self
    }

    /// The next `times` date lookups on card `index` report a stale parent.
    pub fn stale_date(self, index: usize, times: usize) -> Self {
        self.state().stale_date_lookups.insert(index, times);
        self
    }

    /// Reading the title of card `index` fails with a non-stale driver error.
    pub fn broken_title(self, index: usize) -> Self {
        self.state().broken_titles.insert(index);
        self
    }

    /// Reading the date of card `index` fails with a non-stale driver error.
    pub fn broken_date(self, index: usize) -> Self {
        self.state().broken_dates.insert(index);
        self
    }

    /// The next `times` clicks on the show-more button hit a detached node.
    pub fn stale_show_more(self, times: usize) -> Self {
        self.state().stale_show_more = times;
        self
    }

    /// List `unsorted` until a sort option is chosen, then keep listing it
    /// for `lag` more attachment checks before the sorted articles replace it.
    pub fn unsorted_until_sort(mut self, unsorted: Vec<FakeArticle>, lag: usize) -> Self {
        self.state().revealed = self.batch.min(unsorted.len());
        self.unsorted = Some(unsorted);
        self.sort_lag = lag;
        self
    }

    /// Titles of the cards currently listed, in page order.
    pub fn listed_titles(&self) -> Vec<String> {
        let revealed = self.state().revealed;
        self.listed()
            .iter()
            .take(revealed)
            .map(|a| a.title.clone())
            .collect()
    }

    pub fn date_reads(&self) -> Vec<usize> {
        self.state().date_reads.clone()
    }

    pub fn reveal_clicks(&self) -> usize {
        self.state().reveal_clicks
    }

    pub fn selected_sort(&self) -> Option<String> {
        self.state().selected_sort.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state().typed.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state().opened.clone()
    }

    /// Observe `close` after the page has been moved into a run.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Articles in the order the page currently lists them.
    fn listed(&self) -> &[FakeArticle] {
        let sorted = self.state().sorted;
        match &self.unsorted {
            Some(unsorted) if !sorted => unsorted,
            _ => &self.articles,
        }
    }

    fn has_more(&self) -> bool {
        let total = self.listed().len();
        self.state().revealed < total
    }

    fn apply_sort(&self, state: &mut FakeState) {
        state.sorted = true;
        state.list_replaced = true;
        state.revealed = self.batch.min(self.articles.len());
    }

    fn page_element(&self, selector: &str) -> Option<FakeHandle> {
        let s = &self.selectors;
        if selector == s.show_more {
            self.has_more().then_some(FakeHandle::ShowMore)
        } else if selector == s.search_trigger {
            self.has_search.then_some(FakeHandle::SearchTrigger)
        } else if selector == s.search_input {
            self.has_search.then_some(FakeHandle::SearchInput)
        } else if selector == s.search_submit {
            self.has_search.then_some(FakeHandle::SearchSubmit)
        } else if selector == s.sort_select {
            self.has_sort.then_some(FakeHandle::SortSelect)
        } else if selector == s.results {
            (self.state().revealed > 0).then_some(FakeHandle::Card(0))
        } else if selector == s.cookie_accept {
            Some(FakeHandle::CookieAccept)
        } else {
            None
        }
    }

    fn article(&self, index: usize) -> Result<&FakeArticle> {
        self.listed()
            .get(index)
            .ok_or_else(|| ScrapeError::Driver(format!("no card {index}")))
    }

    fn take_stale(counter: &mut HashMap<usize, usize>, index: usize) -> bool {
        match counter.get_mut(&index) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

impl PageDriver for FakePage {
    type Handle = FakeHandle;

    async fn open(&self, url: &str) -> Result<()> {
        self.state().opened.push(url.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn find(&self, _by: By, selector: &str, _timeout: Duration) -> Result<Lookup<FakeHandle>> {
        Ok(match self.page_element(selector) {
            Some(h) => Lookup::Found(h),
            None => Lookup::NotFound,
        })
    }

    async fn find_all(&self, _by: By, selector: &str) -> Result<Vec<FakeHandle>> {
        if selector == self.selectors.results {
            Ok((0..self.state().revealed).map(FakeHandle::Card).collect())
        } else {
            Ok(self.page_element(selector).into_iter().collect())
        }
    }

    async fn find_within(&self, parent: &FakeHandle, selector: &str) -> Result<Lookup<FakeHandle>> {
        let FakeHandle::Card(index) = *parent else {
            return Ok(Lookup::NotFound);
        };
        let article = self.article(index)?;
        let s = &self.selectors;
        let mut state = self.state();
        let found = if selector == s.article_title {
            if Self::take_stale(&mut state.stale_title_lookups, index) {
                return Ok(Lookup::Stale);
            }
            Some(Field::Title)
        } else if selector == s.article_date {
            if Self::take_stale(&mut state.stale_date_lookups, index) {
                return Ok(Lookup::Stale);
            }
            state.date_reads.push(index);
            article.date.as_ref().map(|_| Field::Date)
        } else if selector == s.article_description {
            article.description.as_ref().map(|_| Field::Description)
        } else if selector == s.article_image {
            article.image.as_ref().map(|_| Field::Image)
        } else {
            None
        };
        Ok(match found {
            Some(field) => Lookup::Found(FakeHandle::Field(index, field)),
            None => Lookup::NotFound,
        })
    }

    async fn wait_until_present(&self, by: By, selector: &str, timeout: Duration) -> Result<bool> {
        Ok(self.find(by, selector, timeout).await?.found().is_some())
    }

    async fn click(&self, element: &FakeHandle) -> Result<()> {
        if *element == FakeHandle::ShowMore {
            let total = self.listed().len();
            let mut state = self.state();
            if state.stale_show_more > 0 {
                state.stale_show_more -= 1;
                return Err(ScrapeError::StaleHandle);
            }
            state.reveal_clicks += 1;
            if !self.stalled {
                state.revealed = (state.revealed + self.batch).min(total);
            }
        }
        Ok(())
    }

    async fn type_text(&self, element: &FakeHandle, text: &str) -> Result<()> {
        if *element != FakeHandle::SearchInput {
            return Err(ScrapeError::Driver("not an input".to_string()));
        }
        self.state().typed.push(text.to_string());
        Ok(())
    }

    async fn submit(&self, _element: &FakeHandle) -> Result<()> {
        Ok(())
    }

    async fn get_attribute(&self, element: &FakeHandle, name: &str) -> Result<Option<String>> {
        match *element {
            FakeHandle::Field(index, Field::Image) if name == "src" => {
                Ok(self.article(index)?.image.clone())
            }
            _ => Ok(None),
        }
    }

    async fn read_text(&self, element: &FakeHandle) -> Result<String> {
        let FakeHandle::Field(index, field) = *element else {
            return Ok(String::new());
        };
        let article = self.article(index)?;
        match field {
            Field::Title if self.state().broken_titles.contains(&index) => {
                Err(ScrapeError::Driver("renderer crashed".to_string()))
            }
            Field::Title => Ok(article.title.clone()),
            Field::Date if self.state().broken_dates.contains(&index) => {
                Err(ScrapeError::Driver("renderer crashed".to_string()))
            }
            Field::Date => Ok(article.date.clone().unwrap_or_default()),
            Field::Description => Ok(article.description.clone().unwrap_or_default()),
            Field::Image => Ok(String::new()),
        }
    }

    async fn scroll_into_view(&self, _element: &FakeHandle) -> Result<()> {
        Ok(())
    }

    async fn is_attached(&self, element: &FakeHandle) -> Result<bool> {
        if !matches!(element, FakeHandle::Card(_)) {
            return Ok(true);
        }
        let mut state = self.state();
        match state.sort_pending {
            Some(left) if left <= 1 => {
                state.sort_pending = None;
                self.apply_sort(&mut state);
                Ok(false)
            }
            Some(left) => {
                state.sort_pending = Some(left - 1);
                Ok(true)
            }
            None => Ok(!state.list_replaced),
        }
    }

    async fn select_by_label(&self, select: &FakeHandle, label: &str) -> Result<bool> {
        if *select != FakeHandle::SortSelect {
            return Ok(false);
        }
        let matched = self
            .sort_labels
            .iter()
            .find(|l| l.eq_ignore_ascii_case(label.trim()))
            .cloned();
        let ok = matched.is_some();
        let mut state = self.state();
        state.selected_sort = matched;
        if ok {
            if self.unsorted.is_some() && self.sort_lag > 0 {
                state.sort_pending = Some(self.sort_lag);
            } else {
                self.apply_sort(&mut state);
            }
        }
        Ok(ok)
    }
}

/// Records rows in memory; can be told to fail on a given row.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<ArticleRecord>,
    pub fail_on_row: Option<usize>,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &ArticleRecord) -> Result<()> {
        if self.fail_on_row == Some(self.rows.len()) {
            return Err(ScrapeError::Io(std::io::Error::other("disk full")));
        }
        self.rows.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Image retrieval that succeeds unless the URL is listed as failing.
#[derive(Debug, Default)]
pub struct FakeImages {
    pub failing: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl ImageFetcher for FakeImages {
    async fn fetch(&self, url: &str) -> Result<String> {
        if self.failing.contains(url) {
            return Err(ScrapeError::ExtractionFailed(format!("404 for {url}")));
        }
        self.fetched.lock().unwrap().push(url.to_string());
        Ok(crate::utils::sanitize_filename(url))
    }
}
