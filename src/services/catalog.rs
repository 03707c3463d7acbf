use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogFilters, CatalogPage, CatalogQuery, DiscoverParams, Genre, Movie},
    services::{
        pagination::fetch_logical_page,
        providers::CatalogProvider,
        request::{RequestToken, RequestTracker},
    },
};

/// Number of slides in the home carousel
pub const HERO_SLIDE_COUNT: usize = 8;
const HERO_MIN_VOTES: u32 = 30;
/// Quiet period after the last keystroke before a search runs
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Fetches one logical page for either query family
///
/// Discovery and search share the same re-bucketing; only the upstream call
/// differs.
pub async fn fetch_catalog_page(
    provider: &dyn CatalogProvider,
    query: &CatalogQuery,
    page: u32,
) -> AppResult<CatalogPage<Movie>> {
    let result = match query {
        CatalogQuery::Discover(params) => {
            fetch_logical_page(page, move |p| provider.discover(params, p)).await
        }
        CatalogQuery::Search(text) => {
            fetch_logical_page(page, move |p| provider.search(text, p)).await
        }
    }?;

    tracing::info!(
        page = page,
        items = result.items.len(),
        total_pages = result.total_pages,
        provider = provider.name(),
        search = matches!(query, CatalogQuery::Search(_)),
        "Catalog page loaded"
    );

    Ok(result)
}

/// Discovery parameters for the home carousel: recent releases with some votes.
pub fn hero_params(today: NaiveDate) -> DiscoverParams {
    DiscoverParams::new()
        .with("primary_release_date.lte", today.format("%Y-%m-%d"))
        .with("sort_by", "primary_release_date.desc")
        .with("include_adult", false)
        .with("vote_count.gte", HERO_MIN_VOTES)
}

/// Loads the carousel slides: the first page of recent releases that have artwork.
pub async fn load_hero(
    provider: &dyn CatalogProvider,
    today: NaiveDate,
) -> AppResult<Vec<Movie>> {
    let page = provider.discover(&hero_params(today), 1).await?;
    let slides: Vec<Movie> = page
        .results
        .into_iter()
        .filter(Movie::has_artwork)
        .take(HERO_SLIDE_COUNT)
        .collect();

    tracing::info!(slides = slides.len(), "Hero slides loaded");
    Ok(slides)
}

/// Carousel slides for startup; a failed fetch leaves the carousel empty.
pub async fn load_hero_or_empty(provider: &dyn CatalogProvider, today: NaiveDate) -> Vec<Movie> {
    match load_hero(provider, today).await {
        Ok(slides) => slides,
        Err(e) => {
            tracing::warn!(error = %e, "Hero slides unavailable, starting with an empty carousel");
            Vec::new()
        }
    }
}

/// Loads the genre vocabulary; failures leave the filter list empty.
pub async fn load_genres(provider: &dyn CatalogProvider) -> Vec<Genre> {
    match provider.genres().await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::debug!(error = %e, "Genre list unavailable");
            Vec::new()
        }
    }
}

/// What the catalog grid currently displays
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogView {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Movie>),
    Failed(String),
}

/// Snapshot of the browser state for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserState {
    pub query: Option<CatalogQuery>,
    pub page: u32,
    pub total_pages: u32,
    pub view: CatalogView,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            query: None,
            page: 1,
            total_pages: 1,
            view: CatalogView::Idle,
        }
    }
}

/// Paged catalog grid driver
///
/// Holds the active query and page. A load that finishes after a newer one
/// has started is dropped, so responses can never be applied out of order.
#[derive(Clone)]
pub struct CatalogBrowser {
    provider: Arc<dyn CatalogProvider>,
    tracker: Arc<RequestTracker>,
    input: Arc<RequestTracker>,
    state: Arc<RwLock<BrowserState>>,
}

impl CatalogBrowser {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            tracker: Arc::new(RequestTracker::new()),
            input: Arc::new(RequestTracker::new()),
            state: Arc::new(RwLock::new(BrowserState::default())),
        }
    }

    pub async fn state(&self) -> BrowserState {
        self.state.read().await.clone()
    }

    /// Switches to a new query and shows its first page.
    ///
    /// Any search text still waiting out its debounce is dropped.
    pub async fn set_query(&self, query: CatalogQuery) -> AppResult<()> {
        self.input.cancel();
        self.load(query, 1).await
    }

    /// Feeds the search box.
    ///
    /// The query runs from page 1 once the text has been left alone for
    /// `SEARCH_DEBOUNCE`; each new call restarts the wait. Blank text browses
    /// with `filters` instead.
    pub fn input(
        &self,
        text: &str,
        filters: &CatalogFilters,
        today: NaiveDate,
    ) -> JoinHandle<()> {
        let query = CatalogQuery::from_input(text, filters, today);
        let token = self.input.begin();
        let browser = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            if !browser.input.is_current(token) {
                return;
            }
            if let Err(e) = browser.load(query, 1).await {
                tracing::warn!(error = %e, "Search input could not be applied");
            }
        })
    }

    /// Moves to a page of the current query, clamped to the known range.
    pub async fn go_to_page(&self, page: u32) -> AppResult<()> {
        let (query, page) = {
            let state = self.state.read().await;
            let query = state.query.clone().ok_or_else(|| {
                AppError::InvalidInput("No catalog query has been set".to_string())
            })?;
            (query, page.clamp(1, state.total_pages.max(1)))
        };
        self.load(query, page).await
    }

    pub async fn next_page(&self) -> AppResult<()> {
        let page = self.state.read().await.page;
        self.go_to_page(page.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> AppResult<()> {
        let page = self.state.read().await.page;
        self.go_to_page(page.saturating_sub(1)).await
    }

    /// Loads `page` of `query`; the result is applied only if no newer load began.
    ///
    /// Fetch failures land in `CatalogView::Failed` rather than the return
    /// value, which only reports caller errors.
    pub async fn load(&self, query: CatalogQuery, page: u32) -> AppResult<()> {
        if page == 0 {
            return Err(AppError::InvalidInput(
                "Logical page numbers start at 1".to_string(),
            ));
        }

        // tokens are handed out under the lock so they order like the writes
        let token = {
            let mut state = self.state.write().await;
            let token = self.tracker.begin();
            if state.query.as_ref() != Some(&query) {
                state.total_pages = 1;
            }
            state.query = Some(query.clone());
            state.page = page;
            state.view = CatalogView::Loading;
            token
        };

        let result = fetch_catalog_page(self.provider.as_ref(), &query, page).await;
        self.apply(token, page, result).await;
        Ok(())
    }

    /// Applies a finished load unless a newer one has begun.
    ///
    /// The token is checked while holding the write lock.
    async fn apply(
        &self,
        token: RequestToken,
        page: u32,
        result: AppResult<CatalogPage<Movie>>,
    ) -> bool {
        let mut state = self.state.write().await;
        if !self.tracker.is_current(token) {
            tracing::debug!(page = page, "Discarding stale catalog response");
            return false;
        }

        match result {
            Ok(catalog_page) => {
                state.total_pages = catalog_page.total_pages;
                state.view = CatalogView::Loaded(catalog_page.items);
            }
            Err(e) => {
                tracing::warn!(error = %e, page = page, "Catalog page failed to load");
                state.view = CatalogView::Failed(e.to_string());
            }
        }
        true
    }
}
