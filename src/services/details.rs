use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    error::AppResult,
    models::{CastMember, Keyword, Movie, MovieDetails, MovieId, Video},
    services::{
        autoplay::CarouselSnapshot,
        providers::CatalogProvider,
        request::{RequestToken, RequestTracker},
    },
};

/// Cast members shown under a carousel slide
pub const SLIDE_CAST_LIMIT: usize = 8;

/// Supplementary details for the active carousel slide
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDetails {
    pub id: MovieId,
    pub cast: Vec<CastMember>,
    pub trailer_url: Option<String>,
}

/// Watch URL of the first YouTube trailer, if any.
pub fn trailer_url(videos: &[Video]) -> Option<String> {
    videos
        .iter()
        .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
        .map(|v| format!("https://www.youtube.com/watch?v={}", v.key))
}

/// Fetches credits and videos concurrently; either failure fails the whole.
pub async fn fetch_slide_details(
    provider: &dyn CatalogProvider,
    id: MovieId,
) -> AppResult<SlideDetails> {
    let (credits, videos) = tokio::try_join!(provider.credits(id), provider.videos(id))?;

    let mut cast = credits.cast;
    cast.truncate(SLIDE_CAST_LIMIT);

    Ok(SlideDetails {
        id,
        trailer_url: trailer_url(&videos.results),
        cast,
    })
}

/// Loads slide details for whichever slide is active
///
/// Only the most recent activation may publish. Failures leave the details
/// absent; the slide renders without them.
pub struct SlideDetailLoader {
    provider: Arc<dyn CatalogProvider>,
    tracker: RequestTracker,
    details_tx: watch::Sender<Option<SlideDetails>>,
}

impl SlideDetailLoader {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        let (details_tx, _) = watch::channel(None);
        Self {
            provider,
            tracker: RequestTracker::new(),
            details_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SlideDetails>> {
        self.details_tx.subscribe()
    }

    pub fn current(&self) -> Option<SlideDetails> {
        self.details_tx.borrow().clone()
    }

    /// Starts loading details for `id`, superseding any earlier activation.
    pub async fn activate(&self, id: MovieId) {
        let token = self.tracker.begin();
        self.publish(token, None);

        match fetch_slide_details(self.provider.as_ref(), id).await {
            Ok(details) => {
                if !self.publish(token, Some(details)) {
                    tracing::debug!(movie_id = %id, "Discarding stale slide details");
                }
            }
            Err(e) => {
                tracing::debug!(movie_id = %id, error = %e, "Slide details unavailable");
            }
        }
    }

    /// Replaces the details if `token` is still the latest activation.
    ///
    /// The check runs inside the channel's write lock.
    fn publish(&self, token: RequestToken, details: Option<SlideDetails>) -> bool {
        self.details_tx.send_if_modified(|current| {
            if !self.tracker.is_current(token) {
                return false;
            }
            *current = details;
            true
        })
    }

    /// Follows a carousel, activating on every change of the active movie.
    ///
    /// Each activation runs in its own task so a slow response never delays
    /// the next slide.
    pub fn follow(
        self: Arc<Self>,
        mut snapshots: watch::Receiver<CarouselSnapshot<Movie>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut shown: Option<MovieId> = None;
            loop {
                let active = snapshots
                    .borrow_and_update()
                    .active_item
                    .as_ref()
                    .map(|movie| movie.id);

                if active != shown {
                    shown = active;
                    match active {
                        Some(id) => {
                            let loader = Arc::clone(&self);
                            tokio::spawn(async move { loader.activate(id).await });
                        }
                        None => {
                            self.tracker.cancel();
                            self.details_tx.send_replace(None);
                        }
                    }
                }

                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Everything the movie detail page displays
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePage {
    pub details: MovieDetails,
    pub keywords: Vec<Keyword>,
}

/// Loads a movie page. Keywords are optional; the detail request is not.
pub async fn fetch_movie_page(provider: &dyn CatalogProvider, id: MovieId) -> AppResult<MoviePage> {
    let (details, keywords) = tokio::join!(provider.movie(id), provider.keywords(id));
    let details = details?;

    let keywords = match keywords {
        Ok(list) => list.keywords,
        Err(e) => {
            tracing::debug!(movie_id = %id, error = %e, "Keywords unavailable");
            Vec::new()
        }
    };

    Ok(MoviePage { details, keywords })
}

/// State of the movie detail page
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MoviePageView {
    #[default]
    Empty,
    Loading(MovieId),
    Loaded(Box<MoviePage>),
    Failed { id: MovieId, message: String },
}

/// Movie detail page driver; navigating to another id drops the pending load.
pub struct MoviePageLoader {
    provider: Arc<dyn CatalogProvider>,
    tracker: RequestTracker,
    view_tx: watch::Sender<MoviePageView>,
}

impl MoviePageLoader {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        let (view_tx, _) = watch::channel(MoviePageView::Empty);
        Self {
            provider,
            tracker: RequestTracker::new(),
            view_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MoviePageView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> MoviePageView {
        self.view_tx.borrow().clone()
    }

    pub async fn open(&self, id: MovieId) {
        let token = self.tracker.begin();
        self.publish(token, MoviePageView::Loading(id));

        let view = match fetch_movie_page(self.provider.as_ref(), id).await {
            Ok(page) => {
                tracing::info!(
                    movie_id = %id,
                    keywords = page.keywords.len(),
                    "Movie page loaded"
                );
                MoviePageView::Loaded(Box::new(page))
            }
            Err(e) => {
                tracing::warn!(movie_id = %id, error = %e, "Movie page failed to load");
                MoviePageView::Failed {
                    id,
                    message: e.to_string(),
                }
            }
        };
        if !self.publish(token, view) {
            tracing::debug!(movie_id = %id, "Discarding stale movie page");
        }
    }

    fn publish(&self, token: RequestToken, view: MoviePageView) -> bool {
        self.view_tx.send_if_modified(|current| {
            if !self.tracker.is_current(token) {
                return false;
            }
            *current = view;
            true
        })
    }

    /// Leaves the page; any in-flight load is discarded.
    pub fn close(&self) {
        self.tracker.cancel();
        self.view_tx.send_replace(MoviePageView::Empty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Credits, Keywords, UpstreamPage, Videos};
    use crate::services::providers::MockCatalogProvider;
    use std::time::Duration;

    fn cast(n: u64) -> Credits {
        Credits {
            cast: (1..=n)
                .map(|i| CastMember {
                    id: i,
                    name: format!("Actor {}", i),
                    character: None,
                    profile_path: None,
                    credit_id: None,
                })
                .collect(),
        }
    }

    fn video(key: &str, site: &str, kind: &str) -> Video {
        Video {
            key: key.to_string(),
            site: site.to_string(),
            video_type: kind.to_string(),
            name: None,
        }
    }

    fn details(id: u64) -> MovieDetails {
        serde_json::from_value(serde_json::json!({ "id": id, "title": format!("Movie {}", id) }))
            .unwrap()
    }

    #[test]
    fn test_trailer_selection() {
        let videos = vec![
            video("teaser", "YouTube", "Teaser"),
            video("vimeo", "Vimeo", "Trailer"),
            video("abc123", "YouTube", "Trailer"),
            video("later", "YouTube", "Trailer"),
        ];
        assert_eq!(
            trailer_url(&videos).as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(trailer_url(&videos[..2]), None);
    }

    #[tokio::test]
    async fn test_slide_details_truncate_cast() {
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_credits()
            .times(1)
            .returning(|_| Ok(cast(15)));
        provider.expect_videos().times(1).returning(|_| {
            Ok(Videos {
                results: vec![video("k", "YouTube", "Trailer")],
            })
        });

        let slide = fetch_slide_details(&provider, MovieId(7)).await.unwrap();
        assert_eq!(slide.cast.len(), SLIDE_CAST_LIMIT);
        assert_eq!(slide.cast[0].name, "Actor 1");
        assert!(slide.trailer_url.is_some());
    }

    #[tokio::test]
    async fn test_slide_detail_failure_is_swallowed() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_credits().returning(|_| Ok(cast(2)));
        provider.expect_videos().returning(|_| {
            Err(AppError::Upstream {
                status: 503,
                body: String::new(),
            })
        });

        let loader = SlideDetailLoader::new(Arc::new(provider));
        loader.activate(MovieId(1)).await;
        assert_eq!(loader.current(), None);
    }

    #[test]
    fn test_superseded_activation_cannot_publish() {
        let loader = SlideDetailLoader::new(Arc::new(MockCatalogProvider::new()));
        let stale = loader.tracker.begin();
        let current = loader.tracker.begin();
        let slide = |id| SlideDetails {
            id: MovieId(id),
            cast: vec![],
            trailer_url: None,
        };

        assert!(!loader.publish(stale, Some(slide(1))));
        assert_eq!(loader.current(), None);

        assert!(loader.publish(current, Some(slide(2))));
        assert_eq!(loader.current().map(|s| s.id), Some(MovieId(2)));

        loader.tracker.cancel();
        assert!(!loader.publish(current, None));
        assert_eq!(loader.current().map(|s| s.id), Some(MovieId(2)));
    }

    #[tokio::test]
    async fn test_movie_page_tolerates_missing_keywords() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_movie().returning(|id| Ok(details(id.0)));
        provider.expect_keywords().returning(|_| {
            Err(AppError::Upstream {
                status: 404,
                body: String::new(),
            })
        });

        let page = fetch_movie_page(&provider, MovieId(42)).await.unwrap();
        assert_eq!(page.details.id, MovieId(42));
        assert!(page.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_movie_page_detail_failure_propagates() {
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_movie()
            .returning(|_| Err(AppError::Unauthorized("invalid".to_string())));
        provider
            .expect_keywords()
            .returning(|_| Ok(Keywords { keywords: vec![] }));

        let loader = MoviePageLoader::new(Arc::new(provider));
        loader.open(MovieId(3)).await;
        assert!(matches!(
            loader.view(),
            MoviePageView::Failed { id: MovieId(3), .. }
        ));
    }

    /// Provider whose responses for movie 1 arrive long after those for others
    struct SlowFirstMovie;

    impl SlowFirstMovie {
        async fn delay(id: MovieId) {
            let ms = if id == MovieId(1) { 1_000 } else { 10 };
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    #[async_trait::async_trait]
    impl CatalogProvider for SlowFirstMovie {
        async fn genres(&self) -> AppResult<Vec<crate::models::Genre>> {
            Ok(vec![])
        }

        async fn discover(
            &self,
            _params: &crate::models::DiscoverParams,
            _page: u32,
        ) -> AppResult<UpstreamPage<Movie>> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn search(&self, _query: &str, _page: u32) -> AppResult<UpstreamPage<Movie>> {
            Err(AppError::Internal("unused".to_string()))
        }

        async fn movie(&self, id: MovieId) -> AppResult<MovieDetails> {
            Self::delay(id).await;
            Ok(details(id.0))
        }

        async fn credits(&self, id: MovieId) -> AppResult<Credits> {
            Self::delay(id).await;
            Ok(cast(id.0))
        }

        async fn videos(&self, id: MovieId) -> AppResult<Videos> {
            Self::delay(id).await;
            Ok(Videos { results: vec![] })
        }

        async fn keywords(&self, id: MovieId) -> AppResult<Keywords> {
            Self::delay(id).await;
            Ok(Keywords { keywords: vec![] })
        }

        fn name(&self) -> &'static str {
            "slow-first"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_slide_details_never_overwrite_newer() {
        let loader = SlideDetailLoader::new(Arc::new(SlowFirstMovie));

        tokio::join!(loader.activate(MovieId(1)), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            loader.activate(MovieId(2)).await;
        });

        let current = loader.current().unwrap();
        assert_eq!(current.id, MovieId(2));
        assert_eq!(current.cast.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_movie_page_is_discarded() {
        let loader = MoviePageLoader::new(Arc::new(SlowFirstMovie));

        tokio::join!(loader.open(MovieId(1)), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            loader.open(MovieId(2)).await;
        });

        match loader.view() {
            MoviePageView::Loaded(page) => assert_eq!(page.details.id, MovieId(2)),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_in_flight_load() {
        let loader = MoviePageLoader::new(Arc::new(SlowFirstMovie));

        tokio::join!(loader.open(MovieId(1)), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            loader.close();
        });

        assert_eq!(loader.view(), MoviePageView::Empty);
    }
}
