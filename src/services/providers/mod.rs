/// Catalog data provider abstraction
///
/// All catalog data comes from a remote movie metadata service. The trait
/// keeps the pagination, carousel and detail layers independent of the
/// concrete HTTP client so they can be driven by fixtures in tests.
use crate::{
    error::AppResult,
    models::{
        Credits, DiscoverParams, Genre, Keywords, Movie, MovieDetails, MovieId, UpstreamPage,
        Videos,
    },
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for remote catalog providers
///
/// Every method is a read-only, idempotent request. Non-2xx responses map to
/// `AppError::Unauthorized` (401) or `AppError::Upstream`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// List the genre vocabulary
    async fn genres(&self) -> AppResult<Vec<Genre>>;

    /// Filtered discovery, one upstream page
    async fn discover(&self, params: &DiscoverParams, page: u32)
        -> AppResult<UpstreamPage<Movie>>;

    /// Full-text title search, one upstream page
    async fn search(&self, query: &str, page: u32) -> AppResult<UpstreamPage<Movie>>;

    async fn movie(&self, id: MovieId) -> AppResult<MovieDetails>;

    async fn credits(&self, id: MovieId) -> AppResult<Credits>;

    async fn videos(&self, id: MovieId) -> AppResult<Videos>;

    async fn keywords(&self, id: MovieId) -> AppResult<Keywords>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
