/// TMDB API provider
///
/// Talks to the TMDB v3 REST API with a v4 read access token sent as a
/// bearer header. Without a token the header is left off; the API then
/// answers 401, which surfaces as `AppError::Unauthorized`.
///
/// Endpoints:
/// - /genre/movie/list
/// - /discover/movie, /search/movie (paged, 20 results per page)
/// - /movie/{id}, /movie/{id}/credits, /movie/{id}/videos, /movie/{id}/keywords
use crate::{
    error::{AppError, AppResult},
    models::{
        Credits, DiscoverParams, Genre, GenreList, Keywords, Movie, MovieDetails, MovieId,
        UpstreamPage, Videos,
    },
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::instrument;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    token: Option<String>,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(token: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            token: token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Issues a GET and decodes the JSON body
    #[instrument(skip(self, params), level = "debug", fields(provider = "tmdb"))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = self.url(path);
        tracing::debug!(params = params.len(), "TMDB request");

        let mut request = self.http_client.get(&url).query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                tracing::error!(
                    has_token = self.token.is_some(),
                    token_length = self.token.as_ref().map(String::len).unwrap_or(0),
                    path = %path,
                    "TMDB rejected the request as unauthorized"
                );
            }
            return Err(AppError::from_status(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn discover(
        &self,
        params: &DiscoverParams,
        page: u32,
    ) -> AppResult<UpstreamPage<Movie>> {
        let page_str = page.to_string();
        let mut query = params.pairs();
        query.push(("page", page_str.as_str()));

        let result: UpstreamPage<Movie> = self.get_json("/discover/movie", &query).await?;

        tracing::debug!(
            page = page,
            results = result.results.len(),
            total_pages = ?result.total_pages,
            provider = "tmdb",
            "Discover page fetched"
        );

        Ok(result)
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<UpstreamPage<Movie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let page_str = page.to_string();
        let result: UpstreamPage<Movie> = self
            .get_json("/search/movie", &[("query", query), ("page", page_str.as_str())])
            .await?;

        tracing::debug!(
            query = %query,
            page = page,
            results = result.results.len(),
            provider = "tmdb",
            "Search page fetched"
        );

        Ok(result)
    }

    async fn movie(&self, id: MovieId) -> AppResult<MovieDetails> {
        self.get_json(&format!("/movie/{}", id), &[]).await
    }

    async fn credits(&self, id: MovieId) -> AppResult<Credits> {
        self.get_json(&format!("/movie/{}/credits", id), &[]).await
    }

    async fn videos(&self, id: MovieId) -> AppResult<Videos> {
        self.get_json(&format!("/movie/{}/videos", id), &[]).await
    }

    async fn keywords(&self, id: MovieId) -> AppResult<Keywords> {
        self.get_json(&format!("/movie/{}/keywords", id), &[]).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
