use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinescope::{
    config::Config,
    db::{FileStorage, KeyValueStorage, RatingStore, ReviewStore},
    format::{self, ImageUrls, DEFAULT_BACKDROP_SIZE},
    models::{CatalogFilters, CatalogQuery},
    services::{
        autoplay::CarouselHandle,
        catalog::{self, CatalogBrowser, CatalogView},
        details::SlideDetailLoader,
        providers::{CatalogProvider, TmdbProvider},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinescope=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.warn_if_unauthenticated();

    let provider: Arc<dyn CatalogProvider> = Arc::new(TmdbProvider::new(
        config.token().map(str::to_string),
        config.tmdb_api_url.clone(),
    ));
    let images = ImageUrls::new(config.tmdb_image_url.clone());

    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.storage_path));
    let ratings = RatingStore::load(Arc::clone(&storage));
    let reviews = ReviewStore::load(Arc::clone(&storage));
    tracing::info!(
        path = %config.storage_path,
        ratings = ratings.all().len(),
        "Personalization store loaded"
    );

    let today = chrono::Local::now().date_naive();

    let genres = catalog::load_genres(provider.as_ref()).await;
    tracing::info!(genres = genres.len(), "Genre filters ready");

    let browser = CatalogBrowser::new(Arc::clone(&provider));
    browser
        .set_query(CatalogQuery::from_input(
            "",
            &CatalogFilters::default(),
            today,
        ))
        .await?;
    match browser.state().await.view {
        CatalogView::Loaded(movies) => {
            for movie in &movies {
                tracing::debug!(
                    id = %movie.id,
                    title = %movie.title,
                    year = %format::year_of(movie.release_date.as_deref()),
                    stars = format::to_five_star(movie.vote_average),
                    votes = %format::compact(movie.vote_count),
                    rating = ?ratings.get(movie.id).map(|r| r.stars()),
                    reviews = reviews.list(movie.id).len(),
                    "Catalog entry"
                );
            }
        }
        CatalogView::Failed(message) => {
            tracing::warn!(error = %message, "Catalog unavailable");
        }
        CatalogView::Idle | CatalogView::Loading => {}
    }

    let slides = catalog::load_hero_or_empty(provider.as_ref(), today).await;
    let carousel = CarouselHandle::spawn(slides);

    let details = Arc::new(SlideDetailLoader::new(Arc::clone(&provider)));
    let follower = Arc::clone(&details).follow(carousel.subscribe());

    let mut snapshots = carousel.subscribe();
    let mut detail_updates = details.subscribe();
    let mut shown = None;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.active_index != shown {
                    shown = snapshot.active_index;
                    if let Some(movie) = &snapshot.active_item {
                        tracing::info!(
                            index = ?snapshot.active_index,
                            title = %movie.title,
                            backdrop = ?images.backdrop_for(movie, DEFAULT_BACKDROP_SIZE),
                            "Active slide"
                        );
                    }
                }
            }
            changed = detail_updates.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(slide) = detail_updates.borrow_and_update().as_ref() {
                    tracing::info!(
                        movie_id = %slide.id,
                        cast = slide.cast.len(),
                        trailer = ?slide.trailer_url,
                        "Slide details"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    carousel.shutdown().await;
    follower.abort();
    Ok(())
}
