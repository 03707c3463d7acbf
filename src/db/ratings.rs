use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    db::storage::{KeyValueStorage, StorageKey},
    error::AppResult,
    models::{MovieId, Rating},
};

/// Local star ratings keyed by movie
///
/// The whole map is written through to storage on every change; storage is
/// only parsed once, when the store is loaded.
pub struct RatingStore {
    storage: Arc<dyn KeyValueStorage>,
    ratings: BTreeMap<MovieId, Rating>,
}

impl RatingStore {
    /// Loads the persisted map, recovering to empty on missing or corrupt data.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let ratings = match storage.get(&StorageKey::Ratings) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable ratings");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Ratings storage unavailable, starting empty");
                BTreeMap::new()
            }
        };

        tracing::debug!(count = ratings.len(), "Loaded local ratings");
        Self { storage, ratings }
    }

    pub fn get(&self, id: MovieId) -> Option<Rating> {
        self.ratings.get(&id).copied()
    }

    /// Sets or clears (`None`) the rating for a movie.
    ///
    /// The in-memory map changes only after the new map has been persisted.
    pub fn set(&mut self, id: MovieId, rating: Option<Rating>) -> AppResult<()> {
        let mut next = self.ratings.clone();
        match rating {
            Some(rating) => {
                next.insert(id, rating);
            }
            None => {
                next.remove(&id);
            }
        }

        let json = serde_json::to_string(&next)?;
        self.storage.set(&StorageKey::Ratings, json)?;
        self.ratings = next;

        tracing::debug!(movie_id = %id, rating = ?rating.map(Rating::stars), "Rating saved");
        Ok(())
    }

    /// Picks a star: choosing the current rating again clears it.
    ///
    /// Returns the rating now stored.
    pub fn toggle(&mut self, id: MovieId, stars: u8) -> AppResult<Option<Rating>> {
        let picked = Rating::try_from(stars)?;
        let next = if self.get(id) == Some(picked) {
            None
        } else {
            Some(picked)
        };
        self.set(id, next)?;
        Ok(next)
    }

    pub fn all(&self) -> &BTreeMap<MovieId, Rating> {
        &self.ratings
    }
}
