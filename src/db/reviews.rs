use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::storage::{KeyValueStorage, StorageKey},
    error::AppResult,
    models::{MovieId, Review, ReviewDraft},
};

/// Local text reviews, newest first per movie
pub struct ReviewStore {
    storage: Arc<dyn KeyValueStorage>,
    reviews: BTreeMap<MovieId, Vec<Review>>,
}

impl ReviewStore {
    /// Loads the persisted map, recovering to empty on missing or corrupt data.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let reviews = match storage.get(&StorageKey::Reviews) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable reviews");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Reviews storage unavailable, starting empty");
                BTreeMap::new()
            }
        };

        Self { storage, reviews }
    }

    pub fn list(&self, id: MovieId) -> &[Review] {
        self.reviews.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Validates and prepends a review, returning the stored record.
    pub fn add(&mut self, id: MovieId, draft: ReviewDraft) -> AppResult<Review> {
        let review = draft.into_review()?;

        let mut next = self.reviews.clone();
        next.entry(id).or_default().insert(0, review.clone());
        self.commit(next)?;

        tracing::debug!(movie_id = %id, review_id = %review.id, "Review added");
        Ok(review)
    }

    /// Removes one review; returns whether anything was removed.
    pub fn remove(&mut self, id: MovieId, review_id: Uuid) -> AppResult<bool> {
        let Some(existing) = self.reviews.get(&id) else {
            return Ok(false);
        };
        if !existing.iter().any(|r| r.id == review_id) {
            return Ok(false);
        }

        let mut next = self.reviews.clone();
        let remaining: Vec<Review> = existing
            .iter()
            .filter(|r| r.id != review_id)
            .cloned()
            .collect();
        if remaining.is_empty() {
            next.remove(&id);
        } else {
            next.insert(id, remaining);
        }
        self.commit(next)?;

        tracing::debug!(movie_id = %id, review_id = %review_id, "Review removed");
        Ok(true)
    }

    fn commit(&mut self, next: BTreeMap<MovieId, Vec<Review>>) -> AppResult<()> {
        let json = serde_json::to_string(&next)?;
        self.storage.set(&StorageKey::Reviews, json)?;
        self.reviews = next;
        Ok(())
    }
}
