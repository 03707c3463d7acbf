use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A personal star rating, always within 1..=5
///
/// "Unrated" is expressed as `Option::<Rating>::None`, never as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A locally stored text review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    /// 0 means the reviewer left no star score.
    pub stars: u8,
    pub date: DateTime<Utc>,
}

/// User input for a new review
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub author: String,
    pub text: String,
    pub stars: u8,
}

impl ReviewDraft {
    pub fn new(author: impl Into<String>, text: impl Into<String>, stars: u8) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            stars,
        }
    }

    /// Validates the draft and stamps it with a fresh id and the current time.
    pub fn into_review(self) -> Result<Review, AppError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput(
                "Review text cannot be empty".to_string(),
            ));
        }
        if self.stars > Rating::MAX {
            return Err(AppError::InvalidInput(format!(
                "Review stars must be between 0 and {}, got {}",
                Rating::MAX,
                self.stars
            )));
        }

        let author = match self.author.trim() {
            "" => ANONYMOUS_AUTHOR.to_string(),
            name => name.to_string(),
        };

        Ok(Review {
            id: Uuid::new_v4(),
            author,
            text: text.to_string(),
            stars: self.stars,
            date: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::try_from(0).is_err());
        assert_eq!(Rating::try_from(1).unwrap().stars(), 1);
        assert_eq!(Rating::try_from(5).unwrap().stars(), 5);
        assert!(Rating::try_from(6).is_err());
    }

    #[test]
    fn test_rating_serde_rejects_out_of_range() {
        assert_eq!(serde_json::to_string(&Rating(3)).unwrap(), "3");
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_draft_defaults_author() {
        let review = ReviewDraft::new("   ", " Loved it ", 5).into_review().unwrap();
        assert_eq!(review.author, "Anonymous");
        assert_eq!(review.text, "Loved it");
        assert_eq!(review.stars, 5);
    }

    #[test]
    fn test_draft_rejects_blank_text_and_bad_stars() {
        assert!(ReviewDraft::new("Ann", "  ", 3).into_review().is_err());
        assert!(ReviewDraft::new("Ann", "ok", 6).into_review().is_err());
        assert!(ReviewDraft::new("Ann", "ok", 0).into_review().is_ok());
    }
}
