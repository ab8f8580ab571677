use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
const MAX_REVIEW_LEN: usize = 500;

/// A reader's rating and comment. One per (book, user).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub review: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checked rating and text, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub review: String,
}

impl ReviewDraft {
    pub fn new(rating: i64, review: &str) -> Result<Self, ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ValidationError::RatingOutOfRange(rating));
        }
        let review = review.trim();
        if review.is_empty() {
            return Err(ValidationError::MissingField("review"));
        }
        if review.chars().count() > MAX_REVIEW_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "review",
                max: MAX_REVIEW_LEN,
            });
        }
        Ok(Self {
            rating: rating as u8,
            review: review.to_string(),
        })
    }
}

impl Review {
    pub fn new(book_id: Uuid, user_id: Uuid, draft: ReviewDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            book_id,
            user_id,
            rating: draft.rating,
            review: draft.review,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn revise(&mut self, draft: ReviewDraft) {
        self.rating = draft.rating;
        self.review = draft.review;
        self.updated_at = Utc::now();
    }
}

/// Average rating and count a book carries; `0.0` with no reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReviewStats {
    pub rating: f32,
    pub review_count: u32,
}

impl ReviewStats {
    pub fn of<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let (sum, count) = reviews
            .into_iter()
            .fold((0u64, 0u32), |(s, c), r| (s + u64::from(r.rating), c + 1));
        if count == 0 {
            return Self::default();
        }
        Self {
            rating: (sum as f64 / f64::from(count)) as f32,
            review_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rules() {
        assert_eq!(
            ReviewDraft::new(0, "meh"),
            Err(ValidationError::RatingOutOfRange(0))
        );
        assert_eq!(
            ReviewDraft::new(6, "wow"),
            Err(ValidationError::RatingOutOfRange(6))
        );
        assert_eq!(
            ReviewDraft::new(3, "   "),
            Err(ValidationError::MissingField("review"))
        );
        assert_eq!(
            ReviewDraft::new(3, &"a".repeat(501)),
            Err(ValidationError::FieldTooLong {
                field: "review",
                max: 500
            })
        );
        let ok = ReviewDraft::new(5, "  Loved it  ").unwrap();
        assert_eq!(ok.rating, 5);
        assert_eq!(ok.review, "Loved it");
    }

    #[test]
    fn stats_average_ratings() {
        assert_eq!(ReviewStats::of(&Vec::<Review>::new()), ReviewStats::default());

        let book = Uuid::new_v4();
        let reviews: Vec<Review> = [5, 4, 4]
            .into_iter()
            .map(|r| Review::new(book, Uuid::new_v4(), ReviewDraft::new(r, "fine").unwrap()))
            .collect();
        let stats = ReviewStats::of(&reviews);
        assert_eq!(stats.review_count, 3);
        assert!((stats.rating - 13.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn revise_touches_updated_at_only() {
        let draft = ReviewDraft::new(2, "slow").unwrap();
        let mut r = Review::new(Uuid::new_v4(), Uuid::new_v4(), draft);
        let created = r.created_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        r.revise(ReviewDraft::new(4, "grew on me").unwrap());
        assert_eq!(r.rating, 4);
        assert_eq!(r.created_at, created);
        assert!(r.updated_at > created);
    }
}
