use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::review::Review;

/// Review storage. Every mutation also rewrites the book's `rating` and
/// `review_count` in the same step, so the two never drift apart.
#[async_trait]
pub trait ReviewRepository: Send + Sync + 'static {
    /// Oldest first.
    async fn list_reviews(&self, book_id: Uuid) -> Result<Vec<Review>, RepoError>;

    async fn get_review(&self, book_id: Uuid, review_id: Uuid)
        -> Result<Option<Review>, RepoError>;

    /// `Conflict` when the user already reviewed this book.
    async fn create_review(&self, review: Review) -> Result<Review, RepoError>;

    /// Replaces rating, text and `updated_at` of an existing review.
    async fn update_review(&self, review: Review) -> Result<Option<Review>, RepoError>;

    async fn delete_review(&self, book_id: Uuid, review_id: Uuid) -> Result<bool, RepoError>;
}
