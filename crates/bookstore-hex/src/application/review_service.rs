use bookstore_types::domain::review::{Review, ReviewDraft};
use bookstore_types::domain::user::Principal;
use bookstore_types::ports::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::bounded;
use crate::errors::AppError;

/// Book reviews. Reading is public; each reader may hold one review per book
/// and only its author may change or delete it.
pub struct ReviewService<S: Store> {
    store: Arc<S>,
    deadline: Duration,
}

impl<S: Store> ReviewService<S> {
    pub fn new(store: Arc<S>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn list_reviews(&self, book_id: Uuid) -> Result<Vec<Review>, AppError> {
        self.ensure_book(book_id).await?;
        bounded(self.deadline, self.store.list_reviews(book_id)).await
    }

    pub async fn create_review(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        rating: i64,
        text: &str,
    ) -> Result<Review, AppError> {
        let draft = ReviewDraft::new(rating, text)?;
        self.ensure_book(book_id).await?;

        let review = Review::new(book_id, user_id, draft);
        let review = match bounded(self.deadline, self.store.create_review(review)).await {
            Err(AppError::Conflict(_)) => {
                return Err(AppError::Conflict("You have already reviewed this book".into()))
            }
            other => other?,
        };
        tracing::info!(review_id = %review.id, %book_id, %user_id, rating = review.rating, "review created");
        Ok(review)
    }

    pub async fn update_review(
        &self,
        principal: &Principal,
        book_id: Uuid,
        review_id: Uuid,
        rating: i64,
        text: &str,
    ) -> Result<Review, AppError> {
        let draft = ReviewDraft::new(rating, text)?;
        let mut review = self.authored(principal, book_id, review_id).await?;
        review.revise(draft);

        let review = bounded(self.deadline, self.store.update_review(review))
            .await?
            .ok_or_else(review_not_found)?;
        tracing::info!(%review_id, %book_id, rating = review.rating, "review updated");
        Ok(review)
    }

    pub async fn delete_review(
        &self,
        principal: &Principal,
        book_id: Uuid,
        review_id: Uuid,
    ) -> Result<(), AppError> {
        self.authored(principal, book_id, review_id).await?;
        if !bounded(self.deadline, self.store.delete_review(book_id, review_id)).await? {
            return Err(review_not_found());
        }
        tracing::info!(%review_id, %book_id, "review deleted");
        Ok(())
    }

    async fn ensure_book(&self, book_id: Uuid) -> Result<(), AppError> {
        match bounded(self.deadline, self.store.get_book(book_id)).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Book not found".into())),
        }
    }

    // Book first, then review, then authorship; each failure has its own status.
    async fn authored(
        &self,
        principal: &Principal,
        book_id: Uuid,
        review_id: Uuid,
    ) -> Result<Review, AppError> {
        self.ensure_book(book_id).await?;
        let review = bounded(self.deadline, self.store.get_review(book_id, review_id))
            .await?
            .ok_or_else(review_not_found)?;
        if review.user_id != principal.user_id {
            return Err(AppError::Forbidden(
                "You can only modify your own reviews".into(),
            ));
        }
        Ok(review)
    }
}

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found".into())
}
