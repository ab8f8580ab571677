use bookstore_types::domain::book::{Book, BookDetails};
use bookstore_types::domain::user::Principal;
use bookstore_types::ports::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::bounded;
use crate::errors::AppError;

/// Read access to the catalog plus the admin-only upsert.
pub struct CatalogService<S: Store> {
    store: Arc<S>,
    deadline: Duration,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: Arc<S>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        bounded(self.deadline, self.store.list_books()).await
    }

    pub async fn get_book(&self, id: Uuid) -> Result<Book, AppError> {
        bounded(self.deadline, self.store.get_book(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    pub async fn upsert_book(
        &self,
        principal: &Principal,
        id: Uuid,
        details: BookDetails,
    ) -> Result<Book, AppError> {
        if !principal.is_admin() {
            return Err(AppError::Forbidden(
                "You do not have permission to perform this action".into(),
            ));
        }
        let book = Book::new(id, details)?;
        let saved = bounded(self.deadline, self.store.upsert_book(book)).await?;
        tracing::info!(book_id = %saved.id, price_cents = saved.price_cents, "book upserted");
        Ok(saved)
    }
}
