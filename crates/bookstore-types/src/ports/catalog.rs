use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::book::Book;

#[async_trait]
pub trait CatalogRepository: Send + Sync + 'static {
    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, RepoError>;
    async fn list_books(&self) -> Result<Vec<Book>, RepoError>;
    /// An existing book keeps its `rating` and `review_count`; only reviews change those.
    async fn upsert_book(&self, book: Book) -> Result<Book, RepoError>;
}
