use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::cart::{CartLine, Quantity};

#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    /// Lines of a user's cart in the order they were first added.
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError>;

    /// Atomically increments the line for `book_id`, or appends a new one.
    async fn add_or_increment(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartLine, RepoError>;

    async fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: Quantity,
    ) -> Result<Option<CartLine>, RepoError>;

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool, RepoError>;

    /// Removes every line; clearing an empty cart is a no-op. Returns lines removed.
    async fn clear(&self, user_id: Uuid) -> Result<u64, RepoError>;
}
