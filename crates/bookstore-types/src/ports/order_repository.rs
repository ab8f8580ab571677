use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::order::{Order, OrderStatus};

/// Restricts which orders a query can see.
///
/// `Owner` scoping happens inside the query, so a non-owner gets the same
/// `None` as for a missing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Any,
    Owner(Uuid),
}

impl OrderScope {
    pub fn permits(&self, order: &Order) -> bool {
        match self {
            OrderScope::Any => true,
            OrderScope::Owner(user_id) => order.user_id == *user_id,
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError>;
    async fn update_status(
        &self,
        id: Uuid,
        scope: OrderScope,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError>;
}
