pub mod cart_repository;
pub mod catalog;
pub mod identity;
pub mod order_repository;
pub mod review_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Everything the application services need from storage.
pub trait Store:
    catalog::CatalogRepository
    + cart_repository::CartRepository
    + order_repository::OrderRepository
    + review_repository::ReviewRepository
{
}

impl<T> Store for T where
    T: catalog::CatalogRepository
        + cart_repository::CartRepository
        + order_repository::OrderRepository
        + review_repository::ReviewRepository
{
}
