pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod review_service;
pub mod user_locks;

use bookstore_types::ports::{RepoError, Store};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::AppError;
use cart_service::CartService;
use catalog_service::CatalogService;
use order_service::OrderService;
use review_service::ReviewService;
use user_locks::UserLocks;

/// Runs one data-store call under `deadline`.
pub(crate) async fn bounded<T, F>(deadline: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(res) => res.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(deadline_ms = %deadline.as_millis(), "data store call timed out");
            Err(AppError::DeadlineExceeded)
        }
    }
}

/// The application services wired to one shared store and lock table.
pub struct Services<S: Store> {
    pub catalog: CatalogService<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
}

impl<S: Store> Services<S> {
    pub fn new(store: S, config: &Config) -> Self {
        let store = Arc::new(store);
        let locks = UserLocks::new();
        Self {
            catalog: CatalogService::new(store.clone(), config.store_timeout),
            cart: CartService::new(store.clone(), locks.clone(), config.store_timeout),
            orders: OrderService::new(store.clone(), locks, config),
            reviews: ReviewService::new(store, config.store_timeout),
        }
    }
}
