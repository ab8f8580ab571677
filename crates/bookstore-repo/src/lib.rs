#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use bookstore_types::domain::book::Book;
use bookstore_types::domain::cart::{CartLine, Quantity};
use bookstore_types::domain::order::{Order, OrderStatus};
use bookstore_types::domain::review::Review;
use bookstore_types::ports::cart_repository::CartRepository;
use bookstore_types::ports::catalog::CatalogRepository;
use bookstore_types::ports::order_repository::{OrderRepository, OrderScope};
use bookstore_types::ports::review_repository::ReviewRepository;
use bookstore_types::ports::RepoError;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(all(feature = "sqlite", not(feature = "memory")))]
const DEFAULT_SQLITE_URL: &str = "sqlite://bookstore.db";

/// Storage backend selected at startup.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both adapters compiled in, a database URL selects sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.$method($($arg),*).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl CatalogRepository for Repo {
    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, RepoError> {
        delegate!(self, get_book(id))
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepoError> {
        delegate!(self, list_books())
    }

    async fn upsert_book(&self, book: Book) -> Result<Book, RepoError> {
        delegate!(self, upsert_book(book))
    }
}

#[async_trait]
impl CartRepository for Repo {
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError> {
        delegate!(self, cart_lines(user_id))
    }

    async fn add_or_increment(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartLine, RepoError> {
        delegate!(self, add_or_increment(user_id, book_id, quantity))
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: Quantity,
    ) -> Result<Option<CartLine>, RepoError> {
        delegate!(self, set_quantity(user_id, line_id, quantity))
    }

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool, RepoError> {
        delegate!(self, remove_line(user_id, line_id))
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, RepoError> {
        delegate!(self, clear(user_id))
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        delegate!(self, create(order))
    }

    async fn get(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>, RepoError> {
        delegate!(self, get(id, scope))
    }

    async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        delegate!(self, list(scope))
    }

    async fn update_status(
        &self,
        id: Uuid,
        scope: OrderScope,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        delegate!(self, update_status(id, scope, status))
    }
}

#[async_trait]
impl ReviewRepository for Repo {
    async fn list_reviews(&self, book_id: Uuid) -> Result<Vec<Review>, RepoError> {
        delegate!(self, list_reviews(book_id))
    }

    async fn get_review(
        &self,
        book_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepoError> {
        delegate!(self, get_review(book_id, review_id))
    }

    async fn create_review(&self, review: Review) -> Result<Review, RepoError> {
        delegate!(self, create_review(review))
    }

    async fn update_review(&self, review: Review) -> Result<Option<Review>, RepoError> {
        delegate!(self, update_review(review))
    }

    async fn delete_review(&self, book_id: Uuid, review_id: Uuid) -> Result<bool, RepoError> {
        delegate!(self, delete_review(book_id, review_id))
    }
}
