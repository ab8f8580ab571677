use async_trait::async_trait;
use bookstore_types::domain::book::Book;
use bookstore_types::domain::cart::{CartLine, Quantity};
use bookstore_types::domain::order::{Order, OrderStatus};
use bookstore_types::domain::review::{Review, ReviewStats};
use bookstore_types::ports::cart_repository::CartRepository;
use bookstore_types::ports::catalog::CatalogRepository;
use bookstore_types::ports::order_repository::{OrderRepository, OrderScope};
use bookstore_types::ports::review_repository::ReviewRepository;
use bookstore_types::ports::RepoError;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub books: Arc<DashMap<Uuid, Book>>,
    pub carts: Arc<DashMap<Uuid, Vec<CartLine>>>,
    pub orders: Arc<DashMap<Uuid, Order>>,
    /// Keyed by book id.
    pub reviews: Arc<DashMap<Uuid, Vec<Review>>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            books: Arc::new(DashMap::new()),
            carts: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            reviews: Arc::new(DashMap::new()),
        }
    }

    // Callers hold the book's reviews entry, so no other mutation interleaves.
    fn apply_stats(&self, book_id: Uuid, reviews: &[Review]) {
        let stats = ReviewStats::of(reviews);
        if let Some(mut book) = self.books.get_mut(&book_id) {
            book.rating = stats.rating;
            book.review_count = stats.review_count;
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepo {
    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, RepoError> {
        Ok(self.books.get(&id).map(|r| r.clone()))
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepoError> {
        let mut books: Vec<Book> = self.books.iter().map(|kv| kv.value().clone()).collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn upsert_book(&self, mut book: Book) -> Result<Book, RepoError> {
        let mut entry = self.books.entry(book.id).or_insert_with(|| book.clone());
        book.rating = entry.rating;
        book.review_count = entry.review_count;
        *entry = book.clone();
        Ok(book)
    }
}

#[async_trait]
impl CartRepository for InMemoryRepo {
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError> {
        Ok(self
            .carts
            .get(&user_id)
            .map(|lines| lines.clone())
            .unwrap_or_default())
    }

    async fn add_or_increment(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartLine, RepoError> {
        // The entry guard holds the shard lock for the whole find-or-push.
        let mut lines = self.carts.entry(user_id).or_default();
        if let Some(line) = lines.iter_mut().find(|l| l.book_id == book_id) {
            line.quantity += quantity.get();
            return Ok(line.clone());
        }
        let line = CartLine::new(user_id, book_id, quantity);
        lines.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: Quantity,
    ) -> Result<Option<CartLine>, RepoError> {
        if let Some(mut lines) = self.carts.get_mut(&user_id) {
            if let Some(line) = lines.iter_mut().find(|l| l.id == line_id) {
                line.quantity = quantity.get();
                return Ok(Some(line.clone()));
            }
        }
        Ok(None)
    }

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool, RepoError> {
        if let Some(mut lines) = self.carts.get_mut(&user_id) {
            let before = lines.len();
            lines.retain(|l| l.id != line_id);
            return Ok(lines.len() < before);
        }
        Ok(false)
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .carts
            .remove(&user_id)
            .map(|(_, lines)| lines.len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        if self.orders.contains_key(&order.id) {
            return Err(RepoError::Conflict(format!("order {} already exists", order.id)));
        }
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>, RepoError> {
        Ok(self
            .orders
            .get(&id)
            .filter(|o| scope.permits(o))
            .map(|o| o.clone()))
    }

    async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| scope.permits(kv.value()))
            .map(|kv| kv.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: Uuid,
        scope: OrderScope,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            if !scope.permits(&v) {
                return Ok(None);
            }
            v.update_status(status);
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryRepo {
    async fn list_reviews(&self, book_id: Uuid) -> Result<Vec<Review>, RepoError> {
        Ok(self
            .reviews
            .get(&book_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn get_review(
        &self,
        book_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepoError> {
        Ok(self
            .reviews
            .get(&book_id)
            .and_then(|r| r.iter().find(|r| r.id == review_id).cloned()))
    }

    async fn create_review(&self, review: Review) -> Result<Review, RepoError> {
        let mut reviews = self.reviews.entry(review.book_id).or_default();
        if reviews.iter().any(|r| r.user_id == review.user_id) {
            return Err(RepoError::Conflict(format!(
                "user {} already reviewed book {}",
                review.user_id, review.book_id
            )));
        }
        reviews.push(review.clone());
        self.apply_stats(review.book_id, &reviews);
        Ok(review)
    }

    async fn update_review(&self, review: Review) -> Result<Option<Review>, RepoError> {
        let Some(mut reviews) = self.reviews.get_mut(&review.book_id) else {
            return Ok(None);
        };
        let Some(slot) = reviews.iter_mut().find(|r| r.id == review.id) else {
            return Ok(None);
        };
        slot.rating = review.rating;
        slot.review = review.review;
        slot.updated_at = review.updated_at;
        let updated = slot.clone();
        self.apply_stats(updated.book_id, &reviews);
        Ok(Some(updated))
    }

    async fn delete_review(&self, book_id: Uuid, review_id: Uuid) -> Result<bool, RepoError> {
        let Some(mut reviews) = self.reviews.get_mut(&book_id) else {
            return Ok(false);
        };
        let before = reviews.len();
        reviews.retain(|r| r.id != review_id);
        if reviews.len() == before {
            return Ok(false);
        }
        self.apply_stats(book_id, &reviews);
        Ok(true)
    }
}
