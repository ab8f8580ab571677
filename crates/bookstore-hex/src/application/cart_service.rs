use bookstore_types::domain::cart::{CartItem, CartLine, Quantity};
use bookstore_types::ports::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::bounded;
use super::user_locks::UserLocks;
use crate::errors::AppError;

/// Cart operations, all scoped to one authenticated user.
pub struct CartService<S: Store> {
    store: Arc<S>,
    locks: UserLocks,
    deadline: Duration,
}

/// Attaches catalog entries to cart lines, keeping line order.
///
/// Lines whose book has left the catalog are skipped.
pub(crate) async fn resolve_lines<S: Store>(
    store: &S,
    deadline: Duration,
    lines: Vec<CartLine>,
) -> Result<Vec<CartItem>, AppError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        match bounded(deadline, store.get_book(line.book_id)).await? {
            Some(book) => items.push(CartItem {
                id: line.id,
                book,
                quantity: line.quantity,
            }),
            None => {
                tracing::warn!(line_id = %line.id, book_id = %line.book_id, "cart line references a missing book");
            }
        }
    }
    Ok(items)
}

impl<S: Store> CartService<S> {
    pub fn new(store: Arc<S>, locks: UserLocks, deadline: Duration) -> Self {
        Self {
            store,
            locks,
            deadline,
        }
    }

    pub async fn add_item(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        quantity: i64,
    ) -> Result<Vec<CartItem>, AppError> {
        let quantity = Quantity::new(quantity)?;
        if bounded(self.deadline, self.store.get_book(book_id))
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Book not found".into()));
        }

        let _guard = self.locks.lock(user_id).await;
        let line = bounded(
            self.deadline,
            self.store.add_or_increment(user_id, book_id, quantity),
        )
        .await?;
        tracing::debug!(%user_id, %book_id, line_id = %line.id, quantity = line.quantity, "cart line added");
        self.resolved(user_id).await
    }

    pub async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, AppError> {
        self.resolved(user_id).await
    }

    pub async fn update_item(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i64,
    ) -> Result<Vec<CartItem>, AppError> {
        let quantity = Quantity::new(quantity)?;
        let _guard = self.locks.lock(user_id).await;
        bounded(
            self.deadline,
            self.store.set_quantity(user_id, line_id, quantity),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".into()))?;
        self.resolved(user_id).await
    }

    pub async fn remove_item(&self, user_id: Uuid, line_id: Uuid) -> Result<(), AppError> {
        let _guard = self.locks.lock(user_id).await;
        let removed = bounded(self.deadline, self.store.remove_line(user_id, line_id)).await?;
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound("Cart item not found".into()))
        }
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        let _guard = self.locks.lock(user_id).await;
        let removed = bounded(self.deadline, self.store.clear(user_id)).await?;
        tracing::debug!(%user_id, removed, "cart cleared");
        Ok(())
    }

    async fn resolved(&self, user_id: Uuid) -> Result<Vec<CartItem>, AppError> {
        let lines = bounded(self.deadline, self.store.cart_lines(user_id)).await?;
        resolve_lines(self.store.as_ref(), self.deadline, lines).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_repo::memory::InMemoryRepo;
    use bookstore_types::domain::book::{Book, BookDetails};
    use bookstore_types::ports::catalog::CatalogRepository;

    async fn seeded() -> (CartService<InMemoryRepo>, Arc<InMemoryRepo>, Book, Book) {
        let repo = Arc::new(InMemoryRepo::new());
        let b1 = seed_book(&repo, "B1", 1000).await;
        let b2 = seed_book(&repo, "B2", 500).await;
        let svc = CartService::new(repo.clone(), UserLocks::new(), Duration::from_secs(1));
        (svc, repo, b1, b2)
    }

    async fn seed_book(repo: &InMemoryRepo, title: &str, price_cents: i64) -> Book {
        let book = Book::new(
            Uuid::new_v4(),
            BookDetails {
                title: title.into(),
                author: "A".into(),
                genre: "G".into(),
                price_cents,
                stock: 10,
                description: None,
            },
        )
        .unwrap();
        repo.upsert_book(book).await.unwrap()
    }

    #[tokio::test]
    async fn add_twice_merges_into_one_line() {
        let (svc, _repo, b1, _b2) = seeded().await;
        let user = Uuid::new_v4();
        svc.add_item(user, b1.id, 4).await.unwrap();
        let cart = svc.add_item(user, b1.id, 7).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 11);
        assert_eq!(cart[0].book.title, "B1");
    }

    #[tokio::test]
    async fn add_rejects_unknown_book_and_bad_quantity() {
        let (svc, _repo, b1, _b2) = seeded().await;
        let user = Uuid::new_v4();
        let missing = svc.add_item(user, Uuid::new_v4(), 1).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
        for q in [0, 100, -1] {
            let bad = svc.add_item(user, b1.id, q).await;
            assert!(matches!(bad, Err(AppError::BadRequest(_))), "quantity {q}");
        }
        assert!(svc.get_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_remove_lines() {
        let (svc, _repo, b1, b2) = seeded().await;
        let user = Uuid::new_v4();
        svc.add_item(user, b1.id, 1).await.unwrap();
        let cart = svc.add_item(user, b2.id, 1).await.unwrap();
        let line = cart[1].id;

        let cart = svc.update_item(user, line, 5).await.unwrap();
        assert_eq!(cart[1].quantity, 5);

        let bad = svc.update_item(user, line, 0).await;
        assert!(matches!(bad, Err(AppError::BadRequest(_))));

        let missing = svc.update_item(user, Uuid::new_v4(), 2).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        svc.remove_item(user, line).await.unwrap();
        let again = svc.remove_item(user, line).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        assert_eq!(svc.get_cart(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_users_lines_are_not_found() {
        let (svc, _repo, b1, _b2) = seeded().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let cart = svc.add_item(alice, b1.id, 1).await.unwrap();
        let res = svc.update_item(bob, cart[0].id, 3).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
        let res = svc.remove_item(bob, cart[0].id).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (svc, _repo, b1, _b2) = seeded().await;
        let user = Uuid::new_v4();
        svc.add_item(user, b1.id, 2).await.unwrap();
        svc.clear(user).await.unwrap();
        svc.clear(user).await.unwrap();
        assert!(svc.get_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_adds_sum_into_one_line() {
        let (svc, _repo, b1, _b2) = seeded().await;
        let svc = Arc::new(svc);
        let user = Uuid::new_v4();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let svc = svc.clone();
            let book = b1.id;
            handles.push(tokio::spawn(async move {
                svc.add_item(user, book, 2).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let cart = svc.get_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 20);
    }
}
