#![cfg(feature = "memory")]

use bookstore_repo::memory::InMemoryRepo;
use bookstore_types::domain::book::{Book, BookDetails};
use bookstore_types::domain::cart::{CartItem, Quantity};
use bookstore_types::domain::order::{Order, OrderStatus, PaymentMethod, ShippingAddress};
use bookstore_types::domain::review::{Review, ReviewDraft};
use bookstore_types::ports::cart_repository::CartRepository;
use bookstore_types::ports::catalog::CatalogRepository;
use bookstore_types::ports::order_repository::{OrderRepository, OrderScope};
use bookstore_types::ports::review_repository::ReviewRepository;
use bookstore_types::ports::RepoError;
use uuid::Uuid;

fn book(title: &str, price_cents: i64) -> Book {
    Book::new(
        Uuid::new_v4(),
        BookDetails {
            title: title.into(),
            author: "Author".into(),
            genre: "Genre".into(),
            price_cents,
            stock: 5,
            description: None,
        },
    )
    .unwrap()
}

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "1 Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        zip_code: "62701".into(),
        country: "USA".into(),
    }
}

fn qty(n: i64) -> Quantity {
    Quantity::new(n).unwrap()
}

fn review(book_id: Uuid, rating: i64) -> Review {
    Review::new(
        book_id,
        Uuid::new_v4(),
        ReviewDraft::new(rating, "Worth reading").unwrap(),
    )
}

#[tokio::test]
async fn memory_repo_cart_merges_lines_per_book() {
    let repo = InMemoryRepo::new();
    let user = Uuid::new_v4();
    let b1 = Uuid::new_v4();
    let b2 = Uuid::new_v4();

    let first = repo.add_or_increment(user, b1, qty(2)).await.unwrap();
    repo.add_or_increment(user, b2, qty(1)).await.unwrap();
    let merged = repo.add_or_increment(user, b1, qty(1)).await.unwrap();
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 3);

    let lines = repo.cart_lines(user).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].book_id, b1);

    let updated = repo
        .set_quantity(user, first.id, qty(9))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.quantity, 9);

    assert!(repo.remove_line(user, first.id).await.unwrap());
    assert!(!repo.remove_line(user, first.id).await.unwrap());
    assert_eq!(repo.clear(user).await.unwrap(), 1);
    assert_eq!(repo.clear(user).await.unwrap(), 0);
    assert!(repo.cart_lines(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_repo_cart_lines_are_per_user() {
    let repo = InMemoryRepo::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let line = repo
        .add_or_increment(alice, Uuid::new_v4(), qty(1))
        .await
        .unwrap();

    assert!(repo.set_quantity(bob, line.id, qty(2)).await.unwrap().is_none());
    assert!(!repo.remove_line(bob, line.id).await.unwrap());
    assert_eq!(repo.cart_lines(alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn memory_repo_concurrent_adds_never_duplicate_lines() {
    let repo = InMemoryRepo::new();
    let user = Uuid::new_v4();
    let b = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.add_or_increment(user, b, qty(1)).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let lines = repo.cart_lines(user).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 20);
}

#[tokio::test]
async fn memory_repo_order_scoping() {
    let repo = InMemoryRepo::new();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let b = book("Dune", 1000);
    repo.upsert_book(b.clone()).await.unwrap();

    let items = vec![CartItem {
        id: Uuid::new_v4(),
        book: b,
        quantity: 2,
    }];
    let order = Order::place(owner, &items, address(), PaymentMethod::Paypal).unwrap();
    repo.create(order.clone()).await.unwrap();

    assert!(repo.create(order.clone()).await.is_err());
    assert!(repo
        .get(order.id, OrderScope::Owner(stranger))
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        repo.get(order.id, OrderScope::Owner(owner))
            .await
            .unwrap()
            .unwrap()
            .total_amount_cents,
        2000
    );
    assert!(repo
        .list(OrderScope::Owner(stranger))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repo.list(OrderScope::Any).await.unwrap().len(), 1);

    let denied = repo
        .update_status(order.id, OrderScope::Owner(stranger), OrderStatus::Shipped)
        .await
        .unwrap();
    assert!(denied.is_none());
    let updated = repo
        .update_status(order.id, OrderScope::Any, OrderStatus::Shipped)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    assert!(repo.get_book(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo
        .get(Uuid::new_v4(), OrderScope::Any)
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .update_status(Uuid::new_v4(), OrderScope::Any, OrderStatus::Shipped)
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .set_quantity(Uuid::new_v4(), Uuid::new_v4(), qty(1))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn memory_repo_reviews_keep_book_stats_in_step() {
    let repo = InMemoryRepo::new();
    let b = book("Persuasion", 900);
    repo.upsert_book(b.clone()).await.unwrap();

    let five = repo.create_review(review(b.id, 5)).await.unwrap();
    let two = repo.create_review(review(b.id, 2)).await.unwrap();
    let stored = repo.get_book(b.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 2);
    assert!((stored.rating - 3.5).abs() < 1e-6);

    let mut revised = two.clone();
    revised.revise(ReviewDraft::new(4, "Better on reread").unwrap());
    let updated = repo.update_review(revised).await.unwrap().unwrap();
    assert_eq!(updated.review, "Better on reread");
    assert_eq!(updated.created_at, two.created_at);
    assert!((repo.get_book(b.id).await.unwrap().unwrap().rating - 4.5).abs() < 1e-6);

    assert!(repo.delete_review(b.id, five.id).await.unwrap());
    assert!(!repo.delete_review(b.id, five.id).await.unwrap());
    let stored = repo.get_book(b.id).await.unwrap().unwrap();
    assert_eq!((stored.rating, stored.review_count), (4.0, 1));

    assert!(repo.delete_review(b.id, two.id).await.unwrap());
    let stored = repo.get_book(b.id).await.unwrap().unwrap();
    assert_eq!((stored.rating, stored.review_count), (0.0, 0));
}

#[tokio::test]
async fn memory_repo_one_review_per_user_and_book() {
    let repo = InMemoryRepo::new();
    let b = book("Sanditon", 700);
    repo.upsert_book(b.clone()).await.unwrap();

    let first = repo.create_review(review(b.id, 3)).await.unwrap();
    let mut again = review(b.id, 5);
    again.user_id = first.user_id;
    assert!(matches!(
        repo.create_review(again).await,
        Err(RepoError::Conflict(_))
    ));
    assert_eq!(repo.list_reviews(b.id).await.unwrap(), vec![first.clone()]);

    // Same user, different book is fine.
    let other = book("Lady Susan", 500);
    repo.upsert_book(other.clone()).await.unwrap();
    let mut elsewhere = review(other.id, 4);
    elsewhere.user_id = first.user_id;
    repo.create_review(elsewhere).await.unwrap();

    assert!(repo
        .get_review(other.id, first.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn memory_repo_upsert_keeps_review_stats() {
    let repo = InMemoryRepo::new();
    let mut b = book("Mansfield Park", 1100);
    repo.upsert_book(b.clone()).await.unwrap();
    repo.create_review(review(b.id, 4)).await.unwrap();

    b.price_cents = 1300;
    let stored = repo.upsert_book(b).await.unwrap();
    assert_eq!(stored.price_cents, 1300);
    assert_eq!((stored.rating, stored.review_count), (4.0, 1));
}
