use bookstore_client::{ApiError, BookstoreClient};
use bookstore_hex::application::Services;
use bookstore_hex::config::Config;
use bookstore_hex::identity::StaticTokenIdentity;
use bookstore_hex::inbound::http::{HttpServer, HttpServerConfig};
use bookstore_repo::memory::InMemoryRepo;
use bookstore_types::api::CreateOrderRequest;
use bookstore_types::domain::book::BookDetails;
use bookstore_types::domain::order::{OrderStatus, ShippingAddress};
use bookstore_types::domain::user::Principal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn start_server() -> String {
    let port = find_free_port();
    let identity = StaticTokenIdentity::new([
        ("reader".to_string(), Principal::user(Uuid::new_v4())),
        ("clerk".to_string(), Principal::admin(Uuid::new_v4())),
    ]);
    let services = Services::new(InMemoryRepo::new(), &Config::default());
    let server = HttpServer::new(
        services,
        Arc::new(identity),
        HttpServerConfig::new(port.to_string()),
    )
    .await
    .unwrap();
    tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}/api/v1")
}

fn client(base: &str, token: &str) -> BookstoreClient {
    BookstoreClient::builder(base)
        .unwrap()
        .with_timeout(Duration::from_secs(5))
        .with_bearer_token(token)
        .unwrap()
        .build()
        .unwrap()
}

#[tokio::test]
async fn reader_buys_what_the_clerk_stocked() {
    let base = start_server().await;
    let clerk = client(&base, "clerk");
    let reader = client(&base, "reader");

    let book = clerk
        .upsert_book(
            Uuid::new_v4(),
            &BookDetails {
                title: "North and South".into(),
                author: "Elizabeth Gaskell".into(),
                genre: "Classic".into(),
                price_cents: 1450,
                stock: 4,
                description: Some("Milton, 1850s".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(reader.list_books().await.unwrap().len(), 1);
    assert_eq!(reader.get_book(book.id).await.unwrap().title, "North and South");

    let cart = reader.add_to_cart(book.id, 1).await.unwrap();
    let cart = reader.update_cart_item(cart[0].id, 2).await.unwrap();
    assert_eq!(cart[0].quantity, 2);

    let order = reader
        .create_order(&CreateOrderRequest {
            shipping_address: ShippingAddress {
                street: "3 Mill Lane".into(),
                city: "Manchester".into(),
                state: "NH".into(),
                zip_code: "03101".into(),
                country: "US".into(),
            },
            payment_method: "debit_card".into(),
        })
        .await
        .unwrap();
    assert_eq!(order.total_amount_cents, 2900);
    assert!(reader.get_cart().await.unwrap().is_empty());
    assert_eq!(reader.list_orders().await.unwrap().len(), 1);

    let err = reader
        .update_order_status(order.id, "Shipped")
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().map(|e| e.status), Some(403));

    let shipped = clerk.update_order_status(order.id, "Shipped").await.unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(reader.get_order(order.id).await.unwrap().status, OrderStatus::Shipped);
    assert_eq!(clerk.list_all_orders().await.unwrap().len(), 1);

    reader.add_to_cart(book.id, 3).await.unwrap();
    reader.clear_cart().await.unwrap();
    assert!(reader.get_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let base = start_server().await;
    let err = client(&base, "stranger").get_cart().await.unwrap_err();
    let api = err.downcast_ref::<ApiError>().expect("api error");
    assert_eq!(api.status, 401);
}

#[tokio::test]
async fn readers_review_and_the_book_rating_follows() {
    let base = start_server().await;
    let clerk = client(&base, "clerk");
    let reader = client(&base, "reader");

    let book = clerk
        .upsert_book(
            Uuid::new_v4(),
            &BookDetails {
                title: "Wives and Daughters".into(),
                author: "Elizabeth Gaskell".into(),
                genre: "Classic".into(),
                price_cents: 1300,
                stock: 2,
                description: None,
            },
        )
        .await
        .unwrap();

    let mine = reader.create_review(book.id, 4, "Unfinished, still great").await.unwrap();
    clerk.create_review(book.id, 2, "Too long").await.unwrap();
    let rated = reader.get_book(book.id).await.unwrap();
    assert_eq!((rated.rating, rated.review_count), (3.0, 2));

    let err = reader
        .create_review(book.id, 5, "Once more")
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().map(|e| e.status), Some(409));

    let err = clerk
        .update_review(book.id, mine.id, 1, "Edited by staff")
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().map(|e| e.status), Some(403));

    reader.delete_review(book.id, mine.id).await.unwrap();
    let left = reader.list_reviews(book.id).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(reader.get_book(book.id).await.unwrap().rating, 2.0);
}
