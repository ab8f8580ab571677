///  To run :
///  cargo r --example client_example
use std::sync::Arc;

use bookstore_client::{ApiError, BookstoreClient};
use bookstore_hex::application::Services;
use bookstore_hex::config::Config;
use bookstore_hex::identity::StaticTokenIdentity;
use bookstore_hex::inbound::http::{HttpServer, HttpServerConfig};
use bookstore_repo::build_repo;
use bookstore_types::api::CreateOrderRequest;
use bookstore_types::domain::book::BookDetails;
use bookstore_types::domain::order::ShippingAddress;
use bookstore_types::domain::user::Principal;
use tempfile::tempdir;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/api/v1");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("bookstore.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let config = Config {
        server_port: port.to_string(),
        auth_tokens: vec![
            ("demo-user".into(), Principal::user(Uuid::new_v4())),
            ("demo-admin".into(), Principal::admin(Uuid::new_v4())),
        ],
        ..Config::default()
    };
    let repo = build_repo(Some(&db_url)).await?;
    let server = HttpServer::new(
        Services::new(repo, &config),
        Arc::new(StaticTokenIdentity::from_config(&config)),
        HttpServerConfig::from(&config),
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let admin = BookstoreClient::builder(&addr)?
        .with_bearer_token("demo-admin")?
        .build()?;
    let user = BookstoreClient::builder(&addr)?
        .with_bearer_token("demo-user")?
        .build()?;

    let book = admin
        .upsert_book(
            Uuid::new_v4(),
            &BookDetails {
                title: "Cranford".into(),
                author: "Elizabeth Gaskell".into(),
                genre: "Classic".into(),
                price_cents: 1099,
                stock: 10,
                description: None,
            },
        )
        .await?;
    println!("Stocked {} at {} cents", book.title, book.price_cents);

    user.add_to_cart(book.id, 2).await?;
    let cart = user.add_to_cart(book.id, 1).await?;
    println!("Cart has {} line(s), quantity {}", cart.len(), cart[0].quantity);

    let order = user
        .create_order(&CreateOrderRequest {
            shipping_address: ShippingAddress {
                street: "12 High St".into(),
                city: "Knutsford".into(),
                state: "CA".into(),
                zip_code: "90210".into(),
                country: "US".into(),
            },
            payment_method: "credit_card".into(),
        })
        .await?;
    println!(
        "Placed order id={} total={} status={}",
        order.id, order.total_amount_cents, order.status
    );

    // The cart is empty now, so a second order is refused.
    match user
        .create_order(&CreateOrderRequest {
            shipping_address: order.shipping_address.clone(),
            payment_method: "paypal".into(),
        })
        .await
    {
        Ok(o) => anyhow::bail!("unexpected second order {}", o.id),
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => println!("Second order refused: {} {}", api.status, api.message),
            None => return Err(err),
        },
    }

    let delivered = admin.update_order_status(order.id, "Delivered").await?;
    println!("Admin moved order to {}", delivered.status);

    user.create_review(book.id, 5, "A quiet delight").await?;
    let rated = user.get_book(book.id).await?;
    println!(
        "{} is rated {:.1} from {} review(s)",
        rated.title, rated.rating, rated.review_count
    );

    handle.abort();
    Ok(())
}
