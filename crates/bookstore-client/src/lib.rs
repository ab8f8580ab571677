//! Typed HTTP client for the bookstore API.
//!
//! Every call unwraps the `{status, data | message}` envelope. Non-2xx answers
//! come back as an [`ApiError`] inside the `anyhow::Error`.

use std::time::Duration;

use anyhow::Context;
use bookstore_types::api::{
    AddToCartRequest, CreateOrderRequest, Envelope, ReviewRequest, UpdateCartRequest,
    UpdateStatusRequest,
};
use bookstore_types::domain::book::{Book, BookDetails};
use bookstore_types::domain::cart::CartItem;
use bookstore_types::domain::order::Order;
use bookstore_types::domain::review::Review;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

/// A non-success answer from the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("api error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

#[derive(Clone)]
pub struct BookstoreClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct BookstoreClient {
    base: Url,
    client: reqwest::Client,
}

impl BookstoreClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    /// `base_url` is the API root, e.g. `http://localhost:3000/api/v1`.
    pub fn builder(base_url: &str) -> anyhow::Result<BookstoreClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(BookstoreClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let res = self.client.get(self.url("books")?).send().await?;
        data(res).await
    }

    pub async fn get_book(&self, id: Uuid) -> anyhow::Result<Book> {
        let res = self
            .client
            .get(self.url(&format!("books/{id}"))?)
            .send()
            .await?;
        data(res).await
    }

    /// Admin only.
    pub async fn upsert_book(&self, id: Uuid, details: &BookDetails) -> anyhow::Result<Book> {
        let res = self
            .client
            .put(self.url(&format!("books/{id}"))?)
            .json(details)
            .send()
            .await?;
        data(res).await
    }

    pub async fn list_reviews(&self, book_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let res = self
            .client
            .get(self.url(&format!("books/{book_id}/reviews"))?)
            .send()
            .await?;
        data(res).await
    }

    pub async fn create_review(
        &self,
        book_id: Uuid,
        rating: i64,
        review: &str,
    ) -> anyhow::Result<Review> {
        let res = self
            .client
            .post(self.url(&format!("books/{book_id}/reviews"))?)
            .json(&ReviewRequest {
                rating,
                review: review.to_string(),
            })
            .send()
            .await?;
        data(res).await
    }

    pub async fn update_review(
        &self,
        book_id: Uuid,
        review_id: Uuid,
        rating: i64,
        review: &str,
    ) -> anyhow::Result<Review> {
        let res = self
            .client
            .patch(self.url(&format!("books/{book_id}/reviews/{review_id}"))?)
            .json(&ReviewRequest {
                rating,
                review: review.to_string(),
            })
            .send()
            .await?;
        data(res).await
    }

    pub async fn delete_review(&self, book_id: Uuid, review_id: Uuid) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url(&format!("books/{book_id}/reviews/{review_id}"))?)
            .send()
            .await?;
        no_content(res).await
    }

    pub async fn get_cart(&self) -> anyhow::Result<Vec<CartItem>> {
        let res = self.client.get(self.url("cart")?).send().await?;
        data(res).await
    }

    pub async fn add_to_cart(&self, book_id: Uuid, quantity: i64) -> anyhow::Result<Vec<CartItem>> {
        let res = self
            .client
            .post(self.url("cart")?)
            .json(&AddToCartRequest { book_id, quantity })
            .send()
            .await?;
        data(res).await
    }

    pub async fn update_cart_item(
        &self,
        line_id: Uuid,
        quantity: i64,
    ) -> anyhow::Result<Vec<CartItem>> {
        let res = self
            .client
            .put(self.url(&format!("cart/{line_id}"))?)
            .json(&UpdateCartRequest { quantity })
            .send()
            .await?;
        data(res).await
    }

    pub async fn remove_cart_item(&self, line_id: Uuid) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url(&format!("cart/{line_id}"))?)
            .send()
            .await?;
        acknowledged(res).await
    }

    pub async fn clear_cart(&self) -> anyhow::Result<()> {
        let res = self.client.delete(self.url("cart")?).send().await?;
        acknowledged(res).await
    }

    pub async fn create_order(&self, req: &CreateOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("orders")?)
            .json(req)
            .send()
            .await?;
        data(res).await
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self.client.get(self.url("orders")?).send().await?;
        data(res).await
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?;
        data(res).await
    }

    pub async fn update_order_status(&self, id: Uuid, status: &str) -> anyhow::Result<Order> {
        let res = self
            .client
            .put(self.url(&format!("orders/{id}"))?)
            .json(&UpdateStatusRequest {
                status: status.to_string(),
            })
            .send()
            .await?;
        data(res).await
    }

    /// Admin only.
    pub async fn list_all_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self.client.get(self.url("admin/orders")?).send().await?;
        data(res).await
    }
}

async fn api_error(res: Response) -> anyhow::Error {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);
    tracing::debug!(status, %message, "api call failed");
    ApiError { status, message }.into()
}

async fn envelope<T: DeserializeOwned>(res: Response) -> anyhow::Result<Envelope<T>> {
    if !res.status().is_success() {
        return Err(api_error(res).await);
    }
    res.json().await.context("failed to decode response envelope")
}

async fn data<T: DeserializeOwned>(res: Response) -> anyhow::Result<T> {
    envelope::<T>(res)
        .await?
        .data
        .context("response envelope carried no data")
}

async fn acknowledged(res: Response) -> anyhow::Result<()> {
    envelope::<serde_json::Value>(res).await.map(|_| ())
}

// 204 answers carry no envelope.
async fn no_content(res: Response) -> anyhow::Result<()> {
    if !res.status().is_success() {
        return Err(api_error(res).await);
    }
    Ok(())
}

impl BookstoreClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn with_bearer_token(mut self, token: impl AsRef<str>) -> anyhow::Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
            .context("invalid bearer token")?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Uses a preconfigured client as is; headers and timeout set on this
    /// builder are ignored.
    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<BookstoreClient> {
        if let Some(client) = self.client {
            return Ok(BookstoreClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(BookstoreClient {
            base: self.base,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_types::domain::order::{PaymentMethod, ShippingAddress};
    use httpmock::prelude::*;
    use serde_json::json;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "5 Elm St".into(),
            city: "Portland".into(),
            state: "OR".into(),
            zip_code: "97201".into(),
            country: "US".into(),
        }
    }

    fn sample_book() -> Book {
        Book::new(
            Uuid::new_v4(),
            BookDetails {
                title: "Emma".into(),
                author: "Jane Austen".into(),
                genre: "Classic".into(),
                price_cents: 1250,
                stock: 3,
                description: None,
            },
        )
        .unwrap()
    }

    fn sample_order() -> Order {
        let item = CartItem {
            id: Uuid::new_v4(),
            book: sample_book(),
            quantity: 2,
        };
        Order::place(Uuid::new_v4(), &[item], address(), PaymentMethod::Paypal).unwrap()
    }

    fn client(server: &MockServer) -> BookstoreClient {
        BookstoreClient::builder(&server.url("/api"))
            .unwrap()
            .with_bearer_token("tok")
            .unwrap()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn add_to_cart_sends_token_and_unwraps_data() {
        let server = MockServer::start();
        let book = sample_book();
        let line = CartItem {
            id: Uuid::new_v4(),
            book: book.clone(),
            quantity: 2,
        };

        let add_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/cart")
                .header("authorization", "Bearer tok")
                .json_body_obj(&AddToCartRequest {
                    book_id: book.id,
                    quantity: 2,
                });
            then.status(200)
                .json_body_obj(&Envelope::success(vec![line.clone()]));
        });

        let cart = client(&server).add_to_cart(book.id, 2).await.unwrap();
        assert_eq!(cart, vec![line]);
        add_mock.assert();
    }

    #[tokio::test]
    async fn create_get_and_update_order() {
        let server = MockServer::start();
        let order = sample_order();
        let req = CreateOrderRequest {
            shipping_address: address(),
            payment_method: "paypal".into(),
        };

        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/api/orders").json_body_obj(&req);
            then.status(201).json_body_obj(&Envelope::success(order.clone()));
        });
        let get_mock = server.mock(|when, then| {
            when.method(GET).path(format!("/api/orders/{}", order.id));
            then.status(200).json_body_obj(&Envelope::success(order.clone()));
        });
        let update_mock = server.mock(|when, then| {
            when.method(httpmock::Method::PUT)
                .path(format!("/api/orders/{}", order.id))
                .json_body(json!({ "status": "Shipped" }));
            let mut updated = order.clone();
            updated.status = bookstore_types::domain::order::OrderStatus::Shipped;
            then.status(200).json_body_obj(&Envelope::success(updated));
        });

        let client = client(&server);
        let created = client.create_order(&req).await.unwrap();
        assert_eq!(created.total_amount_cents, 2500);

        let fetched = client.get_order(order.id).await.unwrap();
        assert_eq!(fetched.id, order.id);

        let updated = client
            .update_order_status(order.id, "Shipped")
            .await
            .unwrap();
        assert_eq!(updated.status.as_str(), "Shipped");

        create_mock.assert();
        get_mock.assert();
        update_mock.assert();
    }

    #[tokio::test]
    async fn failures_surface_the_envelope_message() {
        let server = MockServer::start();
        let empty = server.mock(|when, then| {
            when.method(POST).path("/api/orders");
            then.status(400)
                .json_body(json!({ "status": "fail", "message": "Cart is empty" }));
        });
        let removed = server.mock(|when, then| {
            when.method(DELETE).path_contains("/api/cart/");
            then.status(200).json_body(json!({
                "status": "success",
                "message": "Item removed from cart successfully"
            }));
        });

        let client = client(&server);
        let err = client
            .create_order(&CreateOrderRequest::default())
            .await
            .unwrap_err();
        let api = err.downcast_ref::<ApiError>().expect("api error");
        assert_eq!(api.status, 400);
        assert_eq!(api.message, "Cart is empty");
        assert_eq!(err.to_string(), "api error 400: Cart is empty");

        client.remove_cart_item(Uuid::new_v4()).await.unwrap();

        empty.assert();
        removed.assert();
    }

    #[tokio::test]
    async fn review_calls_hit_the_nested_routes() {
        let server = MockServer::start();
        let book = sample_book();
        let review = Review::new(
            book.id,
            Uuid::new_v4(),
            bookstore_types::domain::review::ReviewDraft::new(4, "Sharp").unwrap(),
        );

        let create = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/api/books/{}/reviews", book.id))
                .json_body(json!({ "rating": 4, "review": "Sharp" }));
            then.status(201).json_body_obj(&Envelope::success(review.clone()));
        });
        let update = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path(format!("/api/books/{}/reviews/{}", book.id, review.id))
                .json_body(json!({ "rating": 3, "review": "Sharp, mostly" }));
            then.status(200).json_body_obj(&Envelope::success(review.clone()));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/api/books/{}/reviews/{}", book.id, review.id));
            then.status(204);
        });
        let forbidden = server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/api/books/{}/reviews/{}", book.id, book.id));
            then.status(403).json_body(json!({
                "status": "fail",
                "message": "You can only modify your own reviews"
            }));
        });

        let client = client(&server);
        let created = client.create_review(book.id, 4, "Sharp").await.unwrap();
        assert_eq!(created, review);
        client
            .update_review(book.id, review.id, 3, "Sharp, mostly")
            .await
            .unwrap();
        client.delete_review(book.id, review.id).await.unwrap();

        let err = client.delete_review(book.id, book.id).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ApiError>(),
            Some(&ApiError {
                status: 403,
                message: "You can only modify your own reviews".into()
            })
        );

        create.assert();
        update.assert();
        delete.assert();
        forbidden.assert();
    }

    #[test]
    fn base_url_keeps_its_path() {
        let client = BookstoreClient::new("http://localhost:3000/api/v1").unwrap();
        assert_eq!(
            client.url("cart").unwrap().as_str(),
            "http://localhost:3000/api/v1/cart"
        );
    }
}
