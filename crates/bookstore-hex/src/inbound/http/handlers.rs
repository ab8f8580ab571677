use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bookstore_types::api::{
    AddToCartRequest, CreateOrderRequest, Envelope, ReviewRequest, UpdateCartRequest,
    UpdateStatusRequest,
};
use bookstore_types::domain::book::{Book, BookDetails};
use bookstore_types::domain::cart::CartItem;
use bookstore_types::domain::order::Order;
use bookstore_types::domain::review::Review;
use bookstore_types::ports::Store;
use uuid::Uuid;

use super::auth::Authenticated;
use super::server::AppState;
use crate::errors::AppError;

type ApiResult<T> = Result<Json<Envelope<T>>, AppError>;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid {what} id: {raw}")))
}

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::success(data)))
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn list_books<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Vec<Book>> {
    ok(state.services.catalog.list_books().await?)
}

pub async fn get_book<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Book> {
    let id = parse_id(&id, "book")?;
    ok(state.services.catalog.get_book(id).await?)
}

pub async fn upsert_book<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<BookDetails>, JsonRejection>,
) -> ApiResult<Book> {
    let id = parse_id(&id, "book")?;
    let Json(details) = payload?;
    ok(state
        .services
        .catalog
        .upsert_book(&principal, id, details)
        .await?)
}

pub async fn list_reviews<S: Store>(
    State(state): State<AppState<S>>,
    Path(book_id): Path<String>,
) -> ApiResult<Vec<Review>> {
    let book_id = parse_id(&book_id, "book")?;
    ok(state.services.reviews.list_reviews(book_id).await?)
}

pub async fn create_review<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(book_id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Review>>), AppError> {
    let book_id = parse_id(&book_id, "book")?;
    let Json(req) = payload?;
    let review = state
        .services
        .reviews
        .create_review(principal.user_id, book_id, req.rating, &req.review)
        .await?;
    Ok((StatusCode::CREATED, Json(Envelope::success(review))))
}

pub async fn update_review<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path((book_id, review_id)): Path<(String, String)>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Review> {
    let book_id = parse_id(&book_id, "book")?;
    let review_id = parse_id(&review_id, "review")?;
    let Json(req) = payload?;
    ok(state
        .services
        .reviews
        .update_review(&principal, book_id, review_id, req.rating, &req.review)
        .await?)
}

pub async fn delete_review<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path((book_id, review_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let book_id = parse_id(&book_id, "book")?;
    let review_id = parse_id(&review_id, "review")?;
    state
        .services
        .reviews
        .delete_review(&principal, book_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_cart<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Vec<CartItem>> {
    ok(state.services.cart.get_cart(principal.user_id).await?)
}

pub async fn add_to_cart<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> ApiResult<Vec<CartItem>> {
    let Json(req) = payload?;
    ok(state
        .services
        .cart
        .add_item(principal.user_id, req.book_id, req.quantity)
        .await?)
}

pub async fn update_cart_item<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(line_id): Path<String>,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> ApiResult<Vec<CartItem>> {
    let line_id = parse_id(&line_id, "cart item")?;
    let Json(req) = payload?;
    ok(state
        .services
        .cart
        .update_item(principal.user_id, line_id, req.quantity)
        .await?)
}

pub async fn remove_cart_item<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(line_id): Path<String>,
) -> ApiResult<()> {
    let line_id = parse_id(&line_id, "cart item")?;
    state
        .services
        .cart
        .remove_item(principal.user_id, line_id)
        .await?;
    Ok(Json(Envelope::message("Item removed from cart successfully")))
}

pub async fn clear_cart<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<()> {
    state.services.cart.clear(principal.user_id).await?;
    Ok(Json(Envelope::message("Cart cleared")))
}

pub async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Order>>), AppError> {
    let Json(req) = payload?;
    let order = state
        .services
        .orders
        .create_order(principal.user_id, req.shipping_address, &req.payment_method)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;
    Ok((StatusCode::CREATED, Json(Envelope::success(order))))
}

pub async fn list_orders<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Vec<Order>> {
    ok(state.services.orders.get_orders(principal.user_id).await?)
}

pub async fn list_all_orders<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
) -> ApiResult<Vec<Order>> {
    ok(state.services.orders.list_all_orders(&principal).await?)
}

pub async fn get_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    let id = parse_id(&id, "order")?;
    ok(state.services.orders.get_order_by_id(&principal, id).await?)
}

pub async fn update_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Order> {
    let id = parse_id(&id, "order")?;
    let Json(req) = payload?;
    ok(state
        .services
        .orders
        .update_order_status(&principal, id, &req.status)
        .await?)
}

pub async fn not_found() -> AppError {
    AppError::NotFound("route not found".into())
}
