use async_trait::async_trait;
use bookstore_types::domain::book::Book;
use bookstore_types::domain::cart::{CartLine, Quantity};
use bookstore_types::domain::order::{Order, OrderLine, OrderStatus, PaymentMethod, ShippingAddress};
use bookstore_types::domain::review::Review;
use bookstore_types::ports::cart_repository::CartRepository;
use bookstore_types::ports::catalog::CatalogRepository;
use bookstore_types::ports::order_repository::{OrderRepository, OrderScope};
use bookstore_types::ports::review_repository::ReviewRepository;
use bookstore_types::ports::RepoError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, items_json, total_amount_cents, shipping_json, \
                             payment_method, status, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, book_id, user_id, rating, review, created_at, updated_at";

const MIGRATIONS: [&str; 2] = [
    include_str!("../migrations/0001_init.sql"),
    include_str!("../migrations/0002_reviews.sql"),
];

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> RepoError {
    match e.as_database_error() {
        Some(d) if d.is_unique_violation() => RepoError::Conflict(d.message().to_string()),
        _ => RepoError::DbError(e.to_string()),
    }
}

fn decode_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

// Fixed-width timestamps keep lexicographic order equal to time order.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(decode_err)?
        .with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(decode_err)
}

#[derive(FromRow)]
struct DbBook {
    id: String,
    title: String,
    author: String,
    genre: String,
    price_cents: i64,
    stock: i64,
    description: Option<String>,
    rating: f64,
    review_count: i64,
}

impl DbBook {
    fn into_book(self) -> Result<Book, RepoError> {
        Ok(Book {
            id: parse_id(&self.id)?,
            title: self.title,
            author: self.author,
            genre: self.genre,
            price_cents: self.price_cents,
            stock: u32::try_from(self.stock).map_err(decode_err)?,
            description: self.description,
            rating: self.rating as f32,
            review_count: u32::try_from(self.review_count).map_err(decode_err)?,
        })
    }
}

#[derive(FromRow)]
struct DbCartLine {
    id: String,
    user_id: String,
    book_id: String,
    quantity: i64,
    added_at: String,
}

impl DbCartLine {
    fn into_line(self) -> Result<CartLine, RepoError> {
        Ok(CartLine {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            book_id: parse_id(&self.book_id)?,
            quantity: u32::try_from(self.quantity).map_err(decode_err)?,
            added_at: parse_ts(&self.added_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    total_amount_cents: i64,
    shipping_json: String,
    payment_method: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let items: Vec<OrderLine> = serde_json::from_str(&self.items_json).map_err(decode_err)?;
        let shipping_address: ShippingAddress =
            serde_json::from_str(&self.shipping_json).map_err(decode_err)?;
        Ok(Order {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            items,
            total_amount_cents: self.total_amount_cents,
            shipping_address,
            payment_method: PaymentMethod::from_str(&self.payment_method).map_err(decode_err)?,
            status: OrderStatus::from_str(&self.status).map_err(decode_err)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbReview {
    id: String,
    book_id: String,
    user_id: String,
    rating: i64,
    review: String,
    created_at: String,
    updated_at: String,
}

impl DbReview {
    fn into_review(self) -> Result<Review, RepoError> {
        Ok(Review {
            id: parse_id(&self.id)?,
            book_id: parse_id(&self.book_id)?,
            user_id: parse_id(&self.user_id)?,
            rating: u8::try_from(self.rating).map_err(decode_err)?,
            review: self.review,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

// Runs inside the mutating transaction so the book never shows stale stats.
async fn refresh_review_stats(
    conn: &mut SqliteConnection,
    book_id: Uuid,
) -> Result<(), RepoError> {
    let id = book_id.to_string();
    sqlx::query(
        "UPDATE books SET
            rating = COALESCE((SELECT AVG(rating) FROM reviews WHERE book_id = ?), 0),
            review_count = (SELECT COUNT(*) FROM reviews WHERE book_id = ?)
         WHERE id = ?",
    )
    .bind(&id)
    .bind(&id)
    .bind(&id)
    .execute(conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            for stmt in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                sqlx::query(stmt).execute(&pool).await?;
            }
        }

        Ok(Self { pool })
    }

    async fn fetch_order(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = match scope {
            OrderScope::Any => {
                sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await
            }
            OrderScope::Owner(user_id) => {
                sqlx::query_as(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?"
                ))
                .bind(id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepo {
    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, RepoError> {
        let row: Option<DbBook> = sqlx::query_as(
            "SELECT id, title, author, genre, price_cents, stock, description, rating, review_count
             FROM books WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbBook::into_book).transpose()
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepoError> {
        let rows: Vec<DbBook> = sqlx::query_as(
            "SELECT id, title, author, genre, price_cents, stock, description, rating, review_count
             FROM books ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbBook::into_book).collect()
    }

    async fn upsert_book(&self, book: Book) -> Result<Book, RepoError> {
        sqlx::query(
            "INSERT INTO books (id, title, author, genre, price_cents, stock, description, rating, review_count)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                genre = excluded.genre,
                price_cents = excluded.price_cents,
                stock = excluded.stock,
                description = excluded.description",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.price_cents)
        .bind(i64::from(book.stock))
        .bind(&book.description)
        .bind(f64::from(book.rating))
        .bind(i64::from(book.review_count))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        self.get_book(book.id)
            .await?
            .ok_or_else(|| RepoError::DbError(format!("book {} vanished after upsert", book.id)))
    }
}

#[async_trait]
impl CartRepository for SqliteRepo {
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, RepoError> {
        let rows: Vec<DbCartLine> = sqlx::query_as(
            "SELECT id, user_id, book_id, quantity, added_at FROM cart_lines
             WHERE user_id = ? ORDER BY added_at, rowid",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbCartLine::into_line).collect()
    }

    async fn add_or_increment(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartLine, RepoError> {
        let fresh = CartLine::new(user_id, book_id, quantity);
        let row: DbCartLine = sqlx::query_as(
            "INSERT INTO cart_lines (id, user_id, book_id, quantity, added_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, book_id)
             DO UPDATE SET quantity = cart_lines.quantity + excluded.quantity
             RETURNING id, user_id, book_id, quantity, added_at",
        )
        .bind(fresh.id.to_string())
        .bind(user_id.to_string())
        .bind(book_id.to_string())
        .bind(i64::from(quantity.get()))
        .bind(ts(fresh.added_at))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.into_line()
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: Quantity,
    ) -> Result<Option<CartLine>, RepoError> {
        let row: Option<DbCartLine> = sqlx::query_as(
            "UPDATE cart_lines SET quantity = ? WHERE id = ? AND user_id = ?
             RETURNING id, user_id, book_id, quantity, added_at",
        )
        .bind(i64::from(quantity.get()))
        .bind(line_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbCartLine::into_line).transpose()
    }

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM cart_lines WHERE id = ? AND user_id = ?")
            .bind(line_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let res = sqlx::query("DELETE FROM cart_lines WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(decode_err)?;
        let shipping_json = serde_json::to_string(&order.shipping_address).map_err(decode_err)?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(items_json)
        .bind(order.total_amount_cents)
        .bind(shipping_json)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(ts(order.created_at))
        .bind(ts(order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: Uuid, scope: OrderScope) -> Result<Option<Order>, RepoError> {
        self.fetch_order(id, scope).await
    }

    async fn list(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = match scope {
            OrderScope::Any => {
                sqlx::query_as(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            OrderScope::Owner(user_id) => {
                sqlx::query_as(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
                ))
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.into_iter()
            .map(DbOrder::into_order)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_status(
        &self,
        id: Uuid,
        scope: OrderScope,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let now = ts(Utc::now());
        let updated = match scope {
            OrderScope::Any => {
                sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
                    .bind(status.as_str())
                    .bind(now)
                    .bind(id.to_string())
                    .execute(&self.pool)
                    .await
            }
            OrderScope::Owner(user_id) => {
                sqlx::query(
                    "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND user_id = ?",
                )
                .bind(status.as_str())
                .bind(now)
                .bind(id.to_string())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_order(id, scope).await
    }
}

#[async_trait]
impl ReviewRepository for SqliteRepo {
    async fn list_reviews(&self, book_id: Uuid) -> Result<Vec<Review>, RepoError> {
        let rows: Vec<DbReview> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = ? ORDER BY created_at, rowid"
        ))
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbReview::into_review).collect()
    }

    async fn get_review(
        &self,
        book_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepoError> {
        let row: Option<DbReview> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ? AND book_id = ?"
        ))
        .bind(review_id.to_string())
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbReview::into_review).transpose()
    }

    async fn create_review(&self, review: Review) -> Result<Review, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(&format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(review.id.to_string())
        .bind(review.book_id.to_string())
        .bind(review.user_id.to_string())
        .bind(i64::from(review.rating))
        .bind(&review.review)
        .bind(ts(review.created_at))
        .bind(ts(review.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        refresh_review_stats(&mut *tx, review.book_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(review)
    }

    async fn update_review(&self, review: Review) -> Result<Option<Review>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row: Option<DbReview> = sqlx::query_as(&format!(
            "UPDATE reviews SET rating = ?, review = ?, updated_at = ?
             WHERE id = ? AND book_id = ?
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(i64::from(review.rating))
        .bind(&review.review)
        .bind(ts(review.updated_at))
        .bind(review.id.to_string())
        .bind(review.book_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };
        refresh_review_stats(&mut *tx, review.book_id).await?;
        tx.commit().await.map_err(db_err)?;
        row.into_review().map(Some)
    }

    async fn delete_review(&self, book_id: Uuid, review_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let res = sqlx::query("DELETE FROM reviews WHERE id = ? AND book_id = ?")
            .bind(review_id.to_string())
            .bind(book_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Ok(false);
        }
        refresh_review_stats(&mut *tx, book_id).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }
}
