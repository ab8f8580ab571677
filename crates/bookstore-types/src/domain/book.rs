use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Catalog entry. Carts and orders reference books, they never own them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price_cents: i64,
    pub stock: u32,
    #[serde(default)]
    pub description: Option<String>,
    /// Mean review rating, written only by review mutations.
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
}

/// Writable fields of a book, as accepted by the catalog upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl Book {
    pub fn new(id: Uuid, details: BookDetails) -> Result<Self, ValidationError> {
        let title = details.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if details.price_cents < 0 {
            return Err(ValidationError::NegativePrice);
        }
        if let Some(d) = &details.description {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ValidationError::FieldTooLong {
                    field: "description",
                    max: MAX_DESCRIPTION_LEN,
                });
            }
        }
        Ok(Self {
            id,
            title,
            author: details.author,
            genre: details.genre,
            price_cents: details.price_cents,
            stock: details.stock,
            description: details.description,
            rating: 0.0,
            review_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(price_cents: i64) -> BookDetails {
        BookDetails {
            title: "  Dune ".into(),
            author: "Frank Herbert".into(),
            genre: "Science Fiction".into(),
            price_cents,
            stock: 3,
            description: None,
        }
    }

    #[test]
    fn new_book_trims_title() {
        let book = Book::new(Uuid::new_v4(), details(1299)).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.price_cents, 1299);
        assert_eq!(book.review_count, 0);
    }

    #[test]
    fn rejects_negative_price_and_blank_title() {
        assert_eq!(
            Book::new(Uuid::new_v4(), details(-1)),
            Err(ValidationError::NegativePrice)
        );
        let mut blank = details(100);
        blank.title = "   ".into();
        assert_eq!(
            Book::new(Uuid::new_v4(), blank),
            Err(ValidationError::MissingField("title"))
        );
    }
}
