use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::book::Book;
use super::ValidationError;

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 99;

/// Per-call quantity accepted by cart mutations.
///
/// Only the amount carried by a single request is bounded; merging repeated
/// adds of the same book may push a line above [`MAX_QUANTITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&raw) {
            return Err(ValidationError::QuantityOutOfRange(raw));
        }
        Ok(Self(raw as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// One stored cart row. At most one line exists per (user, book).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(user_id: Uuid, book_id: Uuid, quantity: Quantity) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            quantity: quantity.get(),
            added_at: Utc::now(),
        }
    }
}

/// Cart line with its book resolved from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub book: Book,
    pub quantity: u32,
}
