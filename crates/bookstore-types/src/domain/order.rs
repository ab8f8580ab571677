use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;

use super::cart::CartItem;
use super::ValidationError;

static ZIP_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip code pattern compiles"));

/// Order status. Any value may be set from any other; no progression is enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Placed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Placed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Placed => "Placed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method label. No gateway is involved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(ValidationError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Trims every field and checks presence, length limits and the zip pattern.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let street = required("street", &self.street, 100)?;
        let city = required("city", &self.city, 50)?;
        let state = required("state", &self.state, 50)?;
        let zip_code = required("zipCode", &self.zip_code, 10)
            .map_err(|e| match e {
                ValidationError::FieldTooLong { .. } => ValidationError::InvalidZipCode,
                other => other,
            })?;
        if !ZIP_CODE.is_match(&zip_code) {
            return Err(ValidationError::InvalidZipCode);
        }
        let country = required("country", &self.country, 50)?;
        Ok(Self {
            street,
            city,
            state,
            zip_code,
            country,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if v.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(v.to_string())
}

/// Purchased line. Title, author and unit price are copied at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderLine {
    /// `None` when the product does not fit in `i64` cents.
    pub fn line_total_cents(&self) -> Option<i64> {
        self.unit_price_cents.checked_mul(i64::from(self.quantity))
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            book_id: item.book.id,
            title: item.book.title.clone(),
            author: item.book.author.clone(),
            quantity: item.quantity,
            unit_price_cents: item.book.price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total_amount_cents: i64,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Snapshots resolved cart items into a new order in the `Placed` state.
    ///
    /// The total is fixed here and never recomputed.
    pub fn place(
        user_id: Uuid,
        items: &[CartItem],
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let shipping_address = shipping_address.validated()?;
        let lines: Vec<OrderLine> = items.iter().map(OrderLine::from).collect();
        let total = lines
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(line.line_total_cents()?))
            .ok_or(ValidationError::AmountOverflow)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items: lines,
            total_amount_cents: total,
            shipping_address,
            payment_method,
            status: OrderStatus::Placed,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
