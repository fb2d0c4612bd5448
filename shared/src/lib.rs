use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod error;

pub use error::OrderError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

/// A committed invoice together with the customer and the products it reserved.
///
/// `products` keeps reservation order and holds one entry per unit ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i32,
    pub customer: Customer,
    pub products: Vec<Product>,
    pub total: BigDecimal,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// Input to invoice placement. Duplicate product ids each demand one more unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub customer_id: i32,
    pub product_ids: Vec<i32>,
    pub status: Option<InvoiceStatus>,
}

impl Customer {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Product {
    pub fn new(id: i32, name: impl Into<String>, price: BigDecimal, stock: i32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            other => Err(format!("unknown invoice status: {}", other)),
        }
    }
}

impl PlaceOrder {
    pub fn new(customer_id: i32, product_ids: Vec<i32>) -> Self {
        Self {
            customer_id,
            product_ids,
            status: None,
        }
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Pending);
        assert_eq!(InvoiceStatus::default().to_string(), "PENDING");
    }

    #[test]
    fn status_parses_stored_text() {
        for status in [InvoiceStatus::Pending, InvoiceStatus::Paid, InvoiceStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
        assert!("pending".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn status_serializes_screaming_case() {
        let json = serde_json::to_string(&InvoiceStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        let parsed: InvoiceStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(parsed, InvoiceStatus::Paid);
    }

    #[test]
    fn product_without_stock_is_not_reservable() {
        let product = Product::new(5, "Lamp", BigDecimal::from(100), 0);
        assert!(!product.in_stock());
        assert!(Product { stock: 1, ..product }.in_stock());
    }
}
