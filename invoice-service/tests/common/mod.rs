#![allow(dead_code)]

use bigdecimal::BigDecimal;
use invoice_service::{InvoiceService, MemoryGateway};
use shared::*;
use std::sync::Arc;
use std::time::Duration;

pub fn customer(id: i32) -> Customer {
    Customer {
        id,
        fullname: format!("Customer {}", id),
        email: format!("customer{}@example.com", id),
        phone: "555-0100".to_string(),
        deleted_at: None,
    }
}

pub fn product(id: i32, name: &str, price: i64, stock: i32) -> Product {
    Product::new(id, name, BigDecimal::from(price), stock)
}

/// Store seeded with customer 1 and the given products.
pub async fn seeded(products: Vec<Product>) -> Arc<MemoryGateway> {
    seeded_with(MemoryGateway::new(), products).await
}

/// Same as [`seeded`] but every row operation takes `latency`.
pub async fn seeded_slow(products: Vec<Product>, latency: Duration) -> Arc<MemoryGateway> {
    seeded_with(MemoryGateway::new().with_latency(latency), products).await
}

async fn seeded_with(gateway: MemoryGateway, products: Vec<Product>) -> Arc<MemoryGateway> {
    gateway.insert_customer(customer(1)).await;
    for product in products {
        gateway.insert_product(product).await;
    }
    Arc::new(gateway)
}

pub fn service(gateway: &Arc<MemoryGateway>) -> InvoiceService<MemoryGateway> {
    InvoiceService::new(Arc::clone(gateway))
}

pub async fn stock(gateway: &MemoryGateway, id: i32) -> i32 {
    gateway.product(id).await.map(|p| p.stock).unwrap_or(-1)
}
