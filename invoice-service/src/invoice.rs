use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use shared::*;

use crate::reservation::Reservation;

/// An invoice that has passed aggregate validation but has no id yet.
///
/// Built once per placement, right before the single insert that persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    customer: Customer,
    products: Vec<Product>,
    total: BigDecimal,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
}

impl InvoiceDraft {
    pub fn assemble(
        customer: Customer,
        reservation: Reservation,
        status: Option<InvoiceStatus>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let Reservation { products, total } = reservation;

        if customer.is_deleted() {
            return Err(OrderError::CustomerNotFound(customer.id));
        }

        let mut expected = BigDecimal::zero();
        for product in &products {
            if product.price < BigDecimal::zero() {
                return Err(OrderError::InvalidInvoice(format!(
                    "product {} has negative price {}",
                    product.id, product.price
                )));
            }
            if product.stock < 0 {
                return Err(OrderError::InvalidInvoice(format!(
                    "product {} was reserved into negative stock {}",
                    product.id, product.stock
                )));
            }
            expected += &product.price;
        }

        if total != expected {
            return Err(OrderError::InvalidInvoice(format!(
                "total {} does not match product prices {}",
                total, expected
            )));
        }

        Ok(Self {
            customer,
            products,
            total,
            status: status.unwrap_or_default(),
            created_at,
        })
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn total(&self) -> &BigDecimal {
        &self.total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_invoice(self, id: i32) -> Invoice {
        Invoice {
            id,
            customer: self.customer,
            products: self.products,
            total: self.total,
            status: self.status,
            created_at: self.created_at,
        }
    }
}
