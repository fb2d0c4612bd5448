//! Transactional access to customers, products and invoices.
//!
//! [`Gateway::in_transaction`] is the only way to obtain a [`StoreTx`]. The
//! transaction lives exactly as long as the closure's future: it commits when the
//! future resolves to `Ok`, and rolls back on `Err` or when the future is dropped
//! early. Row locks taken through the handle are released at that point and not
//! before.

use async_trait::async_trait;
use futures::future::BoxFuture;
use shared::*;

use crate::invoice::InvoiceDraft;

pub mod memory;
pub mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

/// Future returned by a unit of work running inside a transaction.
pub type TxFuture<'t, T> = BoxFuture<'t, Result<T, OrderError>>;

#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    async fn in_transaction<T, F>(&self, work: F) -> Result<T, OrderError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> TxFuture<'t, T> + Send + 'static;
}

/// Operations available to a unit of work while its transaction is open.
#[async_trait]
pub trait StoreTx: Send {
    /// Reads a live (not soft-deleted) customer under a shared row lock.
    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, OrderError>;

    /// Reads a product under an exclusive row lock held until the transaction ends.
    ///
    /// Locking a row this transaction already holds returns immediately with the
    /// row's current, already written-through state.
    async fn lock_product(&mut self, id: i32) -> Result<Option<Product>, OrderError>;

    /// Writes the product's stock through to the locked row.
    async fn save_product(&mut self, product: &Product) -> Result<(), OrderError>;

    /// Inserts the invoice and its product lines, returning the generated id.
    async fn insert_invoice(&mut self, draft: &InvoiceDraft) -> Result<i32, OrderError>;

    /// Returns `false` when no invoice has the given id.
    async fn set_invoice_status(&mut self, id: i32, status: InvoiceStatus) -> Result<bool, OrderError>;
}
