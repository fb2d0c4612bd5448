use thiserror::Error;

/// Failures of invoice placement and the status update path.
///
/// Every variant aborts the enclosing transaction. None of them is retried here;
/// retry-on-conflict belongs to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Customer {0} not found")]
    CustomerNotFound(i32),

    #[error("Product with id {0} not found")]
    ProductNotFound(i32),

    #[error("Product {name} (id {id}) has no available stock")]
    InsufficientStock { id: i32, name: String },

    /// The assembled invoice broke an aggregate invariant; points at corrupt product data.
    #[error("Invalid invoice: {0}")]
    InvalidInvoice(String),

    #[error("Invoice {0} not found")]
    InvoiceNotFound(i32),

    /// Storage-layer abort: serialization failure, lock timeout, lost connection.
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl From<diesel::result::Error> for OrderError {
    fn from(e: diesel::result::Error) -> Self {
        OrderError::Transaction(e.to_string())
    }
}
