//! Invoice placement: customer validation, ordered stock reservation and invoice
//! persistence in a single database transaction.

pub mod api;
pub mod config;
pub mod invoice;
pub mod models;
pub mod placement;
pub mod reservation;
pub mod schema;
pub mod store;

pub use placement::InvoiceService;
pub use store::{Gateway, MemoryGateway, PgGateway, StoreTx};
