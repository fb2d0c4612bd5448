use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::customers)]
pub struct DbCustomer {
    pub id: i32,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct DbProduct {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::invoices)]
pub struct NewInvoice {
    pub customer_id: i32,
    pub total: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::invoice_products)]
pub struct NewInvoiceLine {
    pub invoice_id: i32,
    pub position: i32,
    pub product_id: i32,
}

impl From<DbCustomer> for Customer {
    fn from(row: DbCustomer) -> Self {
        Self {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            phone: row.phone,
            deleted_at: row.deleted_at,
        }
    }
}

impl From<DbProduct> for Product {
    fn from(row: DbProduct) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            stock: row.stock,
        }
    }
}
