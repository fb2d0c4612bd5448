use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::*;
use std::time::Duration;
use tracing::debug;

use super::{Gateway, StoreTx, TxFuture};
use crate::invoice::InvoiceDraft;
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

/// PostgreSQL gateway: one pooled connection per transaction, row locks via
/// `SELECT ... FOR UPDATE` / `FOR SHARE`.
#[derive(Clone)]
pub struct PgGateway {
    pool: DbPool,
    lock_timeout: Option<Duration>,
}

impl PgGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, lock_timeout: None }
    }

    /// Bounds how long any single row-lock wait may block before the transaction
    /// aborts with [`OrderError::Transaction`].
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = Some(lock_timeout);
        self
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn in_transaction<T, F>(&self, work: F) -> Result<T, OrderError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> TxFuture<'t, T> + Send + 'static,
    {
        let mut pooled = self
            .pool
            .get()
            .await
            .map_err(|e| OrderError::Transaction(format!("connection pool: {}", e)))?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let lock_timeout = self.lock_timeout;

        conn.transaction::<_, OrderError, _>(|conn| {
            Box::pin(async move {
                if let Some(timeout) = lock_timeout {
                    diesel::sql_query(format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis()))
                        .execute(conn)
                        .await?;
                }

                let mut tx = PgTx { conn };
                work(&mut tx).await
            })
        })
        .await
    }
}

struct PgTx<'c> {
    conn: &'c mut AsyncPgConnection,
}

#[async_trait]
impl StoreTx for PgTx<'_> {
    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, OrderError> {
        let customer = customers::table
            .filter(customers::id.eq(id))
            .filter(customers::deleted_at.is_null())
            .select(DbCustomer::as_select())
            .for_share()
            .get_result::<DbCustomer>(&mut *self.conn)
            .await
            .optional()?;

        Ok(customer.map(Customer::from))
    }

    async fn lock_product(&mut self, id: i32) -> Result<Option<Product>, OrderError> {
        debug!(product_id = id, "Locking product row");
        let product = products::table
            .filter(products::id.eq(id))
            .select(DbProduct::as_select())
            .for_update()
            .get_result::<DbProduct>(&mut *self.conn)
            .await
            .optional()?;

        Ok(product.map(Product::from))
    }

    async fn save_product(&mut self, product: &Product) -> Result<(), OrderError> {
        diesel::update(products::table.filter(products::id.eq(product.id)))
            .set(products::stock.eq(product.stock))
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    async fn insert_invoice(&mut self, draft: &InvoiceDraft) -> Result<i32, OrderError> {
        let new_invoice = NewInvoice {
            customer_id: draft.customer().id,
            total: draft.total().clone(),
            status: draft.status().as_str().to_string(),
            created_at: draft.created_at(),
        };

        let invoice_id = diesel::insert_into(invoices::table)
            .values(&new_invoice)
            .returning(invoices::id)
            .get_result::<i32>(&mut *self.conn)
            .await?;

        let lines: Vec<NewInvoiceLine> = draft
            .products()
            .iter()
            .enumerate()
            .map(|(position, product)| NewInvoiceLine {
                invoice_id,
                position: position as i32,
                product_id: product.id,
            })
            .collect();

        if !lines.is_empty() {
            diesel::insert_into(invoice_products::table)
                .values(&lines)
                .execute(&mut *self.conn)
                .await?;
        }

        Ok(invoice_id)
    }

    async fn set_invoice_status(&mut self, id: i32, status: InvoiceStatus) -> Result<bool, OrderError> {
        let updated = diesel::update(invoices::table.filter(invoices::id.eq(id)))
            .set(invoices::status.eq(status.as_str()))
            .execute(&mut *self.conn)
            .await?;

        Ok(updated > 0)
    }
}
