//! In-process gateway with per-row locking.
//!
//! Every product row sits behind its own async mutex. A transaction keeps the
//! owned guard of each row it locks until it commits or rolls back, so two
//! transactions contending for a row queue on it exactly as they would on a
//! `FOR UPDATE` lock. Stock writes go straight into the locked row; the
//! transaction keeps the pre-lock snapshot and restores it unless it commits.

use async_trait::async_trait;
use shared::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::{Gateway, StoreTx, TxFuture};
use crate::invoice::InvoiceDraft;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredInvoice {
    pub id: i32,
    pub customer_id: i32,
    pub product_ids: Vec<i32>,
    pub total: bigdecimal::BigDecimal,
    pub status: InvoiceStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
pub struct MemoryGateway {
    customers: RwLock<HashMap<i32, Customer>>,
    products: RwLock<HashMap<i32, Arc<Mutex<Product>>>>,
    invoices: Mutex<BTreeMap<i32, StoredInvoice>>,
    next_invoice_id: AtomicI32,
    latency: Option<Duration>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `latency` before every row operation, which widens the window
    /// in which concurrent transactions interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id, customer);
    }

    pub async fn insert_product(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id, Arc::new(Mutex::new(product)));
    }

    /// Committed state of a product. Waits while a transaction holds the row.
    pub async fn product(&self, id: i32) -> Option<Product> {
        let row = self.products.read().await.get(&id).cloned()?;
        let product = row.lock().await.clone();
        Some(product)
    }

    pub async fn invoice(&self, id: i32) -> Option<StoredInvoice> {
        self.invoices.lock().await.get(&id).cloned()
    }

    pub async fn invoices(&self) -> Vec<StoredInvoice> {
        self.invoices.lock().await.values().cloned().collect()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn in_transaction<T, F>(&self, work: F) -> Result<T, OrderError>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn StoreTx) -> TxFuture<'t, T> + Send + 'static,
    {
        let mut tx = MemoryTx::new(self);
        let result = work(&mut tx).await;

        match result {
            Ok(value) => {
                tx.commit().await;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }
}

struct LockedRow {
    guard: OwnedMutexGuard<Product>,
    snapshot: Product,
}

struct MemoryTx<'s> {
    store: &'s MemoryGateway,
    locked: HashMap<i32, LockedRow>,
    pending_invoices: Vec<StoredInvoice>,
    pending_statuses: Vec<(i32, InvoiceStatus)>,
    committed: bool,
}

impl<'s> MemoryTx<'s> {
    fn new(store: &'s MemoryGateway) -> Self {
        Self {
            store,
            locked: HashMap::new(),
            pending_invoices: Vec::new(),
            pending_statuses: Vec::new(),
            committed: false,
        }
    }

    async fn commit(&mut self) {
        let mut invoices = self.store.invoices.lock().await;
        for invoice in self.pending_invoices.drain(..) {
            invoices.insert(invoice.id, invoice);
        }
        for (id, status) in self.pending_statuses.drain(..) {
            if let Some(invoice) = invoices.get_mut(&id) {
                invoice.status = status;
            }
        }
        drop(invoices);

        self.committed = true;
        // Dropping the guards releases the row locks.
        self.locked.clear();
    }

    fn rollback(&mut self) {
        for (_, mut row) in self.locked.drain() {
            *row.guard = row.snapshot;
        }
        self.pending_invoices.clear();
        self.pending_statuses.clear();
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx<'_> {
    /// Takes no customer lock: customers here never change after seeding.
    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, OrderError> {
        self.store.simulate_latency().await;
        let customers = self.store.customers.read().await;
        Ok(customers.get(&id).filter(|c| !c.is_deleted()).cloned())
    }

    async fn lock_product(&mut self, id: i32) -> Result<Option<Product>, OrderError> {
        if let Some(row) = self.locked.get(&id) {
            return Ok(Some((*row.guard).clone()));
        }

        self.store.simulate_latency().await;
        let row = match self.store.products.read().await.get(&id) {
            Some(row) => Arc::clone(row),
            None => return Ok(None),
        };

        debug!(product_id = id, "Waiting for product row lock");
        let guard = row.lock_owned().await;
        let product = (*guard).clone();
        self.locked.insert(
            id,
            LockedRow {
                snapshot: product.clone(),
                guard,
            },
        );

        Ok(Some(product))
    }

    async fn save_product(&mut self, product: &Product) -> Result<(), OrderError> {
        self.store.simulate_latency().await;
        let row = self.locked.get_mut(&product.id).ok_or_else(|| {
            OrderError::Transaction(format!("product {} written without holding its row lock", product.id))
        })?;
        row.guard.stock = product.stock;
        Ok(())
    }

    async fn insert_invoice(&mut self, draft: &InvoiceDraft) -> Result<i32, OrderError> {
        self.store.simulate_latency().await;
        let id = self.store.next_invoice_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending_invoices.push(StoredInvoice {
            id,
            customer_id: draft.customer().id,
            product_ids: draft.products().iter().map(|p| p.id).collect(),
            total: draft.total().clone(),
            status: draft.status(),
            created_at: draft.created_at(),
        });
        Ok(id)
    }

    async fn set_invoice_status(&mut self, id: i32, status: InvoiceStatus) -> Result<bool, OrderError> {
        self.store.simulate_latency().await;
        let exists = self.store.invoices.lock().await.contains_key(&id)
            || self.pending_invoices.iter().any(|invoice| invoice.id == id);
        if exists {
            self.pending_statuses.push((id, status));
        }
        Ok(exists)
    }
}
