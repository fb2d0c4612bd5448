use chrono::Utc;
use shared::*;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::invoice::InvoiceDraft;
use crate::reservation::reserve;
use crate::store::Gateway;

/// Places invoices and moves them between statuses.
///
/// Holds no state of its own: concurrent calls only meet inside the gateway's
/// transactions and row locks.
pub struct InvoiceService<G> {
    gateway: Arc<G>,
}

impl<G> Clone for InvoiceService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: Gateway> InvoiceService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Validates the customer, reserves stock and persists the invoice, all in one
    /// transaction. Any failure leaves stock and invoices exactly as they were.
    #[instrument(skip(self, order), fields(customer_id = order.customer_id, products = order.product_ids.len()))]
    pub async fn place_order(&self, order: PlaceOrder) -> Result<Invoice, OrderError> {
        let result = self
            .gateway
            .in_transaction(move |tx| {
                Box::pin(async move {
                    let customer = tx
                        .find_customer(order.customer_id)
                        .await?
                        .ok_or(OrderError::CustomerNotFound(order.customer_id))?;

                    let reservation = reserve(tx, &order.product_ids).await?;

                    let draft = InvoiceDraft::assemble(customer, reservation, order.status, Utc::now())?;
                    let id = tx.insert_invoice(&draft).await?;

                    Ok(draft.into_invoice(id))
                })
            })
            .await;

        match &result {
            Ok(invoice) => info!(
                invoice_id = invoice.id,
                total = %invoice.total,
                status = %invoice.status,
                "Invoice committed"
            ),
            Err(e) => warn!(error = %e, "Invoice placement rolled back"),
        }

        result
    }

    /// Status is the only field of a committed invoice that may change.
    #[instrument(skip(self))]
    pub async fn update_status(&self, invoice_id: i32, status: InvoiceStatus) -> Result<(), OrderError> {
        let found = self
            .gateway
            .in_transaction(move |tx| Box::pin(async move { tx.set_invoice_status(invoice_id, status).await }))
            .await?;

        if !found {
            warn!("Invoice not found");
            return Err(OrderError::InvoiceNotFound(invoice_id));
        }

        info!("Invoice status updated");
        Ok(())
    }
}
