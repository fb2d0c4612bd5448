use bigdecimal::BigDecimal;
use num_traits::Zero;
use shared::*;
use tracing::debug;

use crate::store::StoreTx;

/// Products reserved by one transaction, one entry per unit, in lock order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub products: Vec<Product>,
    pub total: BigDecimal,
}

impl Default for Reservation {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            total: BigDecimal::zero(),
        }
    }
}

/// Locks and decrements one unit of stock per requested id.
///
/// Ids are visited in ascending order so every transaction acquires row locks in
/// the same global order; two orders over overlapping products queue behind each
/// other instead of deadlocking. Duplicates are kept: each occurrence takes one
/// more unit and can fail on its own once stock runs out.
///
/// On error the caller must abort the transaction; decrements already written
/// are only undone by its rollback.
pub async fn reserve(tx: &mut dyn StoreTx, product_ids: &[i32]) -> Result<Reservation, OrderError> {
    let mut lock_order = product_ids.to_vec();
    lock_order.sort_unstable();

    let mut reservation = Reservation::default();
    for id in lock_order {
        let mut product = tx
            .lock_product(id)
            .await?
            .ok_or(OrderError::ProductNotFound(id))?;

        if !product.in_stock() {
            return Err(OrderError::InsufficientStock {
                id,
                name: product.name,
            });
        }

        product.stock -= 1;
        tx.save_product(&product).await?;
        debug!(product_id = id, stock = product.stock, "Reserved one unit");

        reservation.total += &product.price;
        reservation.products.push(product);
    }

    Ok(reservation)
}
