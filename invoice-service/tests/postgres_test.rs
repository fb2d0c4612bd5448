//! Runs against a live database. Opt in with
//! `DATABASE_URL=postgres://... cargo test -p invoice-service -- --ignored`.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::{bb8::Pool, AsyncDieselConnectionManager};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use invoice_service::schema::{customers, products};
use invoice_service::{Gateway, InvoiceService, PgGateway};
use shared::*;
use std::sync::Arc;
use std::time::Duration;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type DbPool = Pool<AsyncPgConnection>;

async fn pool() -> Option<DbPool> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let mut conn = PgConnection::establish(&database_url).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&database_url);
    Some(Pool::builder().build(config).await.unwrap())
}

async fn insert_customer(pool: &DbPool) -> i32 {
    let mut conn = pool.get().await.unwrap();
    diesel::insert_into(customers::table)
        .values((
            customers::fullname.eq("John Doe"),
            customers::email.eq("john@example.com"),
            customers::phone.eq("555-0100"),
        ))
        .returning(customers::id)
        .get_result::<i32>(&mut conn)
        .await
        .unwrap()
}

async fn insert_product(pool: &DbPool, name: &str, price: i64, stock: i32) -> i32 {
    let mut conn = pool.get().await.unwrap();
    diesel::insert_into(products::table)
        .values((
            products::name.eq(name),
            products::price.eq(BigDecimal::from(price)),
            products::stock.eq(stock),
        ))
        .returning(products::id)
        .get_result::<i32>(&mut conn)
        .await
        .unwrap()
}

async fn stock(pool: &DbPool, id: i32) -> i32 {
    let mut conn = pool.get().await.unwrap();
    products::table
        .filter(products::id.eq(id))
        .select(products::stock)
        .first::<i32>(&mut conn)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs DATABASE_URL"]
async fn last_unit_is_sold_once_under_row_locks() {
    let Some(pool) = pool().await else { return };
    let customer_id = insert_customer(&pool).await;
    let product_id = insert_product(&pool, "Desk Lamp", 100, 1).await;
    let service = InvoiceService::new(Arc::new(PgGateway::new(pool.clone())));

    let orders = (0..2).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.place_order(PlaceOrder::new(customer_id, vec![product_id])).await })
    });
    let results: Vec<_> = futures::future::join_all(orders)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(
        rejected,
        &OrderError::InsufficientStock {
            id: product_id,
            name: "Desk Lamp".to_string()
        }
    );
    assert_eq!(stock(&pool, product_id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs DATABASE_URL"]
async fn lock_wait_past_timeout_aborts_as_transaction_failure() {
    let Some(pool) = pool().await else { return };
    let customer_id = insert_customer(&pool).await;
    let product_id = insert_product(&pool, "Chair", 40, 5).await;

    let holder_gateway = PgGateway::new(pool.clone());
    let service = InvoiceService::new(Arc::new(
        PgGateway::new(pool.clone()).with_lock_timeout(Duration::from_millis(100)),
    ));

    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let holder = tokio::spawn(async move {
        holder_gateway
            .in_transaction(move |tx| {
                Box::pin(async move {
                    tx.lock_product(product_id).await?;
                    let _ = locked_tx.send(());
                    let _ = release_rx.await;
                    Ok(())
                })
            })
            .await
    });
    locked_rx.await.unwrap();

    let err = service
        .place_order(PlaceOrder::new(customer_id, vec![product_id]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Transaction(_)), "unexpected error: {:?}", err);

    release_tx.send(()).unwrap();
    holder.await.unwrap().unwrap();
    assert_eq!(stock(&pool, product_id).await, 5);

    let invoice = service
        .place_order(PlaceOrder::new(customer_id, vec![product_id]))
        .await
        .unwrap();
    assert_eq!(invoice.total, BigDecimal::from(40));
    assert_eq!(stock(&pool, product_id).await, 4);
}
