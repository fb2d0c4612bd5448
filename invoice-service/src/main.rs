use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use diesel::PgConnection;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

use anyhow::Result;
use clap::Parser;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection};
use diesel::Connection;
use invoice_service::api;
use invoice_service::config::Args;
use invoice_service::{InvoiceService, PgGateway};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    // Run migrations first
    info!("Running database migrations...");
    let mut conn = PgConnection::establish(&args.database_url)?;
    conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    info!("Migrations completed successfully");

    let config = diesel_async::pooled_connection::AsyncDieselConnectionManager::<AsyncPgConnection>::new(&args.database_url);
    let pool = Pool::builder().max_size(args.pool_size).build(config).await?;

    let mut gateway = PgGateway::new(pool);
    if let Some(lock_timeout) = args.lock_timeout() {
        info!("Row lock waits bounded to {:?}", lock_timeout);
        gateway = gateway.with_lock_timeout(lock_timeout);
    }

    let app_state = api::AppState {
        invoices: InvoiceService::new(Arc::new(gateway)),
    };

    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Invoice service ready to accept HTTP requests at http://0.0.0.0:{}/invoices", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
