use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use shared::*;

use crate::placement::InvoiceService;
use crate::store::Gateway;

pub struct AppState<G> {
    pub invoices: InvoiceService<G>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            invoices: self.invoices.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer: i32,
    #[serde(default)]
    pub products: Vec<i32>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn create_router<G: Gateway>(state: AppState<G>) -> Router {
    Router::new()
        .route("/invoices", post(create_invoice::<G>))
        .route("/invoices/:id/status", patch(update_invoice_status::<G>))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn create_invoice<G: Gateway>(
    State(state): State<AppState<G>>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let order = PlaceOrder {
        customer_id: request.customer,
        product_ids: request.products,
        status: request.status,
    };

    let invoice = state.invoices.place_order(order).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update_invoice_status<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .invoices
        .update_status(id, request.status)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health_check() -> &'static str {
    "OK"
}

fn error_response(e: OrderError) -> ApiError {
    let status = match &e {
        OrderError::CustomerNotFound(_) | OrderError::ProductNotFound(_) | OrderError::InvoiceNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        OrderError::InvalidInvoice(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OrderError::Transaction(_) => {
            tracing::error!("Invoice transaction failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (status, Json(ErrorResponse { error: e.to_string() }))
}
