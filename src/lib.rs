//! vetms-api: veterinary clinic management backend.
//!
//! The core is the invoice composition engine in [`services::invoice`]:
//! a free-form draft (client, pets, line items) is reconciled against the
//! client/pet/product tables and persisted atomically with a sequential
//! human-readable invoice id.

pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::VetmsConfig;
use crate::services::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: VetmsConfig,
    pub db: Database,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route(
            "/api/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route(
            "/api/invoices/recent",
            get(handlers::invoices::recent_invoices),
        )
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::upsert_product),
        )
        .route(
            "/api/products/import-csv",
            post(handlers::products::import_csv),
        )
        .route(
            "/api/products/:id",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/:id",
            put(handlers::clients::update_client).delete(handlers::clients::delete_client),
        )
        .route("/api/pets", get(handlers::pets::list_pets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
