use askama::Template;
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

use crate::listing_manager::ListingManager;
use crate::render::ListingRow;
use crate::store::StoreChange;

pub mod handlers;
pub mod responses;

pub use handlers::{clear_listings, export_download, list_listings, listings_page, scrape};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ListingManager>,
}

/// Table view of the stored collection.
#[derive(Template)]
#[template(path = "listings.html")]
pub struct ListingsPage {
    pub total: usize,
    pub headers: &'static [&'static str],
    pub rows: Vec<ListingRow>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(listings_page))
        .route("/export", get(export_download))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings).delete(clear_listings))
        .route("/scrape", post(scrape))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "listing-harvester"
    }))
}

/// Logs every change to the stored collection until the store goes away.
pub fn spawn_change_logger(mut changes: broadcast::Receiver<StoreChange>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    tracing::info!(
                        "Stored listings under '{}' changed: {} total",
                        change.key,
                        change.listings.len()
                    );
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Change logger lagged behind by {} updates", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
