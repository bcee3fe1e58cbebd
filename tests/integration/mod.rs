// Integration tests for the listing harvester
// These tests drive the extractor, store and web surface together

pub mod scrape_tests;
pub mod web_interface_tests;

use axum::{
    body::Body,
    http::{Method, Request},
};
use std::sync::Arc;
use tower::ServiceExt;

use listing_harvester::{
    AppConfig, ListingManager, PageContext,
    store::{ListingStore, MemoryStore, SqliteStore},
    web::AppState,
};

pub const MAPS_RESULTS: &str = include_str!("../fixtures/maps_results.html");
pub const SECOND_PAGE: &str = include_str!("../fixtures/second_page.html");

pub fn get_test_config() -> AppConfig {
    AppConfig::default()
}

pub fn page_context() -> PageContext {
    PageContext {
        page_url: Some("https://www.google.com/maps/search/restaurants+in+springfield".to_string()),
        search: None,
    }
}

/// Manager over an in-memory store
pub fn create_test_manager() -> anyhow::Result<Arc<ListingManager>> {
    let store: Arc<dyn ListingStore> = Arc::new(MemoryStore::new("gmes_results"));
    Ok(Arc::new(ListingManager::new(&get_test_config(), store)?))
}

/// Manager over a SQLite file inside `dir`
pub async fn create_sqlite_manager(dir: &tempfile::TempDir) -> anyhow::Result<Arc<ListingManager>> {
    let mut config = get_test_config();
    config.store.database_url = format!("sqlite://{}", dir.path().join("listings.db").display());

    let store = SqliteStore::connect(&config.store).await?;
    Ok(Arc::new(ListingManager::new(&config, Arc::new(store))?))
}

pub fn create_test_app_state() -> anyhow::Result<AppState> {
    Ok(AppState {
        manager: create_test_manager()?,
    })
}

/// Helper to make HTTP requests to the test app
pub async fn make_request(
    app: axum::Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> anyhow::Result<axum::response::Response> {
    let mut request = Request::builder().method(method).uri(uri);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request.body(Body::from(body.unwrap_or_default()))?;
    Ok(app.oneshot(request).await?)
}

pub async fn body_string(response: axum::response::Response) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}
