use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, AppState, ListingsPage};
use crate::export::ExportFormat;
use crate::extractor::PageContext;
use crate::listing_manager::ScrapeReport;
use crate::models::Listing;
use crate::render::HEADERS;

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Serialized DOM of the rendered results page.
    pub html: String,
    #[serde(flatten)]
    pub context: PageContext,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExportParams {
    pub filename: Option<String>,
    pub format: Option<ExportFormat>,
}

pub async fn listings_page(State(state): State<AppState>) -> ListingsPage {
    let rows = state.manager.rows().await;
    ListingsPage {
        total: rows.len(),
        headers: &HEADERS,
        rows,
    }
}

pub async fn list_listings(State(state): State<AppState>) -> Json<ApiResponse<Vec<Listing>>> {
    let listings = state.manager.load().await;
    let total = listings.len();
    tracing::debug!("Serving {} stored listings", total);
    Json(ApiResponse::success_with_meta(
        listings,
        serde_json::json!({ "total": total }),
    ))
}

pub async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ApiResponse<ScrapeReport>>, ApiError> {
    if request.html.trim().is_empty() {
        return Err(ApiError::bad_request("Page HTML is required"));
    }

    if let Some(ref page_url) = request.context.page_url {
        if url::Url::parse(page_url).is_err() {
            return Err(ApiError::bad_request(format!("Invalid page URL: {}", page_url)));
        }
    }

    let report = state.manager.scrape_page(&request.html, &request.context).await;
    tracing::info!(
        "Scrape request: {} extracted, {} added, persisted={}",
        report.extracted,
        report.added,
        report.persisted
    );
    Ok(Json(ApiResponse::success(report)))
}

pub async fn clear_listings(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, ApiError> {
    match state.manager.clear().await {
        Ok(()) => Ok(Json(ApiResponse::success(()))),
        Err(e) => {
            tracing::error!("Failed to clear listings: {}", e);
            Err(ApiError::internal("Failed to clear listings"))
        }
    }
}

pub async fn export_download(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let format = params.format.unwrap_or_default();
    let file = state
        .manager
        .export(params.filename.as_deref(), format)
        .await
        .map_err(|e| {
            tracing::error!("Export failed: {}", e);
            ApiError::internal(format!("Export failed: {}", e))
        })?;

    let headers = [
        (header::CONTENT_TYPE, file.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ),
    ];
    Ok((headers, file.body).into_response())
}
