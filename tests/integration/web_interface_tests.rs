use super::*;
use axum::http::{Method, StatusCode, header};
use listing_harvester::web::create_router;

fn scrape_body(html: &str) -> String {
    serde_json::json!({
        "html": html,
        "page_url": "https://www.google.com/maps/search/restaurants+in+springfield"
    })
    .to_string()
}

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let app = create_router(create_test_app_state()?);

    let response = make_request(app, Method::GET, "/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn test_scrape_then_list() -> anyhow::Result<()> {
    let app = create_router(create_test_app_state()?);

    let response = make_request(
        app.clone(),
        Method::POST,
        "/api/v1/scrape",
        Some(scrape_body(MAPS_RESULTS)),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["extracted"], 2);
    assert_eq!(json["data"]["skipped_closed"], 1);
    assert_eq!(json["data"]["added"], 2);

    let response = make_request(app, Method::GET, "/api/v1/listings", None).await?;
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["data"][0]["title"], "Joe's Pizza");
    assert_eq!(json["data"][1]["closedStatus"], "Temporarily Closed");
    Ok(())
}

#[tokio::test]
async fn test_scrape_rejects_empty_html() -> anyhow::Result<()> {
    let app = create_router(create_test_app_state()?);

    let response = make_request(app, Method::POST, "/api/v1/scrape", Some(scrape_body("  "))).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn test_table_view_shows_total() -> anyhow::Result<()> {
    let state = create_test_app_state()?;
    state.manager.scrape_page(MAPS_RESULTS, &page_context()).await;
    let app = create_router(state);

    let response = make_request(app, Method::GET, "/", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap().to_str()?.to_string();
    assert!(content_type.contains("text/html"));

    let html = body_string(response).await?;
    assert!(html.contains("Total Extracted: 2"));
    assert!(html.contains("<th>Insta Search</th>"));
    assert!(html.contains("Goto Website"));
    assert!(html.contains("Search For Website"));
    Ok(())
}

#[tokio::test]
async fn test_export_download_headers() -> anyhow::Result<()> {
    let state = create_test_app_state()?;
    state.manager.scrape_page(MAPS_RESULTS, &page_context()).await;
    let app = create_router(state);

    let response = make_request(app.clone(), Method::GET, "/export?filename=My%20List!", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/vnd.ms-excel");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"my_list_.xls\""
    );

    let response = make_request(app, Method::GET, "/export?format=csv", None).await?;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"google-maps-data.csv\""
    );
    let csv = body_string(response).await?;
    assert!(csv.contains("\"Joe's Pizza\""));
    Ok(())
}

#[tokio::test]
async fn test_clear_endpoint() -> anyhow::Result<()> {
    let state = create_test_app_state()?;
    state.manager.scrape_page(MAPS_RESULTS, &page_context()).await;
    let app = create_router(state.clone());

    let response = make_request(app, Method::DELETE, "/api/v1/listings", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.manager.load().await.is_empty());
    Ok(())
}
