use super::*;
use listing_harvester::{
    ListingExtractor,
    extractor::{Extraction, listings},
    models::ClosedStatus,
};

fn extractor() -> ListingExtractor {
    ListingExtractor::new(&get_test_config().extractor).unwrap()
}

#[test]
fn test_fixture_yields_one_outcome_per_place_link() {
    let extractions = extractor().extract_page(MAPS_RESULTS, &page_context());

    assert_eq!(extractions.len(), 3);
    assert!(matches!(
        &extractions[2],
        Extraction::PermanentlyClosed { href } if href.contains("Old+Diner")
    ));
}

#[test]
fn test_open_listing_fields() {
    let batch = listings(extractor().extract_page(MAPS_RESULTS, &page_context()));
    let joes = &batch[0];

    assert_eq!(joes.title, "Joe's Pizza");
    assert_eq!(joes.closed_status, ClosedStatus::Open);
    assert_eq!(joes.rating, "4.5");
    assert_eq!(joes.review_count, "(120)");
    assert_eq!(joes.industry, "Pizza");
    assert_eq!(joes.expensiveness, "$$");
    assert_eq!(joes.address, "123 Main St");
    assert_eq!(joes.phone, "(555) 123-4567");
    assert_eq!(joes.city, "Springfield");
    assert_eq!(joes.company_url, "https://joespizza.example/");
    assert_eq!(joes.href, "https://www.google.com/maps/place/Joe's+Pizza/data=1");
    assert_eq!(
        joes.insta_search,
        "https://www.google.com/search?q=Joe's%20Pizza%20Springfield%20Instagram"
    );
}

#[test]
fn test_temporarily_closed_listing_is_kept() {
    let batch = listings(extractor().extract_page(MAPS_RESULTS, &page_context()));
    let luigis = &batch[1];

    assert_eq!(luigis.title, "Luigi's Trattoria");
    assert_eq!(luigis.closed_status, ClosedStatus::TemporarilyClosed);
    assert_eq!(luigis.industry, "Italian");
    assert_eq!(luigis.expensiveness, "$20–30");
    assert_eq!(luigis.address, "77 Elm Ave");
    assert_eq!(luigis.company_url, "");
}

#[test]
fn test_loose_link_and_relative_website() {
    let batch = listings(extractor().extract_page(SECOND_PAGE, &page_context()));

    let taco = &batch[1];
    assert_eq!(taco.company_url, "https://www.google.com/url?q=https://tacocart.example/");
    // Card text is joined without separators, so the address run continues
    // across the line break into the link label.
    assert_eq!(taco.address, "9 Market Sq\n      Website");

    let loose = &batch[2];
    assert_eq!(loose.href, "https://www.google.com/maps/place/Loose+Link/data=5");
    assert_eq!(loose.title, "");
    assert_eq!(loose.address, "");
    assert_eq!(loose.city, "Springfield");
}

#[test]
fn test_search_override_sets_city() {
    let context = PageContext {
        search: Some("restaurant in Shelbyville".to_string()),
        ..page_context()
    };
    let batch = listings(extractor().extract_page(MAPS_RESULTS, &context));

    assert!(batch.iter().all(|l| l.city == "Shelbyville"));
}

#[test]
fn test_page_without_candidates() {
    let extractions = extractor().extract_page("<html><body><p>No results</p></body></html>", &page_context());
    assert!(extractions.is_empty());
}

#[tokio::test]
async fn test_rescraping_same_page_adds_nothing() -> anyhow::Result<()> {
    let manager = create_test_manager()?;

    manager.scrape_page(MAPS_RESULTS, &page_context()).await;
    let again = manager.scrape_page(MAPS_RESULTS, &page_context()).await;

    assert_eq!(again.added, 0);
    assert_eq!(manager.load().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_first_seen_record_wins() -> anyhow::Result<()> {
    let manager = create_test_manager()?;

    manager.scrape_page(MAPS_RESULTS, &page_context()).await;
    manager.scrape_page(SECOND_PAGE, &page_context()).await;

    let stored = manager.load().await;
    assert_eq!(stored[0].title, "Joe's Pizza");
    assert_eq!(stored[0].rating, "4.5");
    Ok(())
}
