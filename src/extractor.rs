use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ExtractorConfig;
use crate::heuristics::{self, AddressFields, ClosureSignal};
use crate::models::{ClosedStatus, Listing};
use crate::scraper::{ListingContainer, PageSnapshot};
use crate::selectors::SelectorTable;
use crate::utils::error::Result;

/// Outcome for one place link on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Listing(Listing),
    /// Permanently closed places are skipped and never become listings.
    PermanentlyClosed { href: String },
}

/// Per-invocation details about the page being scraped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContext {
    /// URL the snapshot was taken from; relative links resolve against it.
    pub page_url: Option<String>,
    /// Overrides the value read from the page's search box.
    pub search: Option<String>,
}

pub struct ListingExtractor {
    selectors: SelectorTable,
    default_page_url: String,
    search_engine_url: String,
}

impl ListingExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            selectors: SelectorTable::compile(config)?,
            default_page_url: config.page_url.clone(),
            search_engine_url: config.search_engine_url.clone(),
        })
    }

    /// Runs one pass over a page snapshot. Each place link yields exactly one
    /// [`Extraction`], in document order.
    pub fn extract_page(&self, html: &str, context: &PageContext) -> Vec<Extraction> {
        let page_url = context.page_url.as_deref().unwrap_or(&self.default_page_url);
        let page = PageSnapshot::parse(html, Some(page_url));

        let search = context
            .search
            .clone()
            .or_else(|| page.search_text(&self.selectors))
            .unwrap_or_default();
        let search_city = heuristics::city_from_search(&search);

        let extractions: Vec<Extraction> = page
            .candidates(&self.selectors)
            .iter()
            .map(|candidate| {
                let card = candidate.card.as_ref().map(|c| c as &dyn ListingContainer);
                self.extract_listing(&candidate.href, card, search_city.as_deref())
            })
            .collect();

        let closed = extractions
            .iter()
            .filter(|e| matches!(e, Extraction::PermanentlyClosed { .. }))
            .count();
        info!(
            "Extracted {} listings from {} ({} permanently closed skipped)",
            extractions.len() - closed,
            page_url,
            closed
        );

        extractions
    }

    /// Derives one listing from a card. A missing card or a missing
    /// sub-element only empties the affected fields.
    pub fn extract_listing(
        &self,
        href: &str,
        card: Option<&dyn ListingContainer>,
        search_city: Option<&str>,
    ) -> Extraction {
        let Some(card) = card else {
            debug!("No card container for {}", href);
            let city = search_city.unwrap_or_default().to_string();
            return Extraction::Listing(Listing {
                insta_search: heuristics::instagram_search_url(&self.search_engine_url, "", &city),
                city,
                href: href.to_string(),
                ..Default::default()
            });
        };

        let text = card.full_text();
        let closed_status = match heuristics::detect_closure(&text) {
            ClosureSignal::Permanent => {
                debug!("Skipping permanently closed place {}", href);
                return Extraction::PermanentlyClosed {
                    href: href.to_string(),
                };
            }
            ClosureSignal::Temporary => ClosedStatus::TemporarilyClosed,
            ClosureSignal::None => ClosedStatus::Open,
        };

        let title = card.title_text().unwrap_or_default();
        let label = card.rating_label();
        let (rating, review_count) = heuristics::parse_rating_label(label.as_deref());

        let AddressFields {
            address,
            industry,
            expensiveness,
        } = heuristics::extract_address_fields(&text, &rating, &review_count);

        let company_url = card
            .all_links()
            .into_iter()
            .find(|link| !link.starts_with(&self.selectors.place_url_prefix))
            .unwrap_or_default();

        let phone = heuristics::find_phone(&text);

        let city = match search_city {
            Some(city) => city.to_string(),
            None => heuristics::city_from_address(&address),
        };
        let insta_search = heuristics::instagram_search_url(&self.search_engine_url, &title, &city);

        Extraction::Listing(Listing {
            title,
            closed_status,
            rating,
            review_count,
            phone,
            industry,
            expensiveness,
            city,
            address,
            company_url,
            insta_search,
            href: href.to_string(),
        })
    }
}

/// Listings of a pass, with skip markers dropped.
pub fn listings(extractions: Vec<Extraction>) -> Vec<Listing> {
    extractions
        .into_iter()
        .filter_map(|e| match e {
            Extraction::Listing(listing) => Some(listing),
            Extraction::PermanentlyClosed { .. } => None,
        })
        .collect()
}
