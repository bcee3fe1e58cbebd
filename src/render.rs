use serde::Serialize;
use url::Url;

use crate::config::ExtractorConfig;
use crate::heuristics;
use crate::models::Listing;

pub const HEADERS: [&str; 12] = [
    "Title",
    "Closed Status",
    "Rating",
    "Reviews",
    "Phone",
    "Industry",
    "Expensiveness",
    "City",
    "Address",
    "Website",
    "Insta Search",
    "Google Maps Link",
];

/// One displayed cell. Link cells carry their target in `href` and show
/// `text` as the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub href: Option<String>,
}

impl Cell {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }

    fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub cells: Vec<Cell>,
}

/// Turns stored listings into display rows, shared by the table view and
/// both export formats.
#[derive(Debug, Clone)]
pub struct RowRenderer {
    search_engine_url: String,
    maps_url_prefix: String,
}

impl RowRenderer {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            search_engine_url: config.search_engine_url.clone(),
            maps_url_prefix: config.maps_url_prefix.clone(),
        }
    }

    pub fn rows(&self, listings: &[Listing]) -> Vec<ListingRow> {
        listings.iter().map(|l| self.row(l)).collect()
    }

    pub fn row(&self, listing: &Listing) -> ListingRow {
        ListingRow {
            cells: vec![
                Cell::text(&listing.title),
                Cell::text(listing.closed_status.as_str()),
                Cell::text(&listing.rating),
                Cell::text(listing.review_count.replace(['(', ')'], "")),
                Cell::text(&listing.phone),
                Cell::text(&listing.industry),
                Cell::text(&listing.expensiveness),
                Cell::text(&listing.city),
                Cell::text(&listing.address),
                self.website_cell(listing),
                insta_cell(&listing.insta_search),
                maps_cell(&listing.href),
            ],
        }
    }

    fn website_cell(&self, listing: &Listing) -> Cell {
        let url = &listing.company_url;
        if url.is_empty() || url.starts_with(&self.maps_url_prefix) {
            let query = [listing.title.as_str(), listing.city.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .chain(["Website"])
                .collect::<Vec<_>>()
                .join(" ");
            Cell::link(
                "Search For Website",
                heuristics::search_url(&self.search_engine_url, &query),
            )
        } else {
            Cell::link("Goto Website", url)
        }
    }
}

fn insta_cell(url: &str) -> Cell {
    if url.is_empty() {
        return Cell::text("");
    }
    let label = query_param(url, "q")
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| url.to_string());
    Cell::link(label, url)
}

fn maps_cell(href: &str) -> Cell {
    if href.is_empty() {
        Cell::text("")
    } else {
        Cell::link("Open In Google maps", href)
    }
}

/// Decoded value of a query parameter, with `+` read as a space.
fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
