use serde::{Deserialize, Serialize};

/// One scraped business listing.
///
/// Field names serialize in camelCase so stored collections keep the same
/// shape across versions. Missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    pub title: String,
    pub closed_status: ClosedStatus,
    /// Numeric text, or "0" when no rating signal was found.
    pub rating: String,
    /// Parenthesized count such as "(120)", or "0".
    pub review_count: String,
    pub phone: String,
    pub industry: String,
    pub expensiveness: String,
    pub city: String,
    pub address: String,
    pub company_url: String,
    pub insta_search: String,
    /// Map-place link; the primary identity anchor.
    pub href: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClosedStatus {
    #[default]
    #[serde(rename = "")]
    Open,
    #[serde(rename = "Temporarily Closed")]
    TemporarilyClosed,
}

impl ClosedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosedStatus::Open => "",
            ClosedStatus::TemporarilyClosed => "Temporarily Closed",
        }
    }
}

impl Listing {
    /// Identity used for deduplication: `href` when present, otherwise
    /// `title|address`. `None` when the listing has neither.
    pub fn identity_key(&self) -> Option<String> {
        if !self.href.is_empty() {
            return Some(self.href.clone());
        }
        if self.title.is_empty() && self.address.is_empty() {
            return None;
        }
        Some(format!("{}|{}", self.title, self.address))
    }
}
