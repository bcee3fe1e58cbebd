//! Text heuristics that turn a listing card's loose, human-readable text
//! into typed fields.
//!
//! Every function here is pure and works on plain strings, so the rules can
//! be exercised without a DOM.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

static PERMANENTLY_CLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)permanently closed").expect("valid regex"));
static TEMPORARILY_CLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)temporaril(?:y)? closed").expect("valid regex"));

// Digits, a space, then word characters/whitespace, optionally followed by a
// unit number. ASCII classes keep `\w` from absorbing accented UI text.
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+ [A-Za-z0-9_\s]+(?:#\s*[0-9]+|Suite\s*[0-9]+|Apt\s*[0-9]+)?")
        .expect("valid regex")
});
static STATUS_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Closed|Open 24 hours|24 hours)|Open\b").expect("valid regex")
});
static DIGIT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)(Open)").expect("valid regex"));
static GLUED_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_])(Open)").expect("valid regex"));
static GLUED_CLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_])(Closed)").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+[0-9]{1,2}\s)?\(?[0-9]{3}\)?[\s.-]?[0-9]{3}[\s.-]?[0-9]{4}")
        .expect("valid regex")
});
static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));

static SEARCH_CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Restaurants?|Restaurant) in (.+)").expect("valid regex"));
static NUMERIC_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static REGION_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\- ]{2,}$").expect("valid regex"));

/// Characters stripped from the raw category/price line. `Â` shows up when
/// a middot is decoded with the wrong charset.
const INDUSTRY_PUNCTUATION: &[char] = &['Â', '·', '.', ',', '#', '!', '?'];

/// `encodeURIComponent` leaves `A-Z a-z 0-9 - _ . ! ~ * ' ( )` untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureSignal {
    None,
    Temporary,
    Permanent,
}

/// Address plus the category and price tier that precede it in the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub address: String,
    pub industry: String,
    pub expensiveness: String,
}

pub fn detect_closure(text: &str) -> ClosureSignal {
    if PERMANENTLY_CLOSED_RE.is_match(text) {
        ClosureSignal::Permanent
    } else if TEMPORARILY_CLOSED_RE.is_match(text) {
        ClosureSignal::Temporary
    } else {
        ClosureSignal::None
    }
}

/// Splits an accessibility label such as `"4.5 stars 120 reviews"` into
/// `("4.5", "(120)")`. Labels that are missing or do not mention stars give
/// the `("0", "0")` sentinel.
pub fn parse_rating_label(label: Option<&str>) -> (String, String) {
    let Some(label) = label.filter(|l| l.contains("stars")) else {
        return ("0".to_string(), "0".to_string());
    };

    let parts: Vec<&str> = label.split_whitespace().collect();
    let rating = parts.first().copied().unwrap_or("0").to_string();
    let review_count = match parts.get(2) {
        Some(count) => format!("({})", count),
        None => "0".to_string(),
    };
    (rating, review_count)
}

/// Runs the address pass over the full card text.
///
/// The text between the last `rating + review_count` occurrence and the
/// address is the category line; its alphabetic part is the industry and
/// its price symbols are the expensiveness. Without an address match all
/// three fields stay empty.
pub fn extract_address_fields(text: &str, rating: &str, review_count: &str) -> AddressFields {
    let Some(found) = ADDRESS_RE.find(text) else {
        return AddressFields::default();
    };

    let mut fields = AddressFields::default();
    let before_address = text[..found.start()].trim();
    let anchor = format!("{}{}", rating, review_count);

    if let Some(index) = before_address.rfind(&anchor) {
        let after_anchor = before_address[index + anchor.len()..].trim();
        let first_line = LINE_BREAK_RE.split(after_anchor).next().unwrap_or("");
        let (industry, expensiveness) = split_category_line(first_line);
        fields.industry = industry;
        fields.expensiveness = expensiveness;
    }

    fields.address = strip_status_words(found.as_str());
    fields
}

/// Splits a category line like `"Pizza · $$"` into `("Pizza", "$$")`.
pub fn split_category_line(raw: &str) -> (String, String) {
    let cleaned: String = raw.chars().filter(|c| !INDUSTRY_PUNCTUATION.contains(c)).collect();
    let cleaned = cleaned.trim();

    let industry: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect();

    (industry.trim().to_string(), clean_expensiveness(cleaned))
}

/// Keeps only digits, `$`, hyphen, en-dash and plus.
pub fn clean_expensiveness(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '$' | '-' | '\u{2013}' | '+'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Removes opening-hours words that bleed into the address from adjacent
/// UI text, including variants glued to the previous word.
pub fn strip_status_words(address: &str) -> String {
    let address = STATUS_WORDS_RE.replace_all(address, "");
    let address = DIGIT_OPEN_RE.replace_all(address.trim(), "${1}");
    let address = GLUED_OPEN_RE.replace_all(address.trim(), "${1}");
    let address = GLUED_CLOSED_RE.replace_all(address.trim(), "${1}");
    address.trim().to_string()
}

pub fn find_phone(text: &str) -> String {
    PHONE_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// City named by a search such as `"Restaurants in Springfield"`.
pub fn city_from_search(search: &str) -> Option<String> {
    SEARCH_CITY_RE
        .captures(search)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|city| !city.is_empty())
}

/// Picks the last comma-separated segment that looks like a place name,
/// skipping postal codes and all-caps region codes. Falls back to the last
/// segment.
pub fn city_from_address(address: &str) -> String {
    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    parts
        .iter()
        .rev()
        .find(|p| !NUMERIC_SEGMENT_RE.is_match(p) && !REGION_CODE_RE.is_match(p))
        .or(parts.last())
        .map(|p| p.to_string())
        .unwrap_or_default()
}

pub fn search_url(search_engine_url: &str, query: &str) -> String {
    format!(
        "{}?q={}",
        search_engine_url,
        utf8_percent_encode(query, URI_COMPONENT)
    )
}

/// Search-engine query for the listing's Instagram profile.
pub fn instagram_search_url(search_engine_url: &str, title: &str, city: &str) -> String {
    let mut query = title.to_string();
    if !city.is_empty() {
        query.push(' ');
        query.push_str(city);
    }
    query.push_str(" Instagram");
    search_url(search_engine_url, &query)
}
