use scraper::{ElementRef, Html};
use url::Url;

use crate::selectors::SelectorTable;

/// Read-only view of one listing card, independent of the markup version.
pub trait ListingContainer {
    /// Concatenated text of every descendant text node.
    fn full_text(&self) -> String;
    /// Text of the headline element, `None` when the card has none.
    fn title_text(&self) -> Option<String>;
    /// Accessibility label of the rating image.
    fn rating_label(&self) -> Option<String>;
    /// Resolved targets of every anchor inside the card, in document order.
    fn all_links(&self) -> Vec<String>;
}

/// A parsed snapshot of a rendered map-search results page.
pub struct PageSnapshot {
    document: Html,
    base: Option<Url>,
}

/// A place link found on the page together with its card, if any.
pub struct CandidateListing<'a> {
    pub href: String,
    pub card: Option<CardElement<'a>>,
}

/// [`ListingContainer`] backed by an element of a [`PageSnapshot`].
pub struct CardElement<'a> {
    element: ElementRef<'a>,
    selectors: &'a SelectorTable,
    base: Option<&'a Url>,
}

impl PageSnapshot {
    pub fn parse(html: &str, page_url: Option<&str>) -> Self {
        Self {
            document: Html::parse_document(html),
            base: page_url.and_then(|u| Url::parse(u).ok()),
        }
    }

    /// Every anchor pointing at a map place, paired with its nearest card
    /// ancestor.
    pub fn candidates<'a>(&'a self, selectors: &'a SelectorTable) -> Vec<CandidateListing<'a>> {
        self.document
            .select(&selectors.place_link)
            .map(|link| {
                let href = link
                    .value()
                    .attr("href")
                    .map(|raw| resolve(self.base.as_ref(), raw))
                    .unwrap_or_default();

                let card = std::iter::once(link)
                    .chain(link.ancestors().filter_map(ElementRef::wrap))
                    .find(|el| selectors.container.matches(el))
                    .map(|element| CardElement {
                        element,
                        selectors,
                        base: self.base.as_ref(),
                    });

                CandidateListing { href, card }
            })
            .collect()
    }

    /// Current value of the page's search box, empty when the box exists
    /// without a value.
    pub fn search_text(&self, selectors: &SelectorTable) -> Option<String> {
        selectors
            .search_inputs
            .iter()
            .find_map(|selector| self.document.select(selector).next())
            .map(|input| input.value().attr("value").unwrap_or("").to_string())
    }
}

impl ListingContainer for CardElement<'_> {
    fn full_text(&self) -> String {
        self.element.text().collect()
    }

    fn title_text(&self) -> Option<String> {
        self.element
            .select(&self.selectors.title)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
    }

    fn rating_label(&self) -> Option<String> {
        self.element
            .select(&self.selectors.rating)
            .next()
            .and_then(|img| img.value().attr("aria-label"))
            .map(str::to_string)
    }

    fn all_links(&self) -> Vec<String> {
        self.element
            .select(&self.selectors.link)
            .filter_map(|a| a.value().attr("href"))
            .map(|raw| resolve(self.base, raw))
            .collect()
    }
}

/// Resolves an anchor target the way a browser's `a.href` does. Targets
/// that cannot be resolved are returned unchanged.
fn resolve(base: Option<&Url>, raw: &str) -> String {
    match base {
        Some(base) => base
            .join(raw)
            .map(String::from)
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}
