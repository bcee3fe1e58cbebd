use scraper::Selector;

use crate::config::ExtractorConfig;
use crate::utils::error::{AppError, Result};

/// Compiled form of [`ExtractorConfig`]. Parsed once per extractor so a
/// bad selector is reported up front instead of silently matching nothing.
#[derive(Debug, Clone)]
pub struct SelectorTable {
    pub place_url_prefix: String,
    pub place_link: Selector,
    pub container: Selector,
    pub title: Selector,
    pub rating: Selector,
    pub link: Selector,
    pub search_inputs: Vec<Selector>,
}

impl SelectorTable {
    pub fn compile(config: &ExtractorConfig) -> Result<Self> {
        let place_link = format!(r#"a[href^="{}"]"#, config.place_url_prefix);

        Ok(Self {
            place_url_prefix: config.place_url_prefix.clone(),
            place_link: parse(&place_link)?,
            container: parse(&config.container_selector)?,
            title: parse(&config.title_selector)?,
            rating: parse(&config.rating_selector)?,
            link: parse(&config.link_selector)?,
            search_inputs: config
                .search_input_selectors
                .iter()
                .map(|s| parse(s))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

fn parse(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
