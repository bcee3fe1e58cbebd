pub mod config;
pub mod dedup;
pub mod export;
pub mod extractor;
pub mod heuristics;
pub mod listing_manager;
pub mod models;
pub mod render;
pub mod scraper;
pub mod selectors;
pub mod store;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use extractor::{ListingExtractor, PageContext};
pub use listing_manager::{ListingManager, ScrapeReport};
pub use models::Listing;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
