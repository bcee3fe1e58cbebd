use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{error, info, warn};

use crate::config::{AppConfig, ExportConfig};
use crate::dedup;
use crate::export::{self, ExportFile, ExportFormat};
use crate::extractor::{self, Extraction, ListingExtractor, PageContext};
use crate::heuristics;
use crate::models::Listing;
use crate::render::{ListingRow, RowRenderer};
use crate::store::{ListingStore, StoreChange};
use crate::utils::error::Result;

/// Summary of one scrape pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub extracted: usize,
    pub skipped_closed: usize,
    pub added: usize,
    pub total: usize,
    /// False when the merged collection could not be read or written; the
    /// stored collection is then unchanged.
    pub persisted: bool,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub added: usize,
    pub total: usize,
    pub persisted: bool,
}

pub struct ListingManager {
    store: Arc<dyn ListingStore>,
    extractor: ListingExtractor,
    renderer: RowRenderer,
    export: ExportConfig,
    // Serializes read-merge-write so concurrent scrapes in this process
    // cannot drop each other's additions.
    write_lock: Mutex<()>,
}

impl ListingManager {
    pub fn new(config: &AppConfig, store: Arc<dyn ListingStore>) -> Result<Self> {
        Ok(Self {
            store,
            extractor: ListingExtractor::new(&config.extractor)?,
            renderer: RowRenderer::new(&config.extractor),
            export: config.export.clone(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.store.subscribe()
    }

    /// The stored collection as displayed: expensiveness re-cleaned and
    /// later duplicates dropped. A failed read shows as empty.
    pub async fn load(&self) -> Vec<Listing> {
        match self.store.get().await {
            Ok(stored) => dedup::dedup(stored.into_iter().map(normalize).collect()),
            Err(e) => {
                error!("Failed to load stored listings: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn rows(&self) -> Vec<ListingRow> {
        self.renderer.rows(&self.load().await)
    }

    /// Extracts every listing from a page snapshot and merges the batch into
    /// the stored collection.
    pub async fn scrape_page(&self, html: &str, context: &PageContext) -> ScrapeReport {
        let extractions = self.extractor.extract_page(html, context);
        let skipped_closed = extractions
            .iter()
            .filter(|e| matches!(e, Extraction::PermanentlyClosed { .. }))
            .count();
        let batch = extractor::listings(extractions);
        let extracted = batch.len();

        let outcome = self.ingest(batch).await;

        ScrapeReport {
            extracted,
            skipped_closed,
            added: outcome.added,
            total: outcome.total,
            persisted: outcome.persisted,
            scraped_at: Utc::now(),
        }
    }

    /// Merges a batch into the stored collection. Storage failures are
    /// logged and leave the collection as it was.
    pub async fn ingest(&self, batch: Vec<Listing>) -> IngestOutcome {
        let _guard = self.write_lock.lock().await;

        let existing = match self.store.get().await {
            Ok(existing) => existing,
            Err(e) => {
                error!("Failed to read stored listings, dropping batch of {}: {}", batch.len(), e);
                return IngestOutcome {
                    added: 0,
                    total: 0,
                    persisted: false,
                };
            }
        };

        let merged = dedup::merge(existing, batch);
        let total = merged.listings.len();
        if !merged.changed() {
            info!("No new listings; {} stored", total);
            return IngestOutcome {
                added: 0,
                total,
                persisted: true,
            };
        }

        match self.store.set(&merged.listings).await {
            Ok(()) => {
                info!("Added {} new listings; {} stored", merged.added, total);
                IngestOutcome {
                    added: merged.added,
                    total,
                    persisted: true,
                }
            }
            Err(e) => {
                error!("Failed to store {} merged listings: {}", total, e);
                IngestOutcome {
                    added: 0,
                    total: total - merged.added,
                    persisted: false,
                }
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.set(&[]).await?;
        warn!("Cleared all stored listings");
        Ok(())
    }

    pub async fn export(&self, filename: Option<&str>, format: ExportFormat) -> Result<ExportFile> {
        let rows = self.rows().await;
        export::build_export(&rows, filename, &self.export.default_filename, format)
    }

    /// Exports and writes the file into `out_dir`, or the configured output
    /// directory.
    pub async fn export_to_dir(
        &self,
        filename: Option<&str>,
        format: ExportFormat,
        out_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let file = self.export(filename, format).await?;
        export::write_to_dir(&file, out_dir.unwrap_or(&self.export.output_dir))
    }
}

fn normalize(mut listing: Listing) -> Listing {
    listing.expensiveness = heuristics::clean_expensiveness(&listing.expensiveness);
    listing
}
