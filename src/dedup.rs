use std::collections::HashSet;

use crate::models::Listing;

/// Result of merging a batch into an existing collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub listings: Vec<Listing>,
    pub added: usize,
}

impl MergeOutcome {
    /// Whether the merged collection differs from the input and needs to be
    /// persisted.
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

/// Appends the batch's new listings to `existing`, keeping order.
///
/// A listing is new when it has an identity key that neither `existing` nor
/// an earlier batch entry already holds. On a key collision the first-seen
/// listing is kept unchanged; listings without a key are dropped.
pub fn merge(existing: Vec<Listing>, batch: impl IntoIterator<Item = Listing>) -> MergeOutcome {
    let mut seen: HashSet<String> = existing.iter().filter_map(Listing::identity_key).collect();
    let mut listings = existing;
    let mut added = 0;

    for listing in batch {
        let Some(key) = listing.identity_key() else {
            continue;
        };
        if seen.insert(key) {
            listings.push(listing);
            added += 1;
        }
    }

    MergeOutcome { listings, added }
}

/// Drops later duplicates (and keyless entries) from a stored collection.
pub fn dedup(listings: Vec<Listing>) -> Vec<Listing> {
    merge(Vec::new(), listings).listings
}
