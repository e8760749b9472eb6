//! Index synchronization against the store.
//!
//! Read-then-write without a transaction: concurrent synchronizations of the
//! same collection may race. An identical index created by someone else in
//! between is folded into `unchanged`; a conflicting one is surfaced.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::schema::Schema;

use super::declaration::IndexDeclaration;
use super::diff::diff_indexes;
use super::errors::{IndexError, IndexResult, StoreError};
use super::store::{IndexStore, LiveIndex};

/// Synchronization options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SyncOptions {
    /// Re-submit every wanted index, not just the missing ones. Identical
    /// live indexes are left in place.
    #[serde(default)]
    pub force: bool,
}

impl SyncOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Outcome counts of one synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub dropped: usize,
    pub unchanged: usize,
}

/// Brings the store's indexes for the schema's collection in line with the
/// schema's declarations.
pub fn sync_indexes(
    store: &dyn IndexStore,
    schema: &Schema,
    options: SyncOptions,
) -> IndexResult<SyncReport> {
    let collection = schema.collection();
    let wanted = schema.collect_indexes();
    reject_duplicates(collection, wanted)?;

    let live = list_or_create(store, collection)?;
    let diff = diff_indexes(wanted, &live);
    let mut report = SyncReport::default();

    for index in &diff.to_drop {
        match store.drop_index(collection, &index.name) {
            Ok(()) => {
                debug!(collection, index = %index.name, "dropped index");
                report.dropped += 1;
            }
            Err(StoreError::IndexNotFound(_)) => {
                warn!(collection, index = %index.name, "index already dropped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let already_live: HashSet<String> = diff.unchanged.iter().map(IndexDeclaration::fingerprint).collect();
    let submit: Vec<&IndexDeclaration> = if options.force {
        wanted.iter().filter(|d| !d.is_primary()).collect()
    } else {
        diff.to_create.iter().collect()
    };
    report.unchanged += if options.force {
        // primary index is never resubmitted
        diff.unchanged.iter().filter(|d| d.is_primary()).count()
    } else {
        diff.unchanged.len()
    };

    for decl in submit {
        let name = decl.name();
        let was_live = already_live.contains(&decl.fingerprint());
        match store.create_indexes(collection, std::slice::from_ref(decl)) {
            Ok(()) if was_live => {
                debug!(collection, index = %name, "index verified");
                report.unchanged += 1;
            }
            Ok(()) => {
                debug!(collection, index = %name, "created index");
                report.created += 1;
            }
            Err(StoreError::IndexExists(_)) => {
                if !was_live {
                    warn!(collection, index = %name, "index created concurrently");
                }
                report.unchanged += 1;
            }
            Err(StoreError::IndexConflict { name, reason }) => {
                return Err(IndexError::Conflict {
                    collection: collection.to_string(),
                    name,
                    reason,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        collection,
        created = report.created,
        dropped = report.dropped,
        unchanged = report.unchanged,
        force = options.force,
        "index sync complete"
    );
    Ok(report)
}

fn reject_duplicates(collection: &str, wanted: &[IndexDeclaration]) -> IndexResult<()> {
    let mut seen = HashSet::new();
    for decl in wanted {
        if !seen.insert(decl.fingerprint()) {
            return Err(IndexError::DuplicateDeclaration {
                collection: collection.to_string(),
                name: decl.name(),
            });
        }
    }
    Ok(())
}

fn list_or_create(store: &dyn IndexStore, collection: &str) -> IndexResult<Vec<LiveIndex>> {
    match store.list_indexes(collection) {
        Ok(live) => Ok(live),
        Err(StoreError::NamespaceNotFound(_)) => {
            if !store.collection_exists(collection)? {
                info!(collection, "creating collection");
                store.create_collection(collection)?;
            }
            Ok(store.list_indexes(collection)?)
        }
        Err(e) => Err(e.into()),
    }
}
