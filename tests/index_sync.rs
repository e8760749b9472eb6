//! Index Synchronization Tests
//!
//! Reconciliation of schema-declared indexes with a store:
//! - A second run with no schema change is a no-op
//! - Force mode re-verifies without recreating identical indexes
//! - Concurrent identical creation is tolerated, conflicting creation is not

use docshape::index::{
    sync_indexes, IndexDeclaration, IndexDirection, IndexError, IndexOptions, IndexStore,
    LiveIndex, MemoryIndexStore, StoreResult, SyncOptions, SyncReport,
};
use docshape::schema::{array, date, number, object, object_id, string, NodeExt, Schema};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn posts() -> Schema {
    Schema::new(
        "posts",
        object()
            .field("slug", string().unique())
            .field("author", string())
            .field("publishedAt", date().optional())
            .field("tags", array(string()).index(IndexDirection::Ascending))
            .field("body", string().text())
            .field(
                "meta",
                object().field("views", number().index(IndexDirection::Descending)),
            ),
    )
    .index(
        [
            ("author", IndexDirection::Ascending),
            ("publishedAt", IndexDirection::Descending),
        ],
        IndexOptions::new(),
    )
}

fn report(created: usize, dropped: usize, unchanged: usize) -> SyncReport {
    SyncReport {
        created,
        dropped,
        unchanged,
    }
}

/// Store whose listing lags behind its writes, as when another process
/// creates indexes between our list and create calls.
struct StaleListing {
    inner: MemoryIndexStore,
}

impl IndexStore for StaleListing {
    fn list_indexes(&self, collection: &str) -> StoreResult<Vec<LiveIndex>> {
        let live = self.inner.list_indexes(collection)?;
        Ok(live
            .into_iter()
            .filter(|index| index.declaration.is_primary())
            .collect())
    }

    fn create_indexes(&self, collection: &str, indexes: &[IndexDeclaration]) -> StoreResult<()> {
        self.inner.create_indexes(collection, indexes)
    }

    fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        self.inner.drop_index(collection, name)
    }

    fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        self.inner.collection_exists(collection)
    }

    fn create_collection(&self, collection: &str) -> StoreResult<()> {
        self.inner.create_collection(collection)
    }
}

// =============================================================================
// Collection
// =============================================================================

#[test]
fn test_declared_index_names() {
    let names: Vec<String> = posts().collect_indexes().iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        vec![
            "slug_1",
            "tags_1",
            "body_text",
            "meta.views_-1",
            "author_1_publishedAt_-1"
        ]
    );
}

#[test]
fn test_sync_creates_missing_collection() {
    let store = MemoryIndexStore::new();
    assert!(!store.collection_exists("posts").unwrap());

    let first = sync_indexes(&store, &posts(), SyncOptions::default()).unwrap();
    assert_eq!(first, report(5, 0, 0));
    assert!(store.collection_exists("posts").unwrap());
    assert_eq!(store.index_names("posts").unwrap()[0], "_id_");
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_second_sync_changes_nothing() {
    let store = MemoryIndexStore::new();
    let schema = posts();
    sync_indexes(&store, &schema, SyncOptions::default()).unwrap();

    let second = sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    assert_eq!(second, report(0, 0, 5));
}

#[test]
fn test_force_reverifies_without_recreating() {
    let store = MemoryIndexStore::new();
    let schema = posts();
    sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    let before = store.index_names("posts").unwrap();

    let forced = sync_indexes(&store, &schema, SyncOptions::forced()).unwrap();
    assert_eq!(forced, report(0, 0, 5));
    assert_eq!(store.index_names("posts").unwrap(), before);
}

#[test]
fn test_sync_options_from_config() {
    let options: SyncOptions = serde_json::from_value(json!({ "force": true })).unwrap();
    assert_eq!(options, SyncOptions::forced());
    let options: SyncOptions = serde_json::from_value(json!({})).unwrap();
    assert!(!options.force);
}

#[test]
fn test_indexed_id_is_satisfied_by_primary_index() {
    let schema = Schema::new(
        "events",
        object()
            .field("_id", object_id().index(IndexDirection::Ascending))
            .field("kind", string().index(IndexDirection::Ascending)),
    );
    let store = MemoryIndexStore::new();

    let first = sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    assert_eq!(first, report(1, 0, 1));

    let second = sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    assert_eq!(second, report(0, 0, 2));

    let forced = sync_indexes(&store, &schema, SyncOptions::forced()).unwrap();
    assert_eq!(forced, report(0, 0, 2));
    assert_eq!(store.index_names("events").unwrap(), vec!["_id_", "kind_1"]);
}

#[test]
fn test_several_text_fields_sync_as_one_index() {
    let schema = Schema::new(
        "pages",
        object()
            .field("title", string().text())
            .field("body", string().text()),
    );
    let store = MemoryIndexStore::new();

    let first = sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    assert_eq!(first, report(1, 0, 0));
    assert_eq!(
        store.index_names("pages").unwrap(),
        vec!["_id_", "title_text_body_text"]
    );
    assert_eq!(
        sync_indexes(&store, &schema, SyncOptions::default()).unwrap(),
        report(0, 0, 1)
    );
}

// =============================================================================
// Drift Tests
// =============================================================================

#[test]
fn test_extraneous_index_dropped_and_missing_created() {
    let store = MemoryIndexStore::new();
    let stale = IndexDeclaration::single("legacy", IndexDirection::Ascending, IndexOptions::new());
    store
        .insert_live("posts", LiveIndex::new(stale.name(), stale))
        .unwrap();

    let result = sync_indexes(&store, &posts(), SyncOptions::default()).unwrap();
    assert_eq!(result, report(5, 1, 0));
    assert!(!store
        .index_names("posts")
        .unwrap()
        .contains(&"legacy_1".to_string()));
}

#[test]
fn test_changed_options_replace_index() {
    let store = MemoryIndexStore::new();
    let plain = IndexDeclaration::single("slug", IndexDirection::Ascending, IndexOptions::new());
    store
        .insert_live("posts", LiveIndex::new(plain.name(), plain))
        .unwrap();

    let result = sync_indexes(&store, &posts(), SyncOptions::default()).unwrap();
    assert_eq!(result, report(5, 1, 0));

    let live = store.list_indexes("posts").unwrap();
    let slug = live.iter().find(|i| i.name == "slug_1").unwrap();
    assert_eq!(slug.declaration.options.unique, Some(true));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_identical_creation_folds_into_unchanged() {
    let store = StaleListing {
        inner: MemoryIndexStore::new(),
    };
    let schema = posts();
    sync_indexes(&store.inner, &schema, SyncOptions::default()).unwrap();

    // listing shows nothing, every create reports an identical index
    let result = sync_indexes(&store, &schema, SyncOptions::default()).unwrap();
    assert_eq!(result, report(0, 0, 5));
}

#[test]
fn test_concurrent_conflicting_creation_surfaces() {
    let store = StaleListing {
        inner: MemoryIndexStore::new(),
    };
    let other = IndexDeclaration::single("slug", IndexDirection::Ascending, IndexOptions::new());
    store
        .inner
        .insert_live("posts", LiveIndex::new(other.name(), other))
        .unwrap();

    let err = sync_indexes(&store, &posts(), SyncOptions::default()).unwrap_err();
    match err {
        IndexError::Conflict {
            collection, name, ..
        } => {
            assert_eq!(collection, "posts");
            assert_eq!(name, "slug_1");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_duplicate_declaration_rejected_at_sync() {
    let schema = Schema::new("users", object().field("email", string().unique())).index(
        [("email", IndexDirection::Ascending)],
        IndexOptions::new().unique(),
    );
    let store = MemoryIndexStore::new();
    let err = sync_indexes(&store, &schema, SyncOptions::default()).unwrap_err();
    assert_eq!(
        err,
        IndexError::DuplicateDeclaration {
            collection: "users".into(),
            name: "email_1".into(),
        }
    );
    // nothing was touched
    assert!(!store.collection_exists("users").unwrap());
}

#[test]
fn test_store_is_shareable_across_threads() {
    let store = std::sync::Arc::new(MemoryIndexStore::new());
    let schema = std::sync::Arc::new(posts());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let schema = schema.clone();
            std::thread::spawn(move || sync_indexes(store.as_ref(), &schema, SyncOptions::default()))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result.created + result.unchanged, 5);
        assert_eq!(result.dropped, 0);
    }
    assert_eq!(store.index_names("posts").unwrap().len(), 6);
}
