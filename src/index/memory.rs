//! In-memory index store.
//!
//! Emulates the store's index semantics closely enough to exercise
//! synchronization: collections must exist before indexes are created, a
//! new collection carries the implicit `_id_` index, identical creations
//! report `IndexExists`, and same-name or same-key creations with other
//! options report `IndexConflict`. At most one text index may exist per
//! collection.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::declaration::{IndexDeclaration, IndexDirection, IndexOptions};
use super::errors::{StoreError, StoreResult};
use super::store::{IndexStore, LiveIndex};

const PRIMARY_INDEX_NAME: &str = "_id_";

/// Thread-safe in-memory implementation of [`IndexStore`].
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    collections: RwLock<BTreeMap<String, Vec<LiveIndex>>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a live index directly, bypassing conflict checks. Creates
    /// the collection if needed.
    pub fn insert_live(&self, collection: &str, index: LiveIndex) -> StoreResult<()> {
        let mut collections = self.write()?;
        collections
            .entry(collection.to_string())
            .or_insert_with(primary_only)
            .push(index);
        Ok(())
    }

    /// Names of the live indexes on `collection`, in creation order.
    pub fn index_names(&self, collection: &str) -> StoreResult<Vec<String>> {
        let collections = self.read()?;
        let indexes = collections
            .get(collection)
            .ok_or_else(|| StoreError::NamespaceNotFound(collection.to_string()))?;
        Ok(indexes.iter().map(|i| i.name.clone()).collect())
    }

    fn read(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<LiveIndex>>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Other("index store lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<LiveIndex>>>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Other("index store lock poisoned".into()))
    }
}

fn primary_only() -> Vec<LiveIndex> {
    let key = IndexDeclaration::single("_id", IndexDirection::Ascending, IndexOptions::new());
    vec![LiveIndex::new(PRIMARY_INDEX_NAME, key)]
}

fn same_key(a: &IndexDeclaration, b: &IndexDeclaration) -> bool {
    a.key.len() == b.key.len() && a.key.iter().eq(b.key.iter())
}

impl IndexStore for MemoryIndexStore {
    fn list_indexes(&self, collection: &str) -> StoreResult<Vec<LiveIndex>> {
        let collections = self.read()?;
        collections
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::NamespaceNotFound(collection.to_string()))
    }

    fn create_indexes(&self, collection: &str, indexes: &[IndexDeclaration]) -> StoreResult<()> {
        let mut collections = self.write()?;
        let live = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NamespaceNotFound(collection.to_string()))?;

        for decl in indexes {
            let candidate = LiveIndex::new(decl.name(), decl.clone());
            let fingerprint = candidate.declaration.fingerprint();

            if let Some(existing) = live.iter().find(|l| l.name == candidate.name) {
                if existing.declaration.fingerprint() == fingerprint {
                    return Err(StoreError::IndexExists(candidate.name));
                }
                return Err(StoreError::IndexConflict {
                    name: candidate.name,
                    reason: "an index with the same name has different options".into(),
                });
            }
            if let Some(existing) = live
                .iter()
                .find(|l| same_key(&l.declaration, &candidate.declaration))
            {
                return Err(StoreError::IndexConflict {
                    name: candidate.name,
                    reason: format!("an index with the same key exists as '{}'", existing.name),
                });
            }
            if candidate.declaration.is_text() {
                if let Some(existing) = live.iter().find(|l| l.declaration.is_text()) {
                    return Err(StoreError::IndexConflict {
                        name: candidate.name,
                        reason: format!("a text index already exists as '{}'", existing.name),
                    });
                }
            }
            live.push(candidate);
        }
        Ok(())
    }

    fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        let mut collections = self.write()?;
        let live = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NamespaceNotFound(collection.to_string()))?;
        if name == PRIMARY_INDEX_NAME {
            return Err(StoreError::Other("cannot drop the _id index".into()));
        }
        let before = live.len();
        live.retain(|l| l.name != name);
        if live.len() == before {
            return Err(StoreError::IndexNotFound(name.to_string()));
        }
        Ok(())
    }

    fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(collection))
    }

    fn create_collection(&self, collection: &str) -> StoreResult<()> {
        self.write()?
            .entry(collection.to_string())
            .or_insert_with(primary_only);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> IndexDeclaration {
        IndexDeclaration::single("email", IndexDirection::Ascending, IndexOptions::new().unique())
    }

    #[test]
    fn test_missing_collection_is_distinguishable() {
        let store = MemoryIndexStore::new();
        assert!(matches!(
            store.list_indexes("users"),
            Err(StoreError::NamespaceNotFound(_))
        ));
        assert!(matches!(
            store.create_indexes("users", &[email()]),
            Err(StoreError::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn test_new_collection_has_primary_index() {
        let store = MemoryIndexStore::new();
        store.create_collection("users").unwrap();
        assert_eq!(store.index_names("users").unwrap(), vec!["_id_"]);
    }

    #[test]
    fn test_identical_create_reports_exists() {
        let store = MemoryIndexStore::new();
        store.create_collection("users").unwrap();
        store.create_indexes("users", &[email()]).unwrap();
        assert_eq!(
            store.create_indexes("users", &[email()]),
            Err(StoreError::IndexExists("email_1".into()))
        );
    }

    #[test]
    fn test_conflicting_create_reports_conflict() {
        let store = MemoryIndexStore::new();
        store.create_collection("users").unwrap();
        store.create_indexes("users", &[email()]).unwrap();

        let plain = IndexDeclaration::single("email", IndexDirection::Ascending, IndexOptions::new());
        assert!(matches!(
            store.create_indexes("users", &[plain]),
            Err(StoreError::IndexConflict { .. })
        ));

        let renamed = IndexDeclaration::single(
            "email",
            IndexDirection::Ascending,
            IndexOptions::new().unique().named("by_email"),
        );
        assert!(matches!(
            store.create_indexes("users", &[renamed]),
            Err(StoreError::IndexConflict { .. })
        ));
    }

    #[test]
    fn test_single_text_index_per_collection() {
        let store = MemoryIndexStore::new();
        store.create_collection("posts").unwrap();
        let title = IndexDeclaration::single("title", IndexDirection::Text, IndexOptions::new());
        let body = IndexDeclaration::single("body", IndexDirection::Text, IndexOptions::new());
        store.create_indexes("posts", &[title]).unwrap();
        assert!(matches!(
            store.create_indexes("posts", &[body]),
            Err(StoreError::IndexConflict { .. })
        ));
    }

    #[test]
    fn test_drop_index() {
        let store = MemoryIndexStore::new();
        store.create_collection("users").unwrap();
        store.create_indexes("users", &[email()]).unwrap();
        store.drop_index("users", "email_1").unwrap();
        assert_eq!(
            store.drop_index("users", "email_1"),
            Err(StoreError::IndexNotFound("email_1".into()))
        );
        assert!(store.drop_index("users", "_id_").is_err());
    }
}
