//! Document store collaborator
//!
//! The engine never talks to storage directly; index synchronization goes
//! through this trait. Implementations own their own timeout and retry
//! semantics.

use super::declaration::IndexDeclaration;
use super::errors::StoreResult;

/// An index as reported by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveIndex {
    pub name: String,
    pub declaration: IndexDeclaration,
}

impl LiveIndex {
    /// Pins the reported name into the declaration's options so canonical
    /// comparison sees the store's name.
    pub fn new(name: impl Into<String>, mut declaration: IndexDeclaration) -> Self {
        let name = name.into();
        declaration.options.name = Some(name.clone());
        Self { name, declaration }
    }
}

/// Index introspection and management on a collection-oriented store.
pub trait IndexStore: Send + Sync {
    /// Lists live indexes, including the implicit primary-key index.
    ///
    /// Returns `StoreError::NamespaceNotFound` if the collection does not
    /// exist yet.
    fn list_indexes(&self, collection: &str) -> StoreResult<Vec<LiveIndex>>;

    /// Creates indexes. An identical existing index yields
    /// `StoreError::IndexExists`; a same-name or same-key index with other
    /// options yields `StoreError::IndexConflict`.
    fn create_indexes(&self, collection: &str, indexes: &[IndexDeclaration]) -> StoreResult<()>;

    fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()>;

    fn collection_exists(&self, collection: &str) -> StoreResult<bool>;

    fn create_collection(&self, collection: &str) -> StoreResult<()>;
}
