//! Index synchronization errors

use thiserror::Error;

/// Result type for store collaborator calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The collection does not exist yet
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// An identical index already exists
    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// An index with the same name or key but different options exists
    #[error("Index conflict on {name}: {reason}")]
    IndexConflict { name: String, reason: String },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Store error: {0}")]
    Other(String),
}

/// Result type for index synchronization
pub type IndexResult<T> = Result<T, IndexError>;

/// Index synchronization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The schema declares the same index twice
    #[error("Duplicate index declaration on {collection}: {name}")]
    DuplicateDeclaration { collection: String, name: String },

    /// A live index conflicts with a declared one
    #[error("Conflicting index on {collection}: {name}: {reason}")]
    Conflict {
        collection: String,
        name: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
