//! Mutation subsystem for docshape
//!
//! Checks update-operator documents against a schema before they reach the
//! store, so a write can never leave a document in a shape the schema
//! rejects.
//!
//! # Design Principles
//!
//! - Closed operator set: an unknown operator is an error, never a no-op
//! - Every field path must resolve against the schema
//! - All-or-nothing: the first failure aborts the whole update

mod operators;
mod path;
mod validator;

pub use operators::UpdateOperator;
pub use path::{resolve_path, ResolvedPath};
pub use validator::validate_mutation;
