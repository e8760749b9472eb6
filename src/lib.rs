//! docshape - schema-driven document validation
//!
//! Declarative schemas validate whole documents for creation, partial
//! documents for updates, and update-operator documents for mutations. The
//! same schema tree carries per-field index declarations that can be
//! reconciled with a document store.

pub mod index;
pub mod mutation;
pub mod schema;
pub mod value;
