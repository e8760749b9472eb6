//! Schema subsystem for docshape
//!
//! A schema is a tree of typed nodes. Every node can validate a complete
//! value (`parse`) or a partial one (`parse_for_update`), and may carry
//! index metadata for the index subsystem.
//!
//! # Design Principles
//!
//! - Closed node set: a fixed enum, dispatched by match
//! - Wrappers (optional, nullable, default, custom) compose in any order
//! - Absent and null are distinct
//! - Update validation never fills in defaults
//!
//! # Invariants
//!
//! - `parse` output re-parses to itself
//! - Error messages carry the path from the root to the offending value

mod composite;
mod errors;
mod node;
mod primitives;
mod root;

pub use composite::{ArrayNode, ObjectNode, TupleNode, UnionNode};
pub use errors::{ValidationError, ValidationErrorCode, ValidationResult};
pub use node::{
    array, binary, boolean, date, decimal, number, object, object_id, string, tuple, union,
    CustomNode, DefaultNode, DefaultValue, NodeExt, NodeKind, NodeType, Parse, SchemaNode,
};
pub use primitives::{
    BinaryNode, BooleanNode, DateNode, DecimalNode, NumberNode, ObjectIdNode, StringNode,
};
pub use root::{Schema, SchemaOptions, TimestampFields, ID_FIELD};
