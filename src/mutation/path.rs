//! Dot-notation path resolution against a schema shape.

use crate::schema::{NodeKind, ObjectNode, SchemaNode, ValidationError, ValidationResult};

/// Outcome of resolving a field path.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPath<'a> {
    /// The addressed node with optional, nullable and default layers
    /// removed. Custom predicates stay attached.
    pub node: &'a SchemaNode,
    /// Some traversed layer permits absence
    pub is_optional: bool,
    /// Some traversed layer permits null
    pub is_nullable: bool,
}

/// Resolves `path` against `shape`.
///
/// Returns `Ok(None)` only for the empty path. Numeric segments and the
/// positional forms `$`, `$[]`, `$[id]` dereference arrays; a field name
/// applied to an array of objects addresses the element's field.
pub fn resolve_path<'a>(
    path: &str,
    shape: &'a ObjectNode,
) -> ValidationResult<Option<ResolvedPath<'a>>> {
    if path.is_empty() {
        return Ok(None);
    }

    let mut current: Option<&'a SchemaNode> = None;
    let mut is_optional = false;
    let mut is_nullable = false;
    let mut prefix = String::new();

    for segment in path.split('.') {
        let here = if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", prefix, segment)
        };

        let next = if is_array_segment(segment) {
            index_into(current, segment, &prefix)?
        } else {
            let object = match current {
                None => shape,
                Some(node) => {
                    let (object, element) = container_shape(node).ok_or_else(|| {
                        ValidationError::structural(format!(
                            "cannot access '{}' on non-object field at {}",
                            segment,
                            display_prefix(&prefix)
                        ))
                    })?;
                    if let Some(element) = element {
                        let (opt, null) = wrapper_flags(element);
                        is_optional |= opt;
                        is_nullable |= null;
                    }
                    object
                }
            };
            object
                .get(segment)
                .ok_or_else(|| ValidationError::unknown_field(&here))?
        };

        let (opt, null) = wrapper_flags(next);
        is_optional |= opt;
        is_nullable |= null;
        current = Some(strip_wrappers(next));
        prefix = here;
    }

    Ok(current.map(|node| ResolvedPath {
        node,
        is_optional,
        is_nullable,
    }))
}

fn is_array_segment(segment: &str) -> bool {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    segment == "$" || (segment.starts_with("$[") && segment.ends_with(']'))
}

fn index_into<'a>(
    current: Option<&'a SchemaNode>,
    segment: &str,
    prefix: &str,
) -> ValidationResult<&'a SchemaNode> {
    let not_array = || {
        ValidationError::structural(format!(
            "cannot use array index on non-array field at {}",
            display_prefix(prefix)
        ))
    };
    let base = current.map(SchemaNode::base).ok_or_else(not_array)?;
    match base.kind() {
        NodeKind::Array(array) => Ok(array.element()),
        NodeKind::Tuple(tuple) => {
            let position: usize = segment.parse().map_err(|_| {
                ValidationError::structural(format!(
                    "positional operator '{}' cannot address tuple at {}",
                    segment,
                    display_prefix(prefix)
                ))
            })?;
            tuple.items().get(position).ok_or_else(|| {
                ValidationError::structural(format!(
                    "tuple position {} out of range at {}",
                    position,
                    display_prefix(prefix)
                ))
            })
        }
        _ => Err(not_array()),
    }
}

/// Object shape addressed by a field segment: the node itself, or the
/// element of an array of objects (returned alongside for its flags).
fn container_shape(node: &SchemaNode) -> Option<(&ObjectNode, Option<&SchemaNode>)> {
    let base = node.base();
    match base.kind() {
        NodeKind::Object(object) => Some((object, None)),
        NodeKind::Array(array) => array
            .element()
            .as_object()
            .map(|object| (object, Some(array.element()))),
        _ => None,
    }
}

/// Optional and nullable flags over every wrapper layer.
fn wrapper_flags(node: &SchemaNode) -> (bool, bool) {
    let mut flags = (false, false);
    let mut layer = Some(node);
    while let Some(current) = layer {
        match current.kind() {
            NodeKind::Optional(_) => flags.0 = true,
            NodeKind::Nullable(_) => flags.1 = true,
            _ => {}
        }
        layer = current.inner();
    }
    flags
}

fn strip_wrappers(node: &SchemaNode) -> &SchemaNode {
    let mut current = node;
    loop {
        match current.kind() {
            NodeKind::Optional(inner) | NodeKind::Nullable(inner) => current = &**inner,
            NodeKind::DefaultProvided(default) => current = default.inner(),
            _ => return current,
        }
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        "$root"
    } else {
        prefix
    }
}
