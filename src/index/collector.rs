//! Index collection: walks a shape and gathers every per-field index into
//! dot-notation declarations.

use std::collections::BTreeMap;

use crate::schema::{NodeKind, ObjectNode, SchemaNode};

use super::declaration::IndexDeclaration;

/// Collects per-field declarations in tree order, followed by the compound
/// declarations verbatim.
///
/// A collection holds at most one text index, so per-field text keys are
/// combined into a single declaration at the position of the first one.
pub fn collect_indexes(shape: &ObjectNode, compound: &[IndexDeclaration]) -> Vec<IndexDeclaration> {
    let mut out = Vec::new();
    for (key, node) in shape.fields() {
        walk(node, key, &mut out);
    }
    let mut out = merge_text_fields(out);
    out.extend(compound.iter().cloned());
    out
}

/// Weights are unioned; every other option comes from the first text field.
fn merge_text_fields(declarations: Vec<IndexDeclaration>) -> Vec<IndexDeclaration> {
    let mut merged_at: Option<usize> = None;
    let mut out: Vec<IndexDeclaration> = Vec::with_capacity(declarations.len());
    for decl in declarations {
        match merged_at {
            Some(at) if decl.is_text() => {
                let target = &mut out[at];
                target.key.extend(decl.key);
                if let Some(weights) = decl.options.weights {
                    target
                        .options
                        .weights
                        .get_or_insert_with(BTreeMap::new)
                        .extend(weights);
                }
            }
            None if decl.is_text() => {
                merged_at = Some(out.len());
                out.push(decl);
            }
            _ => out.push(decl),
        }
    }
    out
}

fn walk(node: &SchemaNode, path: &str, out: &mut Vec<IndexDeclaration>) {
    if let Some(index) = node.field_index() {
        out.push(IndexDeclaration::single(
            path,
            index.direction,
            index.options.clone(),
        ));
    }

    match node.kind() {
        NodeKind::Optional(inner) | NodeKind::Nullable(inner) => walk(inner, path, out),
        NodeKind::DefaultProvided(node) => walk(node.inner(), path, out),
        NodeKind::CustomValidated(node) => walk(node.inner(), path, out),
        NodeKind::Object(object) => {
            for (key, child) in object.fields() {
                walk(child, &format!("{}.{}", path, key), out);
            }
        }
        // multikey: element indexes live on the array path itself
        NodeKind::Array(array) => walk(array.element(), path, out),
        NodeKind::Tuple(tuple) => {
            for (i, item) in tuple.items().iter().enumerate() {
                walk(item, &format!("{}.{}", path, i), out);
            }
        }
        NodeKind::Union(union) => {
            for variant in union.variants() {
                walk(variant, path, out);
            }
        }
        NodeKind::Number(_)
        | NodeKind::String(_)
        | NodeKind::Boolean(_)
        | NodeKind::Date(_)
        | NodeKind::ObjectId(_)
        | NodeKind::Decimal(_)
        | NodeKind::Binary(_) => {}
    }
}
