//! Reconciliation of wanted vs live index sets by canonical fingerprint.

use std::collections::HashSet;

use super::declaration::IndexDeclaration;
use super::store::LiveIndex;

/// Instructions produced by comparing wanted and live indexes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDiff {
    /// Wanted but not live
    pub to_create: Vec<IndexDeclaration>,
    /// Live but not wanted (never the primary-key index)
    pub to_drop: Vec<LiveIndex>,
    /// Wanted and live
    pub unchanged: Vec<IndexDeclaration>,
}

impl IndexDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_drop.is_empty()
    }
}

/// Compares wanted declarations against the store's live set.
///
/// A wanted `{ _id: 1 }` declaration is satisfied by the store's implicit
/// primary-key index and is never submitted for creation.
pub fn diff_indexes(wanted: &[IndexDeclaration], live: &[LiveIndex]) -> IndexDiff {
    let live_prints: HashSet<String> = live.iter().map(|l| l.declaration.fingerprint()).collect();
    let wanted_prints: HashSet<String> = wanted.iter().map(IndexDeclaration::fingerprint).collect();

    let mut diff = IndexDiff::default();
    for decl in wanted {
        if decl.is_primary() || live_prints.contains(&decl.fingerprint()) {
            diff.unchanged.push(decl.clone());
        } else {
            diff.to_create.push(decl.clone());
        }
    }
    for index in live {
        if index.declaration.is_primary() {
            continue;
        }
        if !wanted_prints.contains(&index.declaration.fingerprint()) {
            diff.to_drop.push(index.clone());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexDirection, IndexOptions};

    fn decl(path: &str) -> IndexDeclaration {
        IndexDeclaration::single(path, IndexDirection::Ascending, IndexOptions::new())
    }

    fn live(path: &str) -> LiveIndex {
        let d = decl(path);
        LiveIndex::new(d.name(), d)
    }

    #[test]
    fn test_identical_sets_are_unchanged() {
        let wanted = vec![decl("a"), decl("b")];
        let current = vec![live("_id"), live("a"), live("b")];
        let diff = diff_indexes(&wanted, &current);
        assert!(diff.is_empty());
        assert_eq!(diff.unchanged.len(), 2);
    }

    #[test]
    fn test_create_and_drop() {
        let wanted = vec![decl("a"), decl("c")];
        let current = vec![live("_id"), live("a"), live("b")];
        let diff = diff_indexes(&wanted, &current);
        assert_eq!(diff.to_create, vec![decl("c")]);
        assert_eq!(diff.to_drop.len(), 1);
        assert_eq!(diff.to_drop[0].name, "b_1");
    }

    #[test]
    fn test_primary_never_dropped() {
        let diff = diff_indexes(&[], &[live("_id")]);
        assert!(diff.to_drop.is_empty());
    }

    #[test]
    fn test_wanted_primary_matches_implicit_index() {
        let primary = LiveIndex::new("_id_", decl("_id"));
        let diff = diff_indexes(&[decl("_id"), decl("a")], &[primary]);
        assert_eq!(diff.unchanged, vec![decl("_id")]);
        assert_eq!(diff.to_create, vec![decl("a")]);
        assert!(diff.to_drop.is_empty());
    }

    #[test]
    fn test_changed_options_recreate() {
        let wanted = vec![IndexDeclaration::single(
            "a",
            IndexDirection::Ascending,
            IndexOptions::new().unique(),
        )];
        let diff = diff_indexes(&wanted, &[live("a")]);
        assert_eq!(diff.to_create.len(), 1);
        assert_eq!(diff.to_drop.len(), 1);
    }
}
