//! Head selection and category projection
//!
//! Head relations (`<#`, `>#`, `<<#`, `>>#`) are parameterized by an
//! external head-selection rule chosen per language or treebank
//! convention. The matcher only needs [`HeadFinder::determine_head`];
//! a small table-driven implementation is provided for common use.
//!
//! The basic-category projection strips functional and indexing
//! decorations from labels (`NP-SBJ` to `NP`) and is used by the link
//! description variant (`~name`).

use crate::tree::{NodeId, Tree};
use rustc_hash::FxHashMap;

/// Chooses the lexical head child of a phrase node
pub trait HeadFinder {
    /// Head child of `node`, or `None` when no rule applies
    ///
    /// Returning `None` for a non-leaf node is not an error: the node
    /// simply stands in no head relation.
    fn determine_head(&self, tree: &Tree, node: NodeId) -> Option<NodeId>;
}

/// Which end of the child list a head rule scans from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadSearch {
    /// Scan children left to right
    Left,
    /// Scan children right to left
    Right,
}

#[derive(Debug, Clone)]
struct HeadRule {
    direction: HeadSearch,
    categories: Vec<String>,
}

/// Table-driven head finder
///
/// Each rule maps a parent basic category to a scan direction and an
/// ordered preference list of child basic categories. The first
/// preferred category found wins; if none is present, the rule falls
/// back to the first child in scan direction. Nodes with no rule have
/// no head.
#[derive(Debug, Clone, Default)]
pub struct TableHeadFinder {
    rules: FxHashMap<String, HeadRule>,
}

impl TableHeadFinder {
    /// Create a finder with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `parent`, returning self for chaining
    pub fn rule(mut self, parent: &str, direction: HeadSearch, categories: &[&str]) -> Self {
        self.rules.insert(
            parent.to_string(),
            HeadRule {
                direction,
                categories: categories.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }
}

impl HeadFinder for TableHeadFinder {
    fn determine_head(&self, tree: &Tree, node: NodeId) -> Option<NodeId> {
        if tree.is_leaf(node) {
            return None;
        }
        let rule = self.rules.get(basic_category(tree.label(node)))?;
        let children = tree.children(node);
        let scan = |cat: Option<&str>| -> Option<NodeId> {
            let mut it = children.iter().copied();
            let found = match rule.direction {
                HeadSearch::Left => it.find(|&c| {
                    cat.is_none_or(|want| basic_category(tree.label(c)) == want)
                }),
                HeadSearch::Right => it.rfind(|&c| {
                    cat.is_none_or(|want| basic_category(tree.label(c)) == want)
                }),
            };
            found
        };
        for cat in &rule.categories {
            if let Some(c) = scan(Some(cat)) {
                return Some(c);
            }
        }
        scan(None)
    }
}

/// Strip functional tags, coindexing, and gap markers from a label
///
/// Everything from the first `-`, `=`, or `#` on is dropped, except
/// that labels starting with `-` (like `-NONE-`) are kept whole.
pub fn basic_category(label: &str) -> &str {
    if label.starts_with('-') {
        return label;
    }
    match label.find(['-', '=', '#']) {
        Some(idx) => &label[..idx],
        None => label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penn;

    #[test]
    fn test_basic_category() {
        assert_eq!(basic_category("NP-SBJ"), "NP");
        assert_eq!(basic_category("NP-SBJ-1"), "NP");
        assert_eq!(basic_category("NP=2"), "NP");
        assert_eq!(basic_category("S#1"), "S");
        assert_eq!(basic_category("VP"), "VP");
        assert_eq!(basic_category("-NONE-"), "-NONE-");
    }

    #[test]
    fn test_table_head_finder() {
        let tree = penn::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))").unwrap();
        let finder = TableHeadFinder::new()
            .rule("S", HeadSearch::Left, &["VP"])
            .rule("NP", HeadSearch::Right, &["NN", "NNS"])
            .rule("VP", HeadSearch::Left, &["VBZ", "VBD", "VB"]);

        let s = 0;
        let vp = tree
            .children(s)
            .iter()
            .copied()
            .find(|&c| tree.label(c) == "VP")
            .unwrap();
        let np = tree.children(s)[0];

        assert_eq!(tree.label(finder.determine_head(&tree, s).unwrap()), "VP");
        assert_eq!(tree.label(finder.determine_head(&tree, np).unwrap()), "NN");
        assert_eq!(tree.label(finder.determine_head(&tree, vp).unwrap()), "VBZ");
    }

    #[test]
    fn test_fallback_and_missing_rule() {
        let tree = penn::parse("(NP (FW foo) (FW bar))").unwrap();
        let finder = TableHeadFinder::new().rule("NP", HeadSearch::Right, &["NN"]);
        // no NN child: falls back to rightmost child
        let head = finder.determine_head(&tree, 0).unwrap();
        assert_eq!(tree.label(head), "FW");
        assert_eq!(tree.children(0)[1], head);
        // no rule for FW nodes, and leaves never have heads
        assert_eq!(finder.determine_head(&tree, tree.children(0)[0]), None);
    }
}
