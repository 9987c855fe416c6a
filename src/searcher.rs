//! Search entry points
//!
//! Thin convenience layer over [`Pattern::matches`]: `search` runs a
//! compiled pattern over a whole tree lazily, and `search_query`
//! compiles pattern text and collects every match.

use crate::matcher::{Match, Matches};
use crate::parser::PatternSyntaxError;
use crate::pattern::Pattern;
use crate::tree::Tree;
use thiserror::Error;

/// Error from the text-level search entry point
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Pattern(#[from] PatternSyntaxError),
}

/// Lazily enumerate all matches of `pattern` in `tree`
///
/// The pattern is tried at every node of the tree in pre-order,
/// starting from node 0 (the root of any parsed tree).
pub fn search<'a>(tree: &'a Tree, pattern: &'a Pattern) -> Matches<'a> {
    pattern.matches(tree, 0)
}

/// Compile `query` and collect all of its matches in `tree`
///
/// Convenience for one-off queries; compile once with
/// [`Pattern::compile`] and use [`search`] when running the same
/// pattern over many trees.
pub fn search_query(tree: &Tree, query: &str) -> Result<Vec<Match>, SearchError> {
    let pattern = Pattern::compile(query)?;
    Ok(search(tree, &pattern).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penn;

    #[test]
    fn test_search_query() {
        let tree = penn::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))").unwrap();
        let found = search_query(&tree, "NP < DT").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tree.label(found[0].node()), "NP");
        assert!(matches!(
            search_query(&tree, "NP <"),
            Err(SearchError::Pattern(_))
        ));
    }

    #[test]
    fn test_basic_scenarios() {
        let dog = penn::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))").unwrap();

        let found = search_query(&dog, "NP < DT").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tree_label(&dog, &found[0]), "NP");

        assert!(search_query(&dog, "NP !< DT").unwrap().is_empty());

        let found = search_query(&dog, "DT . NN").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tree_label(&dog, &found[0]), "DT");

        let found = search_query(&dog, "VP > S").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tree_label(&dog, &found[0]), "VP");
    }

    #[test]
    fn test_unbroken_domination_scenario() {
        let tree = penn::parse("(NP (NP (NNP John) (POS 's)) (NN book))").unwrap();
        // the chain from the outer NP down to NN runs through N-labeled
        // nodes only
        let found = search_query(&tree, "NP <+(/^N/) NN").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node(), 0);
    }

    #[test]
    fn test_backreference_scenario() {
        let tree = penn::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))").unwrap();
        // =obj resolves to the NN node itself, whose parent is NP, not
        // some other equal-labeled node
        let found = search_query(&tree, "NP < NN=obj < (DT $ =obj)").unwrap();
        assert_eq!(found.len(), 1);
        let obj = found[0].get("obj").unwrap();
        assert_eq!(tree.label(obj), "NN");
        assert!(search_query(&tree, "NP < NN=obj < (DT < =obj)").unwrap().is_empty());
    }

    #[test]
    fn test_idempotent_compile() {
        let tree = penn::parse("(S (NP (DT the) (NN dog)) (VP (VBZ barks)))").unwrap();
        let a = Pattern::compile("NP < DT=d").unwrap();
        let b = Pattern::compile("NP < DT=d").unwrap();
        let from_a: Vec<Match> = search(&tree, &a).collect();
        let from_b: Vec<Match> = search(&tree, &b).collect();
        assert_eq!(from_a, from_b);
    }

    fn tree_label<'a>(tree: &'a crate::tree::Tree, m: &Match) -> &'a str {
        tree.label(m.node())
    }

    #[test]
    fn test_search_reuses_compiled_pattern() {
        let pattern = Pattern::compile("NP << NN=head").unwrap();
        for text in [
            "(S (NP (NN dogs)))",
            "(S (NP (DT the) (NN cat)) (VP (VBZ sits)))",
        ] {
            let tree = penn::parse(text).unwrap();
            let found: Vec<Match> = search(&tree, &pattern).collect();
            assert_eq!(found.len(), 1);
            assert!(found[0].get("head").is_some());
        }
    }
}
