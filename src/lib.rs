//! Treeq: Tregex-style queries over constituency trees
//!
//! Compiles a pattern language of node descriptions and binary tree
//! relations into lazy backtracking matchers over bracketed parse
//! trees.

pub mod env; // Shared match environment with commit/rollback
pub mod head; // Head finders and basic-category projection
pub mod matcher; // Lazy backtracking matcher
pub mod parser; // Pattern language parser
pub mod pattern; // Compiled pattern AST
pub mod penn; // Bracketed tree reading and writing
pub mod relation; // Binary node relation catalog
pub mod searcher; // End-to-end search (compile + match)
pub mod tree; // Arena tree data structure

// Re-exports for convenience
pub use env::MatchEnv;
pub use head::{HeadFinder, HeadSearch, TableHeadFinder, basic_category};
pub use matcher::{Match, Matches};
pub use parser::{PatternCompiler, PatternSyntaxError};
pub use pattern::{Description, Pattern, PatternNode};
pub use penn::{TreeParseError, TreeReader};
pub use relation::{LabelFilter, Relation, SharedHeadFinder};
pub use searcher::{SearchError, search, search_query};
pub use tree::{NodeId, Tree};

#[cfg(test)]
mod tests {
    use super::*;

    /// End-to-end: parse, compile, match, read bindings.
    #[test]
    fn test_crate_level_flow() {
        let tree = penn::parse(
            "(S (NP-SBJ (DT the) (NN dog)) (VP (VBZ chases) (NP (DT a) (NN cat))))",
        )
        .unwrap();
        let found = search_query(&tree, "VP < (NP=obj < NN)").unwrap();
        assert_eq!(found.len(), 1);
        let obj = found[0].get("obj").unwrap();
        assert_eq!(tree.label(obj), "NP");
        let words: Vec<&str> = tree.leaves(obj).map(|n| tree.label(n)).collect();
        assert_eq!(words, vec!["a", "cat"]);
    }
}
