//! Compiled pattern AST
//!
//! A [`Pattern`] is the immutable result of compiling pattern text: a
//! tree of [`PatternNode`]s, each carrying a node description and a
//! conjunction of relation-guarded child links. Compiled patterns are
//! freely shared across matches; all mutable match state lives in the
//! match environment.

use crate::matcher::Matches;
use crate::parser::{PatternCompiler, PatternSyntaxError};
use crate::relation::Relation;
use crate::tree::{NodeId, Tree};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Basic-category projection applied by link descriptions
pub type CategoryFn = fn(&str) -> &str;

/// A compiled regex description with group-to-variable bindings
#[derive(Clone)]
pub struct DescriptionRegex {
    regex: Regex,
    bindings: Vec<(usize, String)>,
}

impl DescriptionRegex {
    pub(crate) fn new(regex: Regex, bindings: Vec<(usize, String)>) -> Self {
        Self { regex, bindings }
    }

    /// Unanchored search against a label
    pub fn is_match(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// Declared (group, variable) pairs
    pub fn bindings(&self) -> &[(usize, String)] {
        &self.bindings
    }

    /// Capture the declared variables from a label
    ///
    /// `None` if the regex does not match or a declared group did not
    /// participate in the match.
    pub fn captured_bindings(&self, label: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(label)?;
        let mut out = Vec::with_capacity(self.bindings.len());
        for (group, var) in &self.bindings {
            let m = caps.get(*group)?;
            out.push((var.clone(), m.as_str().to_string()));
        }
        Some(out)
    }
}

impl PartialEq for DescriptionRegex {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.bindings == other.bindings
    }
}

impl fmt::Debug for DescriptionRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DescriptionRegex")
            .field(&self.regex.as_str())
            .field(&self.bindings)
            .finish()
    }
}

/// The label constraint of one pattern node
#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    /// `__` or `*`: matches any node
    Wildcard,
    /// Bare or quoted literal alternation, anchored exact match
    Literal(Vec<String>),
    /// `/regex/` with optional `#N%var` bindings, unanchored search
    Regex(DescriptionRegex),
    /// `=name`: the node already bound to `name`, by identity
    Reference(String),
    /// `~name`: same basic category as the node bound to `name`
    Link(String),
}

impl Description {
    /// Label-only test for the self-contained variants
    ///
    /// Reference and link descriptions need the match environment and
    /// are handled by the matcher; they return `None` here.
    pub(crate) fn matches_label(&self, label: &str) -> Option<bool> {
        match self {
            Description::Wildcard => Some(true),
            Description::Literal(alts) => Some(alts.iter().any(|a| a == label)),
            Description::Regex(re) => Some(re.is_match(label)),
            Description::Reference(_) | Description::Link(_) => None,
        }
    }
}

/// A relation-guarded child of a pattern node
///
/// All links of one node must hold conjunctively. A link is either
/// plain, negated (`!rel`: no candidate completion may exist), or
/// optional (`?rel`: vacuously satisfied when none exists); never both
/// negated and optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub relation: Arc<Relation>,
    pub negated: bool,
    pub optional: bool,
    pub child: PatternNode,
}

/// One node of a compiled pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PatternNode {
    /// Label constraint
    pub description: Description,
    /// `!` before the description: the constraint is inverted
    pub negated: bool,
    /// Capture name bound on every accepted candidate
    pub name: Option<String>,
    /// Conjunction of relation links to child pattern nodes
    pub links: Vec<Link>,
}

/// A compiled, immutable tree pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) root: PatternNode,
    pub(crate) category: CategoryFn,
    pub(crate) source: String,
}

impl Pattern {
    /// Compile pattern text with the default configuration
    ///
    /// Head relations need a head finder and are rejected here; use
    /// [`PatternCompiler`] to supply one.
    pub fn compile(text: &str) -> Result<Pattern, PatternSyntaxError> {
        PatternCompiler::new().compile(text)
    }

    /// The pattern text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the compiled AST
    pub fn root(&self) -> &PatternNode {
        &self.root
    }

    /// Lazily enumerate all matches in the subtree rooted at `root`
    ///
    /// The pattern is tried at every node of the subtree in pre-order;
    /// each yielded [`crate::Match`] is one distinct binding.
    pub fn matches<'a>(&'a self, tree: &'a Tree, root: NodeId) -> Matches<'a> {
        Matches::new(tree, self, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_bindings() {
        let re = DescriptionRegex::new(
            Regex::new("^(NP|PP)-(SBJ|TMP)$").unwrap(),
            vec![(1, "cat".to_string()), (2, "func".to_string())],
        );
        let caps = re.captured_bindings("NP-TMP").unwrap();
        assert_eq!(
            caps,
            vec![
                ("cat".to_string(), "NP".to_string()),
                ("func".to_string(), "TMP".to_string())
            ]
        );
        assert!(re.captured_bindings("VP").is_none());
    }

    #[test]
    fn test_unparticipating_group_rejects() {
        let re = DescriptionRegex::new(
            Regex::new("^(?:(NP)|VP)$").unwrap(),
            vec![(1, "cat".to_string())],
        );
        assert!(re.captured_bindings("NP").is_some());
        // matches the regex, but group 1 captured nothing
        assert!(re.captured_bindings("VP").is_none());
    }

    #[test]
    fn test_description_label_matching() {
        let lit = Description::Literal(vec!["NP".to_string(), "PP".to_string()]);
        assert_eq!(lit.matches_label("NP"), Some(true));
        assert_eq!(lit.matches_label("NPS"), Some(false));

        let re = Description::Regex(DescriptionRegex::new(Regex::new("^N").unwrap(), vec![]));
        assert_eq!(re.matches_label("NN"), Some(true));
        assert_eq!(re.matches_label("VB"), Some(false));

        assert_eq!(Description::Wildcard.matches_label("anything"), Some(true));
        assert_eq!(Description::Reference("x".to_string()).matches_label("NP"), None);
    }

    #[test]
    fn test_unanchored_regex_description() {
        let re = DescriptionRegex::new(Regex::new("BJ").unwrap(), vec![]);
        assert!(re.is_match("NP-SBJ"));
        let anchored = DescriptionRegex::new(Regex::new("^NP$").unwrap(), vec![]);
        assert!(anchored.is_match("NP"));
        assert!(!anchored.is_match("NP-SBJ"));
    }
}
