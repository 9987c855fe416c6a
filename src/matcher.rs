//! Lazy backtracking pattern matcher
//!
//! Each pattern node gets a resumable [`NodeMatcher`]: it walks the
//! candidate nodes produced by its relation's lazy search, accepts
//! those whose description holds, and for each accepted candidate
//! enumerates the satisfying configurations of its child links as a
//! resumable conjunction. When the rightmost child link runs out of
//! configurations, its left neighbor is resumed and everything to the
//! right restarts fresh. All bindings are committed to the shared
//! [`MatchEnv`] on acceptance and rolled back on retreat, so the
//! environment always reflects exactly the configurations currently
//! held.
//!
//! [`Matches`] drives a matcher over every start node of a subtree in
//! pre-order and yields each distinct result once.

use crate::env::{Commit, MatchEnv};
use crate::pattern::{CategoryFn, Description, Pattern, PatternNode};
use crate::relation::Relation;
use crate::tree::{NodeId, PreOrder, Tree};
use rustc_hash::{FxHashMap, FxHashSet};

/// Seeds the top-level matcher: its sole candidate is the start node.
static START: Relation = Relation::Root;

/// One successful pattern match
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    node: NodeId,
    names: FxHashMap<String, NodeId>,
    vars: FxHashMap<String, String>,
}

impl Match {
    /// The tree node the whole pattern matched at
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Node captured under `name`, if the pattern bound it
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// String captured into variable `name` by a regex group binding
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// All name bindings, in no particular order
    pub fn names(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.names.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Resumable matcher for one pattern node
///
/// `matches` yields `true` once per satisfying configuration. While it
/// returns `true`, the configuration's bindings are live in the
/// environment; when it returns `false`, everything this matcher
/// committed has been rolled back.
struct NodeMatcher<'a> {
    tree: &'a Tree,
    root: NodeId,
    category: CategoryFn,
    pattern: &'a PatternNode,
    negated: bool,
    optional: bool,
    candidates: Box<dyn Iterator<Item = NodeId> + 'a>,
    current: Option<(NodeId, Commit)>,
    children: Vec<NodeMatcher<'a>>,
    children_started: bool,
    found_any: bool,
    vacuous_done: bool,
    neg_done: bool,
}

impl<'a> NodeMatcher<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        tree: &'a Tree,
        root: NodeId,
        category: CategoryFn,
        pattern: &'a PatternNode,
        relation: &'a Relation,
        negated: bool,
        optional: bool,
        anchor: NodeId,
    ) -> Self {
        debug_assert!(!(negated && optional));
        Self {
            tree,
            root,
            category,
            pattern,
            negated,
            optional,
            candidates: relation.search(tree, anchor, root),
            current: None,
            children: Vec::new(),
            children_started: false,
            found_any: false,
            vacuous_done: false,
            neg_done: false,
        }
    }

    fn start(tree: &'a Tree, root: NodeId, pattern: &'a Pattern, node: NodeId) -> Self {
        Self::new(
            tree,
            root,
            pattern.category,
            &pattern.root,
            &START,
            false,
            false,
            node,
        )
    }

    /// Advance to the next satisfying configuration
    fn matches(&mut self, env: &mut MatchEnv) -> bool {
        if self.negated {
            return self.matches_negated(env);
        }
        if self.matches_positive(env) {
            self.found_any = true;
            return true;
        }
        if self.optional && !self.vacuous_done {
            self.vacuous_done = true;
            // vacuous success, exactly once and only if nothing real
            // ever matched
            return !self.found_any;
        }
        false
    }

    /// A negated link succeeds exactly once, iff the positive matcher
    /// has no configuration at all; any bindings a probe made are
    /// unwound immediately.
    fn matches_negated(&mut self, env: &mut MatchEnv) -> bool {
        if self.neg_done {
            return false;
        }
        self.neg_done = true;
        if self.matches_positive(env) {
            self.unwind(env);
            false
        } else {
            true
        }
    }

    fn matches_positive(&mut self, env: &mut MatchEnv) -> bool {
        loop {
            if self.current.is_some() {
                if self.next_child_config(env) {
                    return true;
                }
                // candidate exhausted; retreat
                if let Some((_, commit)) = self.current.take() {
                    env.rollback(commit);
                }
            }
            match self.next_candidate(env) {
                Some((node, commit)) => {
                    self.current = Some((node, commit));
                    self.reset_children(node);
                }
                None => return false,
            }
        }
    }

    /// Pull candidates from the relation search until one passes the
    /// description, committing its bindings.
    fn next_candidate(&mut self, env: &mut MatchEnv) -> Option<(NodeId, Commit)> {
        while let Some(node) = self.candidates.next() {
            if let Some(commit) = self.accept(node, env) {
                return Some((node, commit));
            }
        }
        None
    }

    /// Test the description against one candidate; on success the
    /// returned commit holds the name binding and any variable writes.
    fn accept(&mut self, node: NodeId, env: &mut MatchEnv) -> Option<Commit> {
        let label = self.tree.label(node);
        let mut commit = Commit::new();
        let holds = match &self.pattern.description {
            Description::Reference(name) => env.node(name) == Some(node),
            Description::Link(name) => {
                let category = self.category;
                env.node(name)
                    .is_some_and(|n| category(self.tree.label(n)) == category(label))
            }
            Description::Regex(re) if !re.bindings().is_empty() && !self.pattern.negated => {
                match re.captured_bindings(label) {
                    None => false,
                    Some(pairs) => {
                        let mut consistent = true;
                        for (var, value) in pairs {
                            match env.var(&var) {
                                Some(prev) if prev != value => {
                                    consistent = false;
                                    break;
                                }
                                Some(_) => {}
                                None => env.set_var(&mut commit, &var, value),
                            }
                        }
                        if !consistent {
                            env.rollback(commit);
                            return None;
                        }
                        true
                    }
                }
            }
            desc => desc.matches_label(label).unwrap_or(false),
        };
        if holds == self.pattern.negated {
            debug_assert!(commit.is_empty());
            return None;
        }
        if let Some(name) = &self.pattern.name {
            env.bind(&mut commit, name, node);
        }
        Some(commit)
    }

    fn reset_children(&mut self, candidate: NodeId) {
        self.children = self
            .pattern
            .links
            .iter()
            .map(|link| {
                NodeMatcher::new(
                    self.tree,
                    self.root,
                    self.category,
                    &link.child,
                    &link.relation,
                    link.negated,
                    link.optional,
                    candidate,
                )
            })
            .collect();
        self.children_started = false;
    }

    /// Enumerate the satisfying configurations of the child links as a
    /// resumable conjunction.
    fn next_child_config(&mut self, env: &mut MatchEnv) -> bool {
        if self.children.is_empty() {
            // an unlinked candidate has exactly one configuration
            let fresh = !self.children_started;
            self.children_started = true;
            return fresh;
        }
        let mut i = if self.children_started {
            // resume: ask the rightmost link for another configuration
            self.children.len() - 1
        } else {
            self.children_started = true;
            0
        };
        let anchor = match &self.current {
            Some((node, _)) => *node,
            None => return false,
        };
        loop {
            if self.children[i].matches(env) {
                i += 1;
                if i == self.children.len() {
                    return true;
                }
                // a fresh left configuration restarts everything to
                // the right
                let link = &self.pattern.links[i];
                self.children[i] = NodeMatcher::new(
                    self.tree,
                    self.root,
                    self.category,
                    &link.child,
                    &link.relation,
                    link.negated,
                    link.optional,
                    anchor,
                );
            } else if i == 0 {
                return false;
            } else {
                i -= 1;
            }
        }
    }

    /// Roll back everything this matcher and its children currently
    /// hold, newest commits first.
    fn unwind(&mut self, env: &mut MatchEnv) {
        for child in self.children.iter_mut().rev() {
            child.unwind(env);
        }
        if let Some((_, commit)) = self.current.take() {
            env.rollback(commit);
        }
    }
}

/// Lazy iterator over the matches of a pattern in a subtree
///
/// Tries the pattern at every node of the subtree in pre-order and
/// resumes the matcher until each start node's configurations are
/// exhausted. Two configurations that bind the same nodes and strings
/// are the same result and yielded once.
pub struct Matches<'a> {
    tree: &'a Tree,
    pattern: &'a Pattern,
    root: NodeId,
    starts: PreOrder<'a>,
    active: Option<(NodeId, NodeMatcher<'a>, MatchEnv)>,
    seen: FxHashSet<MatchKey>,
}

type MatchKey = (NodeId, Vec<(String, NodeId)>, Vec<(String, String)>);

impl<'a> Matches<'a> {
    pub(crate) fn new(tree: &'a Tree, pattern: &'a Pattern, root: NodeId) -> Self {
        Self {
            tree,
            pattern,
            root,
            starts: tree.descendants(root),
            active: None,
            seen: FxHashSet::default(),
        }
    }
}

fn match_key(start: NodeId, env: &MatchEnv) -> MatchKey {
    let mut names: Vec<(String, NodeId)> = env
        .names()
        .iter()
        .map(|(k, &v)| (k.clone(), v))
        .collect();
    names.sort();
    let mut vars: Vec<(String, String)> = env
        .vars()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    vars.sort();
    (start, names, vars)
}

impl Iterator for Matches<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if self.active.is_none() {
                let start = self.starts.next()?;
                let matcher = NodeMatcher::start(self.tree, self.root, self.pattern, start);
                self.active = Some((start, matcher, MatchEnv::new()));
            }
            let (start, matcher, env) = self.active.as_mut()?;
            if matcher.matches(env) {
                let key = match_key(*start, env);
                let result = Match {
                    node: *start,
                    names: env.names().clone(),
                    vars: env.vars().clone(),
                };
                if self.seen.insert(key) {
                    return Some(result);
                }
            } else {
                self.active = None;
            }
        }
    }
}
