//! Match environment
//!
//! One environment is shared by every pattern node during a match
//! attempt: a name table from capture names to tree nodes and a
//! variable table from regex-group variables to strings. Every write
//! goes through a [`Commit`] that records the displaced previous
//! value, so backtracking can restore the exact prior state in
//! reverse order, including rebinding of duplicate names.

use crate::tree::NodeId;
use rustc_hash::FxHashMap;

/// Shared binding state for one match attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchEnv {
    names: FxHashMap<String, NodeId>,
    vars: FxHashMap<String, String>,
}

/// Reversal record for the writes of one accepted candidate
#[derive(Debug, Default)]
pub struct Commit {
    entries: Vec<Entry>,
}

#[derive(Debug)]
enum Entry {
    Name(String, Option<NodeId>),
    Var(String, Option<String>),
}

impl Commit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MatchEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node currently bound to `name`
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// String currently bound to variable `name`
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The full name table
    pub fn names(&self) -> &FxHashMap<String, NodeId> {
        &self.names
    }

    /// The full variable table
    pub fn vars(&self) -> &FxHashMap<String, String> {
        &self.vars
    }

    /// Bind `name` to `node`, displacing any previous binding into the
    /// commit
    pub(crate) fn bind(&mut self, commit: &mut Commit, name: &str, node: NodeId) {
        let prev = self.names.insert(name.to_string(), node);
        commit.entries.push(Entry::Name(name.to_string(), prev));
    }

    /// Set a string variable
    ///
    /// Callers must have checked consistency against any existing
    /// value first; overwriting with a different string is a matcher
    /// bug.
    pub(crate) fn set_var(&mut self, commit: &mut Commit, name: &str, value: String) {
        debug_assert!(
            self.vars.get(name).is_none_or(|v| *v == value),
            "variable {name:?} rewritten with a different value"
        );
        let prev = self.vars.insert(name.to_string(), value);
        commit.entries.push(Entry::Var(name.to_string(), prev));
    }

    /// Undo every write in `commit`, newest first
    pub(crate) fn rollback(&mut self, commit: Commit) {
        for entry in commit.entries.into_iter().rev() {
            match entry {
                Entry::Name(name, Some(prev)) => {
                    self.names.insert(name, prev);
                }
                Entry::Name(name, None) => {
                    self.names.remove(&name);
                }
                Entry::Var(name, Some(prev)) => {
                    self.vars.insert(name, prev);
                }
                Entry::Var(name, None) => {
                    self.vars.remove(&name);
                }
            }
        }
    }
}
