//! The relation catalog
//!
//! A [`Relation`] is a binary predicate between two tree nodes,
//! evaluated relative to a root. Every relation exposes both a boolean
//! [`satisfies`](Relation::satisfies) test and a lazy
//! [`search`](Relation::search) iterator that enumerates, in a fixed
//! canonical order and without duplicates, exactly the nodes standing
//! in the relation to a given node.
//!
//! Relations are interned: [`Relation::intern`] returns a shared
//! `Arc` from a process-wide cache, so two relations with equal kind
//! and argument are pointer-identical and equality checks are cheap.

use crate::head::HeadFinder;
use crate::tree::{NodeId, Tree};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fmt;
use std::iter::successors;
use std::sync::{Arc, Mutex, OnceLock};

/// Shared, thread-safe head-selection function
pub type SharedHeadFinder = Arc<dyn HeadFinder + Send + Sync>;

/// Label filter for the unbroken-category relation family
///
/// The chain of intermediate nodes must all match the regex, or all
/// fail it when the filter is negated.
#[derive(Clone)]
pub struct LabelFilter {
    regex: Regex,
    negated: bool,
}

impl LabelFilter {
    /// Compile a filter from a regex fragment
    pub fn new(pattern: &str, negated: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            negated,
        })
    }

    /// True if a chain may continue through a node with this label
    pub fn admits(&self, label: &str) -> bool {
        self.regex.is_match(label) != self.negated
    }

    fn key(&self) -> (bool, &str) {
        (self.negated, self.regex.as_str())
    }
}

impl PartialEq for LabelFilter {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Debug for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neg = if self.negated { "!" } else { "" };
        write!(f, "LabelFilter({}/{}/)", neg, self.regex.as_str())
    }
}

/// A binary node relation
///
/// Naming reads left to right: for pattern `A rel B`, `A` stands in
/// the relation to `B`, and `search` enumerates candidates for `B`
/// from `A`'s position.
#[derive(Clone)]
pub enum Relation {
    /// Internal seed relation: the candidate is the start node itself
    Root,
    /// `==` node identity
    Equals,
    /// `<` B is a child of A
    ParentOf,
    /// `>` A is a child of B
    ChildOf,
    /// `<<` A strictly dominates B
    Dominates,
    /// `>>` A is strictly dominated by B
    DominatedBy,
    /// `..` A's last terminal ends before B's first terminal
    Precedes,
    /// `,,` inverse of `..`
    Follows,
    /// `.` A's right edge is B's left edge
    ImmediatelyPrecedes,
    /// `,` inverse of `.`
    ImmediatelyFollows,
    /// `<<,` B is reached from A by a chain of first children
    HasLeftmostDescendant,
    /// `>>,` inverse of `<<,`
    LeftmostDescendantOf,
    /// `<<-` B is reached from A by a chain of last children
    HasRightmostDescendant,
    /// `>>-` inverse of `<<-`
    RightmostDescendantOf,
    /// `$` A and B share a parent and differ
    SisterOf,
    /// `$++` A is a sister preceding B
    LeftSisterOf,
    /// `$--` A is a sister following B
    RightSisterOf,
    /// `$+` A is the sister immediately preceding B
    ImmediateLeftSisterOf,
    /// `$-` A is the sister immediately following B
    ImmediateRightSisterOf,
    /// `<N` B is the Nth child of A (1-based; negative counts from the end)
    HasIthChild(i32),
    /// `>N` A is the Nth child of B
    IthChildOf(i32),
    /// `<:` B is A's only child
    HasOnlyChild,
    /// `>:` A is B's only child
    OnlyChildOf,
    /// `<<:` B is reached from A by a chain of only children
    HasUnaryPathDescendant,
    /// `>>:` inverse of `<<:`
    UnaryPathAncestorOf,
    /// `<#` B is A's head child
    ImmediatelyHeadedBy(SharedHeadFinder),
    /// `>#` A is B's head child
    ImmediatelyHeads(SharedHeadFinder),
    /// `<<#` B is on A's head chain
    HeadedBy(SharedHeadFinder),
    /// `>>#` A is on B's head chain
    Heads(SharedHeadFinder),
    /// `<+(F)` A dominates B through intermediates admitted by F
    UnbrokenDominates(LabelFilter),
    /// `>+(F)` inverse of `<+(F)`
    UnbrokenDominatedBy(LabelFilter),
    /// `.+(F)` A precedes B through an adjacent chain admitted by F
    UnbrokenPrecedes(LabelFilter),
    /// `,+(F)` inverse of `.+(F)`
    UnbrokenFollows(LabelFilter),
}

/// Intern key: relation kind plus its argument
#[derive(Clone, PartialEq, Eq, Hash)]
enum RelationKey {
    Simple(&'static str),
    Ith(&'static str, i32),
    Filtered(&'static str, bool, String),
    Headed(&'static str, usize),
}

static RELATION_CACHE: OnceLock<Mutex<FxHashMap<RelationKey, Arc<Relation>>>> = OnceLock::new();

impl Relation {
    /// Return the shared interned instance of this relation
    ///
    /// The cache lives for the whole process; equal (kind, argument)
    /// pairs always come back as the same `Arc`, so pointer equality
    /// is relation equality. Head-parameterized relations are equal
    /// only when their head finders are the same object.
    pub fn intern(self) -> Arc<Relation> {
        let cache = RELATION_CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
        let mut map = cache.lock().unwrap();
        map.entry(self.cache_key())
            .or_insert_with(|| Arc::new(self))
            .clone()
    }

    fn cache_key(&self) -> RelationKey {
        use Relation::*;
        match self {
            HasIthChild(i) => RelationKey::Ith("<i", *i),
            IthChildOf(i) => RelationKey::Ith(">i", *i),
            UnbrokenDominates(f) => {
                RelationKey::Filtered("<+", f.negated, f.regex.as_str().to_string())
            }
            UnbrokenDominatedBy(f) => {
                RelationKey::Filtered(">+", f.negated, f.regex.as_str().to_string())
            }
            UnbrokenPrecedes(f) => {
                RelationKey::Filtered(".+", f.negated, f.regex.as_str().to_string())
            }
            UnbrokenFollows(f) => {
                RelationKey::Filtered(",+", f.negated, f.regex.as_str().to_string())
            }
            ImmediatelyHeadedBy(h) => RelationKey::Headed("<#", finder_addr(h)),
            ImmediatelyHeads(h) => RelationKey::Headed(">#", finder_addr(h)),
            HeadedBy(h) => RelationKey::Headed("<<#", finder_addr(h)),
            Heads(h) => RelationKey::Headed(">>#", finder_addr(h)),
            other => RelationKey::Simple(other.symbol()),
        }
    }

    /// Surface symbol of the relation
    pub fn symbol(&self) -> &'static str {
        use Relation::*;
        match self {
            Root => "ROOT",
            Equals => "==",
            ParentOf => "<",
            ChildOf => ">",
            Dominates => "<<",
            DominatedBy => ">>",
            Precedes => "..",
            Follows => ",,",
            ImmediatelyPrecedes => ".",
            ImmediatelyFollows => ",",
            HasLeftmostDescendant => "<<,",
            LeftmostDescendantOf => ">>,",
            HasRightmostDescendant => "<<-",
            RightmostDescendantOf => ">>-",
            SisterOf => "$",
            LeftSisterOf => "$++",
            RightSisterOf => "$--",
            ImmediateLeftSisterOf => "$+",
            ImmediateRightSisterOf => "$-",
            HasIthChild(_) => "<i",
            IthChildOf(_) => ">i",
            HasOnlyChild => "<:",
            OnlyChildOf => ">:",
            HasUnaryPathDescendant => "<<:",
            UnaryPathAncestorOf => ">>:",
            ImmediatelyHeadedBy(_) => "<#",
            ImmediatelyHeads(_) => ">#",
            HeadedBy(_) => "<<#",
            Heads(_) => ">>#",
            UnbrokenDominates(_) => "<+",
            UnbrokenDominatedBy(_) => ">+",
            UnbrokenPrecedes(_) => ".+",
            UnbrokenFollows(_) => ",+",
        }
    }

    /// The documented inverse relation, if any
    ///
    /// For every pair, `a R b` holds exactly when `b R' a` does.
    pub fn inverse(&self) -> Relation {
        use Relation::*;
        match self {
            Root => Root,
            Equals => Equals,
            ParentOf => ChildOf,
            ChildOf => ParentOf,
            Dominates => DominatedBy,
            DominatedBy => Dominates,
            Precedes => Follows,
            Follows => Precedes,
            ImmediatelyPrecedes => ImmediatelyFollows,
            ImmediatelyFollows => ImmediatelyPrecedes,
            HasLeftmostDescendant => LeftmostDescendantOf,
            LeftmostDescendantOf => HasLeftmostDescendant,
            HasRightmostDescendant => RightmostDescendantOf,
            RightmostDescendantOf => HasRightmostDescendant,
            SisterOf => SisterOf,
            LeftSisterOf => RightSisterOf,
            RightSisterOf => LeftSisterOf,
            ImmediateLeftSisterOf => ImmediateRightSisterOf,
            ImmediateRightSisterOf => ImmediateLeftSisterOf,
            HasIthChild(i) => IthChildOf(*i),
            IthChildOf(i) => HasIthChild(*i),
            HasOnlyChild => OnlyChildOf,
            OnlyChildOf => HasOnlyChild,
            HasUnaryPathDescendant => UnaryPathAncestorOf,
            UnaryPathAncestorOf => HasUnaryPathDescendant,
            ImmediatelyHeadedBy(h) => ImmediatelyHeads(h.clone()),
            ImmediatelyHeads(h) => ImmediatelyHeadedBy(h.clone()),
            HeadedBy(h) => Heads(h.clone()),
            Heads(h) => HeadedBy(h.clone()),
            UnbrokenDominates(f) => UnbrokenDominatedBy(f.clone()),
            UnbrokenDominatedBy(f) => UnbrokenDominates(f.clone()),
            UnbrokenPrecedes(f) => UnbrokenFollows(f.clone()),
            UnbrokenFollows(f) => UnbrokenPrecedes(f.clone()),
        }
    }

    /// True iff `a` stands in this relation to `b`, given `root`
    pub fn satisfies(&self, tree: &Tree, a: NodeId, b: NodeId, root: NodeId) -> bool {
        use Relation::*;
        match self {
            Root | Equals => a == b,
            ParentOf => tree.children(a).contains(&b),
            ChildOf => tree.parent_of(root, a) == Some(b),
            Dominates => tree.dominates(a, b),
            DominatedBy => tree.dominates(b, a),
            Precedes => match (tree.span(root, a), tree.span(root, b)) {
                (Some((_, ra)), Some((lb, _))) => ra <= lb,
                _ => false,
            },
            Follows => match (tree.span(root, a), tree.span(root, b)) {
                (Some((la, _)), Some((_, rb))) => rb <= la,
                _ => false,
            },
            ImmediatelyPrecedes => match (tree.span(root, a), tree.span(root, b)) {
                (Some((_, ra)), Some((lb, _))) => ra == lb,
                _ => false,
            },
            ImmediatelyFollows => match (tree.span(root, a), tree.span(root, b)) {
                (Some((la, _)), Some((_, rb))) => rb == la,
                _ => false,
            },
            HasLeftmostDescendant => {
                a != b && successors(first_child(tree, a), |&c| first_child(tree, c)).any(|c| c == b)
            }
            LeftmostDescendantOf => {
                b != a && successors(first_child(tree, b), |&c| first_child(tree, c)).any(|c| c == a)
            }
            HasRightmostDescendant => {
                a != b && successors(last_child(tree, a), |&c| last_child(tree, c)).any(|c| c == b)
            }
            RightmostDescendantOf => {
                b != a && successors(last_child(tree, b), |&c| last_child(tree, c)).any(|c| c == a)
            }
            SisterOf => {
                a != b
                    && tree.parent_of(root, a).is_some()
                    && tree.parent_of(root, a) == tree.parent_of(root, b)
            }
            LeftSisterOf => sister_index(tree, root, a, b).is_some_and(|(ia, ib)| ia < ib),
            RightSisterOf => sister_index(tree, root, a, b).is_some_and(|(ia, ib)| ia > ib),
            ImmediateLeftSisterOf => {
                sister_index(tree, root, a, b).is_some_and(|(ia, ib)| ia + 1 == ib)
            }
            ImmediateRightSisterOf => {
                sister_index(tree, root, a, b).is_some_and(|(ia, ib)| ib + 1 == ia)
            }
            HasIthChild(i) => ith_child(tree, a, *i) == Some(b),
            IthChildOf(i) => tree
                .parent_of(root, a)
                .is_some_and(|p| p == b && ith_child(tree, p, *i) == Some(a)),
            HasOnlyChild => tree.children(a) == [b],
            OnlyChildOf => tree
                .parent_of(root, a)
                .is_some_and(|p| p == b && tree.children(p).len() == 1),
            HasUnaryPathDescendant => {
                successors(only_child(tree, a), |&c| only_child(tree, c)).any(|c| c == b)
            }
            UnaryPathAncestorOf => {
                successors(only_child(tree, b), |&c| only_child(tree, c)).any(|c| c == a)
            }
            ImmediatelyHeadedBy(h) => h.determine_head(tree, a) == Some(b),
            ImmediatelyHeads(h) => tree
                .parent_of(root, a)
                .is_some_and(|p| p == b && h.determine_head(tree, p) == Some(a)),
            HeadedBy(h) => {
                successors(h.determine_head(tree, a), |&n| h.determine_head(tree, n))
                    .any(|n| n == b)
            }
            Heads(h) => {
                successors(h.determine_head(tree, b), |&n| h.determine_head(tree, n))
                    .any(|n| n == a)
            }
            UnbrokenDominates(f) => unbroken_dominates(tree, f, a, b),
            UnbrokenDominatedBy(f) => unbroken_dominates(tree, f, b, a),
            UnbrokenPrecedes(_) | UnbrokenFollows(_) => {
                self.search(tree, a, root).any(|c| c == b)
            }
        }
    }

    /// Lazily enumerate all nodes `b` with `a rel b`, in canonical order
    ///
    /// The order is fixed per relation (structurally nearest first for
    /// path walks, pre-order for subtree scans) and never yields the
    /// same node twice.
    pub fn search<'a>(
        &'a self,
        tree: &'a Tree,
        a: NodeId,
        root: NodeId,
    ) -> Box<dyn Iterator<Item = NodeId> + 'a> {
        use Relation::*;
        match self {
            Root | Equals => Box::new(std::iter::once(a)),
            ParentOf => Box::new(tree.children(a).iter().copied()),
            ChildOf => Box::new(tree.parent_of(root, a).into_iter()),
            Dominates => Box::new(tree.descendants(a).skip(1)),
            DominatedBy => Box::new(tree.ancestors(root, a)),
            Precedes => Box::new(
                ancestor_or_self(tree, root, a)
                    .flat_map(move |n| right_siblings(tree, root, n))
                    .flat_map(move |s| tree.descendants(s)),
            ),
            Follows => Box::new(
                ancestor_or_self(tree, root, a)
                    .flat_map(move |n| left_siblings_nearest_first(tree, root, n))
                    .flat_map(move |s| tree.descendants(s)),
            ),
            ImmediatelyPrecedes => Box::new(successors(
                right_adjacent(tree, root, a),
                move |&n| first_child(tree, n),
            )),
            ImmediatelyFollows => Box::new(successors(
                left_adjacent(tree, root, a),
                move |&n| last_child(tree, n),
            )),
            HasLeftmostDescendant => {
                Box::new(successors(first_child(tree, a), move |&c| first_child(tree, c)))
            }
            LeftmostDescendantOf => Box::new(successors(
                parent_if_first_child(tree, root, a),
                move |&p| parent_if_first_child(tree, root, p),
            )),
            HasRightmostDescendant => {
                Box::new(successors(last_child(tree, a), move |&c| last_child(tree, c)))
            }
            RightmostDescendantOf => Box::new(successors(
                parent_if_last_child(tree, root, a),
                move |&p| parent_if_last_child(tree, root, p),
            )),
            SisterOf => Box::new(siblings(tree, root, a).filter(move |&s| s != a)),
            LeftSisterOf => Box::new(right_siblings(tree, root, a)),
            RightSisterOf => Box::new(left_siblings_nearest_first(tree, root, a)),
            ImmediateLeftSisterOf => Box::new(right_siblings(tree, root, a).take(1)),
            ImmediateRightSisterOf => {
                Box::new(left_siblings_nearest_first(tree, root, a).take(1))
            }
            HasIthChild(i) => Box::new(ith_child(tree, a, *i).into_iter()),
            IthChildOf(i) => {
                let i = *i;
                Box::new(
                    tree.parent_of(root, a)
                        .filter(move |&p| ith_child(tree, p, i) == Some(a))
                        .into_iter(),
                )
            }
            HasOnlyChild => Box::new(only_child(tree, a).into_iter()),
            OnlyChildOf => Box::new(
                tree.parent_of(root, a)
                    .filter(move |&p| tree.children(p).len() == 1)
                    .into_iter(),
            ),
            HasUnaryPathDescendant => {
                Box::new(successors(only_child(tree, a), move |&c| only_child(tree, c)))
            }
            UnaryPathAncestorOf => Box::new(successors(
                parent_of_only_child(tree, root, a),
                move |&p| parent_of_only_child(tree, root, p),
            )),
            ImmediatelyHeadedBy(h) => Box::new(h.determine_head(tree, a).into_iter()),
            ImmediatelyHeads(h) => {
                let h = &**h;
                Box::new(
                    tree.parent_of(root, a)
                        .filter(move |&p| h.determine_head(tree, p) == Some(a))
                        .into_iter(),
                )
            }
            HeadedBy(h) => {
                let h = &**h;
                Box::new(successors(h.determine_head(tree, a), move |&n| {
                    h.determine_head(tree, n)
                }))
            }
            Heads(h) => {
                let h = &**h;
                Box::new(successors(
                    parent_if_head(tree, h, root, a),
                    move |&p| parent_if_head(tree, h, root, p),
                ))
            }
            UnbrokenDominates(f) => Box::new(UnbrokenDominationIter {
                tree,
                filter: f,
                stack: tree.children(a).iter().rev().copied().collect(),
            }),
            UnbrokenDominatedBy(f) => Box::new(successors(
                tree.parent_of(root, a),
                move |&p| {
                    if f.admits(tree.label(p)) {
                        tree.parent_of(root, p)
                    } else {
                        None
                    }
                },
            )),
            UnbrokenPrecedes(f) => Box::new(UnbrokenOrderIter::new(tree, f, root, a, true)),
            UnbrokenFollows(f) => Box::new(UnbrokenOrderIter::new(tree, f, root, a, false)),
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Relation::*;
        match self {
            HasIthChild(i) | IthChildOf(i) => {
                write!(f, "Relation({} {})", self.symbol(), i)
            }
            UnbrokenDominates(fl)
            | UnbrokenDominatedBy(fl)
            | UnbrokenPrecedes(fl)
            | UnbrokenFollows(fl) => write!(f, "Relation({} {:?})", self.symbol(), fl),
            other => write!(f, "Relation({})", other.symbol()),
        }
    }
}

// Head finders compare and hash by object address.
fn finder_addr(h: &SharedHeadFinder) -> usize {
    Arc::as_ptr(h) as *const () as usize
}

fn first_child(tree: &Tree, n: NodeId) -> Option<NodeId> {
    tree.children(n).first().copied()
}

fn last_child(tree: &Tree, n: NodeId) -> Option<NodeId> {
    tree.children(n).last().copied()
}

fn only_child(tree: &Tree, n: NodeId) -> Option<NodeId> {
    match tree.children(n) {
        [c] => Some(*c),
        _ => None,
    }
}

/// 1-based child lookup; negative indices count from the end
fn ith_child(tree: &Tree, parent: NodeId, i: i32) -> Option<NodeId> {
    let children = tree.children(parent);
    let idx = if i > 0 {
        (i - 1) as usize
    } else if i < 0 {
        children.len().checked_sub(i.unsigned_abs() as usize)?
    } else {
        return None;
    };
    children.get(idx).copied()
}

fn sister_index(tree: &Tree, root: NodeId, a: NodeId, b: NodeId) -> Option<(usize, usize)> {
    if a == b {
        return None;
    }
    let pa = tree.parent_of(root, a)?;
    let pb = tree.parent_of(root, b)?;
    if pa != pb {
        return None;
    }
    Some((tree.child_index(pa, a)?, tree.child_index(pa, b)?))
}

fn ancestor_or_self<'a>(
    tree: &'a Tree,
    root: NodeId,
    n: NodeId,
) -> impl Iterator<Item = NodeId> + 'a {
    std::iter::once(n).chain(tree.ancestors(root, n))
}

fn siblings<'a>(tree: &'a Tree, root: NodeId, n: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    let sibs: &'a [NodeId] = match tree.parent_of(root, n) {
        Some(p) => tree.children(p),
        None => &[],
    };
    sibs.iter().copied()
}

fn right_siblings<'a>(
    tree: &'a Tree,
    root: NodeId,
    n: NodeId,
) -> impl Iterator<Item = NodeId> + 'a {
    let sibs: &'a [NodeId] = match tree.parent_of(root, n) {
        Some(p) => {
            let idx = tree.child_index(p, n).unwrap();
            &tree.children(p)[idx + 1..]
        }
        None => &[],
    };
    sibs.iter().copied()
}

fn left_siblings_nearest_first<'a>(
    tree: &'a Tree,
    root: NodeId,
    n: NodeId,
) -> impl Iterator<Item = NodeId> + 'a {
    let sibs: &'a [NodeId] = match tree.parent_of(root, n) {
        Some(p) => {
            let idx = tree.child_index(p, n).unwrap();
            &tree.children(p)[..idx]
        }
        None => &[],
    };
    sibs.iter().rev().copied()
}

/// Nearest node whose leftmost terminal starts where `n`'s terminals
/// end: the right sister of the closest ancestor-or-self that has one.
fn right_adjacent(tree: &Tree, root: NodeId, n: NodeId) -> Option<NodeId> {
    let mut cur = n;
    loop {
        let p = tree.parent_of(root, cur)?;
        let idx = tree.child_index(p, cur)?;
        if let Some(&s) = tree.children(p).get(idx + 1) {
            return Some(s);
        }
        cur = p;
    }
}

fn left_adjacent(tree: &Tree, root: NodeId, n: NodeId) -> Option<NodeId> {
    let mut cur = n;
    loop {
        let p = tree.parent_of(root, cur)?;
        let idx = tree.child_index(p, cur)?;
        if idx > 0 {
            return Some(tree.children(p)[idx - 1]);
        }
        cur = p;
    }
}

fn parent_if_first_child(tree: &Tree, root: NodeId, n: NodeId) -> Option<NodeId> {
    let p = tree.parent_of(root, n)?;
    (first_child(tree, p) == Some(n)).then_some(p)
}

fn parent_if_last_child(tree: &Tree, root: NodeId, n: NodeId) -> Option<NodeId> {
    let p = tree.parent_of(root, n)?;
    (last_child(tree, p) == Some(n)).then_some(p)
}

fn parent_of_only_child(tree: &Tree, root: NodeId, n: NodeId) -> Option<NodeId> {
    let p = tree.parent_of(root, n)?;
    (tree.children(p).len() == 1).then_some(p)
}

fn parent_if_head(
    tree: &Tree,
    finder: &dyn HeadFinder,
    root: NodeId,
    n: NodeId,
) -> Option<NodeId> {
    let p = tree.parent_of(root, n)?;
    (finder.determine_head(tree, p) == Some(n)).then_some(p)
}

/// True if `a` dominates `b` through intermediates admitted by `f`
///
/// Direct children always qualify; deeper nodes are reachable only
/// through chain nodes whose labels pass the filter.
fn unbroken_dominates(tree: &Tree, f: &LabelFilter, a: NodeId, b: NodeId) -> bool {
    let mut stack: Vec<NodeId> = tree.children(a).to_vec();
    while let Some(n) = stack.pop() {
        if n == b {
            return true;
        }
        if f.admits(tree.label(n)) {
            stack.extend_from_slice(tree.children(n));
        }
    }
    false
}

/// Depth-first enumeration of unbroken-category domination candidates
struct UnbrokenDominationIter<'a> {
    tree: &'a Tree,
    filter: &'a LabelFilter,
    stack: Vec<NodeId>,
}

impl Iterator for UnbrokenDominationIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let n = self.stack.pop()?;
        if self.filter.admits(self.tree.label(n)) {
            for &c in self.tree.children(n).iter().rev() {
                self.stack.push(c);
            }
        }
        Some(n)
    }
}

/// Breadth-first enumeration along linear order for `.+(F)` / `,+(F)`
///
/// The frontier expands through a node only when its label passes the
/// filter; a seen set removes the duplicates that arise when chain
/// members share an edge.
struct UnbrokenOrderIter<'a> {
    tree: &'a Tree,
    filter: &'a LabelFilter,
    root: NodeId,
    forward: bool,
    queue: VecDeque<NodeId>,
    seen: FxHashSet<NodeId>,
}

impl<'a> UnbrokenOrderIter<'a> {
    fn new(tree: &'a Tree, filter: &'a LabelFilter, root: NodeId, start: NodeId, forward: bool) -> Self {
        let mut it = Self {
            tree,
            filter,
            root,
            forward,
            queue: VecDeque::new(),
            seen: FxHashSet::default(),
        };
        it.enqueue_adjacent(start);
        it
    }

    fn enqueue_adjacent(&mut self, n: NodeId) {
        let chain: Vec<NodeId> = if self.forward {
            successors(right_adjacent(self.tree, self.root, n), |&m| {
                first_child(self.tree, m)
            })
            .collect()
        } else {
            successors(left_adjacent(self.tree, self.root, n), |&m| {
                last_child(self.tree, m)
            })
            .collect()
        };
        for m in chain {
            if self.seen.insert(m) {
                self.queue.push_back(m);
            }
        }
    }

    fn next_node(&mut self) -> Option<NodeId> {
        let n = self.queue.pop_front()?;
        if self.filter.admits(self.tree.label(n)) {
            self.enqueue_adjacent(n);
        }
        Some(n)
    }
}

impl Iterator for UnbrokenOrderIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.next_node()
    }
}
