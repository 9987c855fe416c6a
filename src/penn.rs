//! Bracketed (Penn-treebank style) tree reading and writing
//!
//! Parses parenthesized labeled lists like
//! `(S (NP (DT the) (NN dog)) (VP (VBZ barks)))` into [`Tree`]s.
//! Nodes are allocated in pre-order, so the root of a parsed tree is
//! always node 0.

use crate::tree::{NodeId, Tree};
use std::fmt::Write as _;
use thiserror::Error;

/// Error during bracketed-tree parsing
#[derive(Debug, Error, PartialEq)]
pub enum TreeParseError {
    #[error("tree parse error: empty input")]
    Empty,

    #[error("tree parse error at offset {0}: unbalanced ')'")]
    Unbalanced(usize),

    #[error("tree parse error at offset {0}: expected label after '('")]
    MissingLabel(usize),

    #[error("tree parse error at offset {0}: text outside brackets")]
    StrayToken(usize),

    #[error("tree parse error: unexpected end of input")]
    UnexpectedEof,
}

/// Parse a single bracketed tree
///
/// Trailing whitespace is allowed; any other trailing text is an error.
pub fn parse(text: &str) -> Result<Tree, TreeParseError> {
    let mut pos = 0;
    skip_ws(text, &mut pos);
    if pos >= text.len() {
        return Err(TreeParseError::Empty);
    }
    let (tree, end) = parse_at(text, pos)?;
    let mut rest = end;
    skip_ws(text, &mut rest);
    if rest < text.len() {
        return Err(TreeParseError::StrayToken(rest));
    }
    Ok(tree)
}

/// Render the subtree rooted at `node` back to bracketed form
pub fn format(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    format_into(tree, node, &mut out);
    out
}

fn format_into(tree: &Tree, node: NodeId, out: &mut String) {
    if tree.is_leaf(node) {
        out.push_str(tree.label(node));
        return;
    }
    let _ = write!(out, "({}", tree.label(node));
    for &c in tree.children(node) {
        out.push(' ');
        format_into(tree, c, out);
    }
    out.push(')');
}

/// Iterator over consecutive bracketed trees in a string
///
/// Stops after the first malformed tree.
pub struct TreeReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TreeReader<'a> {
    /// Create a reader over an in-memory string
    pub fn from_string(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl Iterator for TreeReader<'_> {
    type Item = Result<Tree, TreeParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        skip_ws(self.text, &mut self.pos);
        if self.pos >= self.text.len() {
            return None;
        }
        match parse_at(self.text, self.pos) {
            Ok((tree, end)) => {
                self.pos = end;
                Some(Ok(tree))
            }
            Err(e) => {
                self.pos = self.text.len();
                Some(Err(e))
            }
        }
    }
}

fn skip_ws(text: &str, pos: &mut usize) {
    let bytes = text.as_bytes();
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
}

/// Run of label characters starting at `pos`; delimiters are ASCII so
/// slicing is always on a char boundary.
fn read_atom<'a>(text: &'a str, pos: &mut usize) -> &'a str {
    let bytes = text.as_bytes();
    let start = *pos;
    while *pos < bytes.len() {
        match bytes[*pos] {
            b'(' | b')' => break,
            b if b.is_ascii_whitespace() => break,
            _ => *pos += 1,
        }
    }
    &text[start..*pos]
}

/// Parse one tree starting at `start` (which must point at `(`),
/// returning the tree and the offset just past its closing bracket.
fn parse_at(text: &str, start: usize) -> Result<(Tree, usize), TreeParseError> {
    let bytes = text.as_bytes();
    let mut pos = start;
    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        skip_ws(text, &mut pos);
        if pos >= bytes.len() {
            return Err(TreeParseError::UnexpectedEof);
        }
        match bytes[pos] {
            b'(' => {
                pos += 1;
                skip_ws(text, &mut pos);
                let at = pos;
                let label = read_atom(text, &mut pos);
                if label.is_empty() {
                    return Err(TreeParseError::MissingLabel(at));
                }
                let id = tree.add_node(label);
                if let Some(&parent) = stack.last() {
                    tree.add_child(parent, id);
                }
                stack.push(id);
            }
            b')' => {
                if stack.is_empty() {
                    return Err(TreeParseError::Unbalanced(pos));
                }
                pos += 1;
                stack.pop();
                if stack.is_empty() {
                    return Ok((tree, pos));
                }
            }
            _ => {
                if stack.is_empty() {
                    return Err(TreeParseError::StrayToken(pos));
                }
                let word = read_atom(text, &mut pos);
                let id = tree.add_node(word);
                tree.add_child(*stack.last().unwrap(), id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOG: &str = "(S (NP (DT the) (NN dog)) (VP (VBZ barks)))";

    #[test]
    fn test_parse_sample() {
        let tree = parse(DOG).unwrap();
        assert_eq!(tree.label(0), "S");
        let words: Vec<&str> = tree.leaves(0).map(|n| tree.label(n)).collect();
        assert_eq!(words, vec!["the", "dog", "barks"]);
        let kids: Vec<&str> = tree.children(0).iter().map(|&c| tree.label(c)).collect();
        assert_eq!(kids, vec!["NP", "VP"]);
    }

    #[test]
    fn test_round_trip() {
        let tree = parse(DOG).unwrap();
        assert_eq!(format(&tree, 0), DOG);
    }

    #[test]
    fn test_bare_leaf_subtree() {
        let tree = parse("(DT the)").unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(format(&tree, 0), "(DT the)");
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Err(TreeParseError::Empty));
        assert_eq!(parse("   "), Err(TreeParseError::Empty));
        assert_eq!(parse("(S (NP)"), Err(TreeParseError::UnexpectedEof));
        assert_eq!(parse("dog"), Err(TreeParseError::StrayToken(0)));
        assert_eq!(parse(")"), Err(TreeParseError::Unbalanced(0)));
        assert_eq!(parse("(S x))"), Err(TreeParseError::StrayToken(5)));
        assert_eq!(parse("( (S x))"), Err(TreeParseError::MissingLabel(2)));
    }

    #[test]
    fn test_reader_multiple_trees() {
        let text = "(S (NN dogs) (VBP bark))\n(NP (NN cats))\n";
        let trees: Vec<Tree> = TreeReader::from_string(text)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].label(0), "S");
        assert_eq!(trees[1].label(0), "NP");
    }

    #[test]
    fn test_reader_stops_on_error() {
        let text = "(S (NN dogs)) (oops";
        let results: Vec<_> = TreeReader::from_string(text).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
