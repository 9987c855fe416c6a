//! Pattern text compilation
//!
//! Parses the pattern language with a pest grammar and lowers the
//! parse tree into the [`Pattern`] AST, interning every relation along
//! the way. Compilation is configured through [`PatternCompiler`]:
//! head relations are only available once a head finder is supplied,
//! and the basic-category projection used by `~name` descriptions can
//! be replaced.

use crate::head::basic_category;
use crate::pattern::{CategoryFn, Description, DescriptionRegex, Link, Pattern, PatternNode};
use crate::relation::{LabelFilter, Relation, SharedHeadFinder};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "pattern.pest"]
struct PatternParser;

/// Error compiling pattern text
#[derive(Debug, Error)]
pub enum PatternSyntaxError {
    #[error("pattern syntax error: {0}")]
    Grammar(#[from] Box<pest::error::Error<Rule>>),

    #[error("pattern syntax error: invalid regex /{pattern}/: {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },

    #[error("pattern syntax error: unescaped '{ch}' in literal \"{literal}\"")]
    SpecialInLiteral { ch: char, literal: String },

    #[error("pattern syntax error: empty alternate in literal \"{0}\"")]
    EmptyAlternate(String),

    #[error("pattern syntax error: child index must not be zero")]
    ZeroChildIndex,

    #[error("pattern syntax error: head relation \"{0}\" requires a head finder")]
    MissingHeadFinder(String),

    #[error("pattern syntax error: a backreference cannot bind a name")]
    NamedBackreference,

    #[error("pattern syntax error: group bindings are not allowed in a relation filter")]
    BindingInFilter,
}

/// Configurable pattern compiler
///
/// ```
/// use treeq::{PatternCompiler, HeadSearch, TableHeadFinder};
/// use std::sync::Arc;
///
/// let finder = TableHeadFinder::new().rule("VP", HeadSearch::Left, &["VBZ", "VB"]);
/// let pattern = PatternCompiler::new()
///     .head_finder(Arc::new(finder))
///     .compile("VP <# VBZ")
///     .unwrap();
/// assert_eq!(pattern.source(), "VP <# VBZ");
/// ```
#[derive(Clone, Default)]
pub struct PatternCompiler {
    head_finder: Option<SharedHeadFinder>,
    category: Option<CategoryFn>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the head finder that head relations will consult
    pub fn head_finder(mut self, finder: SharedHeadFinder) -> Self {
        self.head_finder = Some(finder);
        self
    }

    /// Replace the basic-category projection used by `~name`
    pub fn category(mut self, category: CategoryFn) -> Self {
        self.category = Some(category);
        self
    }

    /// Compile pattern text into a [`Pattern`]
    pub fn compile(&self, text: &str) -> Result<Pattern, PatternSyntaxError> {
        let mut pairs = PatternParser::parse(Rule::pattern, text).map_err(Box::new)?;
        let pattern = pairs.next().ok_or_else(|| unexpected_parse(text))?;
        let node = pattern
            .into_inner()
            .find(|p| p.as_rule() == Rule::node)
            .ok_or_else(|| unexpected_parse(text))?;
        Ok(Pattern {
            root: self.build_node(node)?,
            category: self.category.unwrap_or(basic_category),
            source: text.to_string(),
        })
    }

    fn build_node(&self, pair: Pair<'_, Rule>) -> Result<PatternNode, PatternSyntaxError> {
        let mut inner = pair.into_inner();
        let desc = inner.next().ok_or_else(|| unexpected_parse("node"))?;
        let mut node = build_description(desc)?;
        for link in inner {
            node.links.push(self.build_link(link)?);
        }
        Ok(node)
    }

    fn build_link(&self, pair: Pair<'_, Rule>) -> Result<Link, PatternSyntaxError> {
        let mut negated = false;
        let mut optional = false;
        let mut relation = None;
        let mut child = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::link_prefix => match p.as_str() {
                    "!" => negated = true,
                    _ => optional = true,
                },
                Rule::relation => relation = Some(self.build_relation(p)?),
                Rule::child => child = Some(self.build_child(p)?),
                _ => return Err(unexpected_parse(p.as_str())),
            }
        }
        match (relation, child) {
            (Some(relation), Some(child)) => Ok(Link {
                relation,
                negated,
                optional,
                child,
            }),
            _ => Err(unexpected_parse("link")),
        }
    }

    fn build_child(&self, pair: Pair<'_, Rule>) -> Result<PatternNode, PatternSyntaxError> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| unexpected_parse("child"))?;
        match inner.as_rule() {
            Rule::node => self.build_node(inner),
            Rule::description => build_description(inner),
            _ => Err(unexpected_parse(inner.as_str())),
        }
    }

    fn build_relation(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<std::sync::Arc<Relation>, PatternSyntaxError> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| unexpected_parse("relation"))?;
        let rel = match inner.as_rule() {
            Rule::rel_symbol => self.symbol_relation(inner.as_str())?,
            Rule::unbroken => build_unbroken(inner)?,
            _ => return Err(unexpected_parse(inner.as_str())),
        };
        Ok(rel.intern())
    }

    fn symbol_relation(&self, sym: &str) -> Result<Relation, PatternSyntaxError> {
        let rel = match sym {
            "<" => Relation::ParentOf,
            ">" => Relation::ChildOf,
            "<<" => Relation::Dominates,
            ">>" => Relation::DominatedBy,
            ".." => Relation::Precedes,
            ",," => Relation::Follows,
            "." => Relation::ImmediatelyPrecedes,
            "," => Relation::ImmediatelyFollows,
            "<<," => Relation::HasLeftmostDescendant,
            ">>," => Relation::LeftmostDescendantOf,
            "<<-" => Relation::HasRightmostDescendant,
            ">>-" => Relation::RightmostDescendantOf,
            "$" => Relation::SisterOf,
            "$++" => Relation::LeftSisterOf,
            "$--" => Relation::RightSisterOf,
            "$+" => Relation::ImmediateLeftSisterOf,
            "$-" => Relation::ImmediateRightSisterOf,
            "<:" => Relation::HasOnlyChild,
            ">:" => Relation::OnlyChildOf,
            "<<:" => Relation::HasUnaryPathDescendant,
            ">>:" => Relation::UnaryPathAncestorOf,
            "==" => Relation::Equals,
            "<#" => Relation::ImmediatelyHeadedBy(self.require_finder(sym)?),
            ">#" => Relation::ImmediatelyHeads(self.require_finder(sym)?),
            "<<#" => Relation::HeadedBy(self.require_finder(sym)?),
            ">>#" => Relation::Heads(self.require_finder(sym)?),
            _ => self.ith_relation(sym)?,
        };
        Ok(rel)
    }

    /// `<N`, `<-N`, `<-`, `>N`, `>-N`, `>-` with a nonzero index
    fn ith_relation(&self, sym: &str) -> Result<Relation, PatternSyntaxError> {
        let (parent_side, rest) = match sym.split_at(1) {
            ("<", rest) => (true, rest),
            (">", rest) => (false, rest),
            _ => return Err(unexpected_parse(sym)),
        };
        let i: i32 = if rest == "-" {
            -1
        } else {
            rest.parse().map_err(|_| unexpected_parse(sym))?
        };
        if i == 0 {
            return Err(PatternSyntaxError::ZeroChildIndex);
        }
        Ok(if parent_side {
            Relation::HasIthChild(i)
        } else {
            Relation::IthChildOf(i)
        })
    }

    fn require_finder(&self, sym: &str) -> Result<SharedHeadFinder, PatternSyntaxError> {
        self.head_finder
            .clone()
            .ok_or_else(|| PatternSyntaxError::MissingHeadFinder(sym.to_string()))
    }
}

fn build_unbroken(pair: Pair<'_, Rule>) -> Result<Relation, PatternSyntaxError> {
    let mut op = "";
    let mut negated = false;
    let mut filter = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::unbroken_op => op = p.as_str(),
            Rule::filter_negation => negated = true,
            Rule::regex => {
                let (source, bindings) = regex_parts(p);
                if !bindings.is_empty() {
                    return Err(PatternSyntaxError::BindingInFilter);
                }
                filter = Some(
                    LabelFilter::new(&source, negated).map_err(|e| PatternSyntaxError::Regex {
                        pattern: source,
                        source: e,
                    })?,
                );
            }
            _ => return Err(unexpected_parse(p.as_str())),
        }
    }
    let filter = filter.ok_or_else(|| unexpected_parse("unbroken"))?;
    Ok(match op {
        "<+" => Relation::UnbrokenDominates(filter),
        ">+" => Relation::UnbrokenDominatedBy(filter),
        ".+" => Relation::UnbrokenPrecedes(filter),
        _ => Relation::UnbrokenFollows(filter),
    })
}

fn build_description(pair: Pair<'_, Rule>) -> Result<PatternNode, PatternSyntaxError> {
    let mut negated = false;
    let mut name = None;
    let mut description = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::negation => negated = true,
            Rule::binding => {
                let ident = p
                    .into_inner()
                    .next()
                    .ok_or_else(|| unexpected_parse("binding"))?;
                name = Some(ident.as_str().to_string());
            }
            Rule::desc_body => description = Some(build_desc_body(p)?),
            _ => return Err(unexpected_parse(p.as_str())),
        }
    }
    let description = description.ok_or_else(|| unexpected_parse("description"))?;
    if name.is_some() && matches!(description, Description::Reference(_)) {
        return Err(PatternSyntaxError::NamedBackreference);
    }
    Ok(PatternNode {
        description,
        negated,
        name,
        links: Vec::new(),
    })
}

fn build_desc_body(pair: Pair<'_, Rule>) -> Result<Description, PatternSyntaxError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| unexpected_parse("description"))?;
    match inner.as_rule() {
        Rule::wildcard => Ok(Description::Wildcard),
        Rule::regex => {
            let (source, bindings) = regex_parts(inner);
            let regex = Regex::new(&source).map_err(|e| PatternSyntaxError::Regex {
                pattern: source.clone(),
                source: e,
            })?;
            Ok(Description::Regex(DescriptionRegex::new(regex, bindings)))
        }
        Rule::quoted => {
            let body = inner
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            Ok(Description::Literal(vec![unescape(body)]))
        }
        Rule::reference => Ok(Description::Reference(ident_of(inner)?)),
        Rule::link_ref => Ok(Description::Link(ident_of(inner)?)),
        Rule::literal => literal_description(inner.as_str()),
        _ => Err(unexpected_parse(inner.as_str())),
    }
}

/// Split a bare literal into `|` alternates, de-escaping each and
/// rejecting raw special characters.
fn literal_description(text: &str) -> Result<Description, PatternSyntaxError> {
    let mut alternates = Vec::new();
    for alt in split_alternates(text) {
        if alt.is_empty() {
            return Err(PatternSyntaxError::EmptyAlternate(text.to_string()));
        }
        let mut out = String::with_capacity(alt.len());
        let mut chars = alt.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(esc) = chars.next() {
                        out.push(esc);
                    }
                }
                '*' | '$' | '#' | '&' | '%' | '!' => {
                    return Err(PatternSyntaxError::SpecialInLiteral {
                        ch: c,
                        literal: text.to_string(),
                    });
                }
                _ => out.push(c),
            }
        }
        alternates.push(out);
    }
    Ok(Description::Literal(alternates))
}

/// Split on unescaped `|`
fn split_alternates(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '|' {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Pull the regex source (with `\/` de-escaped) and the group bindings
/// out of a `regex` pair.
fn regex_parts(pair: Pair<'_, Rule>) -> (String, Vec<(usize, String)>) {
    let mut source = String::new();
    let mut bindings = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::regex_body => {
                let body = p.as_str();
                let mut chars = body.chars().peekable();
                while let Some(c) = chars.next() {
                    if c == '\\' && chars.peek() == Some(&'/') {
                        source.push('/');
                        chars.next();
                    } else {
                        source.push(c);
                    }
                }
            }
            Rule::group_binding => {
                let mut group = 0usize;
                let mut var = String::new();
                for part in p.into_inner() {
                    match part.as_rule() {
                        Rule::number => group = part.as_str().parse().unwrap_or(0),
                        Rule::ident => var = part.as_str().to_string(),
                        _ => {}
                    }
                }
                bindings.push((group, var));
            }
            _ => {}
        }
    }
    (source, bindings)
}

fn ident_of(pair: Pair<'_, Rule>) -> Result<String, PatternSyntaxError> {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| unexpected_parse("name"))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(esc) = chars.next() {
                out.push(esc);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Internal invariant breach: the grammar produced a shape the builder
/// does not recognize. Reported as a positionless grammar error rather
/// than a panic.
fn unexpected_parse(context: &str) -> PatternSyntaxError {
    use pest::error::{Error, ErrorVariant};
    PatternSyntaxError::Grammar(Box::new(Error::new_from_pos(
        ErrorVariant::CustomError {
            message: format!("malformed pattern near \"{context}\""),
        },
        pest::Position::from_start(""),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::{HeadSearch, TableHeadFinder};
    use std::sync::Arc;

    fn compile(text: &str) -> Pattern {
        Pattern::compile(text).unwrap()
    }

    #[test]
    fn test_simple_pattern() {
        let p = compile("NP < DT");
        assert_eq!(
            p.root().description,
            Description::Literal(vec!["NP".to_string()])
        );
        assert_eq!(p.root().links.len(), 1);
        let link = &p.root().links[0];
        assert_eq!(*link.relation, Relation::ParentOf);
        assert!(!link.negated && !link.optional);
        assert_eq!(
            link.child.description,
            Description::Literal(vec!["DT".to_string()])
        );
    }

    #[test]
    fn test_sibling_links_attach_to_first_node() {
        // both links belong to NP
        let p = compile("NP < DT < NN");
        assert_eq!(p.root().links.len(), 2);
        assert!(p.root().links.iter().all(|l| l.child.links.is_empty()));
    }

    #[test]
    fn test_parenthesized_child_takes_links() {
        let p = compile("S < (NP < DT)");
        assert_eq!(p.root().links.len(), 1);
        let np = &p.root().links[0].child;
        assert_eq!(np.links.len(), 1);
        assert_eq!(*np.links[0].relation, Relation::ParentOf);
    }

    #[test]
    fn test_names_and_backreferences() {
        let p = compile("S < NP=subj < (VP < =subj)");
        assert_eq!(p.root().links[0].child.name.as_deref(), Some("subj"));
        let vp = &p.root().links[1].child;
        assert_eq!(
            vp.links[0].child.description,
            Description::Reference("subj".to_string())
        );
        assert!(matches!(
            Pattern::compile("NP < =x=y"),
            Err(PatternSyntaxError::NamedBackreference)
        ));
    }

    #[test]
    fn test_link_description() {
        let p = compile("NP=n $ ~n");
        assert_eq!(
            p.root().links[0].child.description,
            Description::Link("n".to_string())
        );
    }

    #[test]
    fn test_negated_and_optional_links() {
        let p = compile("NP !< DT ?< JJ");
        assert!(p.root().links[0].negated);
        assert!(!p.root().links[0].optional);
        assert!(p.root().links[1].optional);
        // a single prefix slot: "!?" cannot parse
        assert!(Pattern::compile("NP !?< DT").is_err());
    }

    #[test]
    fn test_negated_description() {
        let p = compile("NP < !DT");
        assert!(p.root().links[0].child.negated);
        assert!(!p.root().links[0].negated);
    }

    #[test]
    fn test_alternation_and_quoting() {
        let p = compile("NN|NNS|NNP < dog");
        assert_eq!(
            p.root().description,
            Description::Literal(vec![
                "NN".to_string(),
                "NNS".to_string(),
                "NNP".to_string()
            ])
        );
        let q = compile("\"N*\" < dog");
        assert_eq!(q.root().description, Description::Literal(vec!["N*".to_string()]));
    }

    #[test]
    fn test_raw_specials_rejected_escapes_allowed() {
        assert!(matches!(
            Pattern::compile("NP < N*"),
            Err(PatternSyntaxError::SpecialInLiteral { ch: '*', .. })
        ));
        assert!(matches!(
            Pattern::compile("NP < a#b"),
            Err(PatternSyntaxError::SpecialInLiteral { ch: '#', .. })
        ));
        let p = compile("NP < a\\#b");
        assert_eq!(
            p.root().links[0].child.description,
            Description::Literal(vec!["a#b".to_string()])
        );
    }

    #[test]
    fn test_regex_description_with_bindings() {
        let p = compile("/^(NP|PP)-(.+)$/#1%cat#2%func < DT");
        match &p.root().description {
            Description::Regex(re) => {
                assert_eq!(
                    re.bindings(),
                    &[(1, "cat".to_string()), (2, "func".to_string())]
                );
                assert!(re.is_match("NP-SBJ"));
            }
            other => panic!("expected regex description, got {other:?}"),
        }
        assert!(matches!(
            Pattern::compile("/([/ < DT"),
            Err(PatternSyntaxError::Regex { .. })
        ));
    }

    #[test]
    fn test_escaped_slash_in_regex() {
        let p = compile("/a\\/b/ < DT");
        match &p.root().description {
            Description::Regex(re) => assert!(re.is_match("a/b")),
            other => panic!("expected regex description, got {other:?}"),
        }
    }

    #[test]
    fn test_ith_child_symbols() {
        assert_eq!(*compile("NP <2 NN").root().links[0].relation, Relation::HasIthChild(2));
        assert_eq!(
            *compile("NP <-1 NN").root().links[0].relation,
            Relation::HasIthChild(-1)
        );
        assert_eq!(
            *compile("NP <- NN").root().links[0].relation,
            Relation::HasIthChild(-1)
        );
        assert_eq!(*compile("NN >3 NP").root().links[0].relation, Relation::IthChildOf(3));
        assert!(matches!(
            Pattern::compile("NP <0 NN"),
            Err(PatternSyntaxError::ZeroChildIndex)
        ));
    }

    #[test]
    fn test_longest_symbol_wins() {
        assert_eq!(
            *compile("NP <<, DT").root().links[0].relation,
            Relation::HasLeftmostDescendant
        );
        assert_eq!(*compile("NP << DT").root().links[0].relation, Relation::Dominates);
        assert_eq!(
            *compile("NP <<- NN").root().links[0].relation,
            Relation::HasRightmostDescendant
        );
        assert_eq!(*compile("NP .. VP").root().links[0].relation, Relation::Precedes);
        assert_eq!(
            *compile("NP . VP").root().links[0].relation,
            Relation::ImmediatelyPrecedes
        );
    }

    #[test]
    fn test_unbroken_relations() {
        let p = compile("NP <+(/NP/) NN");
        match &*p.root().links[0].relation {
            Relation::UnbrokenDominates(f) => {
                assert!(f.admits("NP"));
                assert!(!f.admits("VP"));
            }
            other => panic!("expected unbroken domination, got {other:?}"),
        }
        let q = compile("CC .+(!/NP/) CC");
        match &*q.root().links[0].relation {
            Relation::UnbrokenPrecedes(f) => {
                assert!(!f.admits("NP"));
                assert!(f.admits("CC"));
            }
            other => panic!("expected unbroken precedence, got {other:?}"),
        }
        assert!(matches!(
            Pattern::compile("NP <+(/N(P)/#1%x) NN"),
            Err(PatternSyntaxError::BindingInFilter)
        ));
    }

    #[test]
    fn test_head_relations_require_finder() {
        assert!(matches!(
            Pattern::compile("VP <# VBZ"),
            Err(PatternSyntaxError::MissingHeadFinder(_))
        ));
        let finder = TableHeadFinder::new().rule("VP", HeadSearch::Left, &["VBZ"]);
        let p = PatternCompiler::new()
            .head_finder(Arc::new(finder))
            .compile("VP <# VBZ")
            .unwrap();
        assert!(matches!(
            &*p.root().links[0].relation,
            Relation::ImmediatelyHeadedBy(_)
        ));
    }

    #[test]
    fn test_wildcard_forms() {
        assert_eq!(compile("__ < DT").root().description, Description::Wildcard);
        assert_eq!(compile("* < DT").root().description, Description::Wildcard);
    }

    #[test]
    fn test_relations_are_interned() {
        let a = compile("NP < DT");
        let b = compile("S < VP");
        assert!(Arc::ptr_eq(
            &a.root().links[0].relation,
            &b.root().links[0].relation
        ));
    }

    #[test]
    fn test_garbage_is_a_grammar_error() {
        assert!(matches!(
            Pattern::compile("NP <"),
            Err(PatternSyntaxError::Grammar(_))
        ));
        assert!(matches!(
            Pattern::compile(""),
            Err(PatternSyntaxError::Grammar(_))
        ));
        assert!(matches!(
            Pattern::compile("(NP < DT"),
            Err(PatternSyntaxError::Grammar(_))
        ));
    }
}
