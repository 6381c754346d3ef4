// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CSS selector subset with `querySelectorAll` semantics.
//!
//! Supported syntax:
//!
//! - type selectors and `*`
//! - `#id`, `.class`
//! - `[attr]`, `[attr=value]`, `[attr~=value]`, `[attr^=value]`, `[attr$=value]`,
//!   `[attr*=value]` (values quoted or bare)
//! - `:scope`, `:first-child`, `:last-child`
//! - descendant (whitespace), child (`>`), next-sibling (`+`) and
//!   subsequent-sibling (`~`) combinators
//! - comma-separated selector lists
//!
//! Matching never looks through a shadow boundary: a shadow root is the top of
//! the tree as seen by the nodes inside it.

use crate::types::NodeKind;
use crate::{Error, NodeId, Tree};

/// A parsed selector list.
///
/// ```rust
/// use wafer_dom::{Selector, Tree};
///
/// let mut tree = Tree::default();
/// let root = tree.parse_fragment(r#"<ul><li class="a">1</li><li>2</li></ul>"#);
///
/// let selector = Selector::parse("ul > li.a").unwrap();
/// let found = tree.select(root, &selector);
/// assert_eq!(found.len(), 1);
/// assert_eq!(tree.text_content(found[0]), "1");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    /// Compounds left to right.
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    simples: Vec<Simple>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Simple {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    Scope,
    FirstChild,
    LastChild,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

impl Selector {
    /// Parses a selector list.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
        };
        let alternatives = parser.selector_list()?;
        Ok(Self { alternatives })
    }

    /// Returns `true` if `node` matches any alternative, with `scope` as the
    /// node `:scope` refers to.
    #[must_use]
    pub fn matches(&self, tree: &Tree, node: NodeId, scope: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| matches_complex(tree, node, complex, complex.compounds.len() - 1, scope))
    }
}

impl Tree {
    /// All elements under `root` (excluding `root`) matching `selector`, in
    /// tree order.
    #[must_use]
    pub fn select(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.is_element(*node) && selector.matches(self, *node, root))
            .collect()
    }

    /// Parses `selector` and runs [`Tree::select`].
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(root, &selector))
    }

    /// The first element under `root` matching `selector`.
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>, Error> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .find(|node| self.is_element(*node) && selector.matches(self, *node, root)))
    }
}

fn matches_complex(tree: &Tree, node: NodeId, complex: &Complex, at: usize, scope: NodeId) -> bool {
    if !matches_compound(tree, node, &complex.compounds[at], scope) {
        return false;
    }
    if at == 0 {
        return true;
    }
    let next = at - 1;
    match complex.combinators[next] {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|parent| matches_complex(tree, parent, complex, next, scope)),
        Combinator::Descendant => {
            let mut cursor = tree.parent(node);
            while let Some(ancestor) = cursor {
                if matches_complex(tree, ancestor, complex, next, scope) {
                    return true;
                }
                cursor = tree.parent(ancestor);
            }
            false
        }
        Combinator::NextSibling => tree
            .previous_element_sibling(node)
            .is_some_and(|sibling| matches_complex(tree, sibling, complex, next, scope)),
        Combinator::SubsequentSibling => {
            let mut cursor = tree.previous_element_sibling(node);
            while let Some(sibling) = cursor {
                if matches_complex(tree, sibling, complex, next, scope) {
                    return true;
                }
                cursor = tree.previous_element_sibling(sibling);
            }
            false
        }
    }
}

fn matches_compound(tree: &Tree, node: NodeId, compound: &Compound, scope: NodeId) -> bool {
    let Some(NodeKind::Element(element)) = tree.kind(node) else {
        // Only a bare `:scope` can match a non-element scoping root.
        return compound.tag.is_none()
            && !compound.simples.is_empty()
            && compound.simples.iter().all(|simple| *simple == Simple::Scope)
            && node == scope;
    };
    if let Some(tag) = &compound.tag {
        if !element.name().eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(tree, node, simple, scope))
}

fn matches_simple(tree: &Tree, node: NodeId, simple: &Simple, scope: NodeId) -> bool {
    match simple {
        Simple::Id(id) => tree.attribute(node, "id").is_some_and(|value| value == *id),
        Simple::Class(class) => tree
            .attribute(node, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class.as_str())),
        Simple::Attribute { name, test } => {
            let Some(value) = tree.attribute(node, name) else {
                return false;
            };
            match test {
                None => true,
                Some((AttrOp::Equals, expected)) => *value == **expected,
                Some((AttrOp::Includes, expected)) => {
                    value.split_ascii_whitespace().any(|word| word == expected.as_str())
                }
                Some((AttrOp::Prefix, expected)) => {
                    !expected.is_empty() && value.starts_with(expected.as_str())
                }
                Some((AttrOp::Suffix, expected)) => {
                    !expected.is_empty() && value.ends_with(expected.as_str())
                }
                Some((AttrOp::Substring, expected)) => {
                    !expected.is_empty() && value.contains(expected.as_str())
                }
            }
        }
        Simple::Scope => node == scope,
        Simple::FirstChild => tree.previous_element_sibling(node).is_none() && tree.parent(node).is_some(),
        Simple::LastChild => tree.next_element_sibling(node).is_none() && tree.parent(node).is_some(),
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: core::iter::Peekable<core::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidSelector {
            selector: self.input.to_owned(),
            reason: reason.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn selector_list(&mut self) -> Result<Vec<Complex>, Error> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.complex()?);
            match self.chars.next() {
                None => return Ok(alternatives),
                Some((_, ',')) => continue,
                Some((at, c)) => return Err(self.error(format!("unexpected `{c}` at {at}"))),
            }
        }
    }

    fn complex(&mut self) -> Result<Complex, Error> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if spaced => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
            };
            if combinator != Combinator::Descendant {
                self.chars.next();
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, Error> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.chars.next();
            }
            Some(c) if is_ident_char(c) => compound.tag = Some(self.ident()?.to_ascii_lowercase()),
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.chars.next();
                    compound.simples.push(Simple::Id(self.ident()?));
                }
                Some('.') => {
                    self.chars.next();
                    compound.simples.push(Simple::Class(self.ident()?));
                }
                Some('[') => {
                    self.chars.next();
                    compound.simples.push(self.attribute()?);
                }
                Some(':') => {
                    self.chars.next();
                    let name = self.ident()?.to_ascii_lowercase();
                    compound.simples.push(match name.as_str() {
                        "scope" => Simple::Scope,
                        "first-child" => Simple::FirstChild,
                        "last-child" => Simple::LastChild,
                        _ => return Err(self.error(format!("unsupported pseudo-class `:{name}`"))),
                    });
                }
                _ => break,
            }
        }
        if compound.tag.is_none() && compound.simples.is_empty() && !self.just_saw_star() {
            return Err(self.error("expected a compound selector"));
        }
        Ok(compound)
    }

    fn just_saw_star(&self) -> bool {
        let consumed = self
            .chars
            .clone()
            .next()
            .map_or(self.input.len(), |(at, _)| at);
        self.input[..consumed].trim_end().ends_with('*')
    }

    fn attribute(&mut self) -> Result<Simple, Error> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let op = match self.chars.next() {
            Some((_, ']')) => return Ok(Simple::Attribute { name, test: None }),
            Some((_, '=')) => AttrOp::Equals,
            Some((_, c @ ('~' | '^' | '$' | '*'))) => {
                if self.chars.next().map(|(_, c)| c) != Some('=') {
                    return Err(self.error("expected `=` in attribute selector"));
                }
                match c {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = self.chars.next() {
                                value.push(escaped);
                            }
                        }
                        Some((_, c)) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if self.chars.next().map(|(_, c)| c) != Some(']') {
            return Err(self.error("expected `]`"));
        }
        Ok(Simple::Attribute {
            name,
            test: Some((op, value)),
        })
    }

    fn ident(&mut self) -> Result<String, Error> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.chars.next();
                if let Some((_, escaped)) = self.chars.next() {
                    ident.push(escaped);
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
