//! CSS-style selectors
//!
//! Supports the subset the navigator needs: type, `#id`, `.class`,
//! `[attr]` / `[attr=value]` compounds, the descendant combinator and
//! comma-separated selector lists.

use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character '{ch}' at offset {pos}")]
    Unexpected { ch: char, pos: usize },

    #[error("Missing name after '{0}'")]
    MissingName(char),

    #[error("Unterminated attribute selector")]
    Unterminated,
}

/// A node a selector can be evaluated against.
pub trait SelectorNode: Sized {
    fn tag(&self) -> Option<&str>;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
    fn parent(&self) -> Option<Self>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches<N: SelectorNode>(&self, node: &N) -> bool {
        let Some(tag) = node.tag() else {
            return false;
        };
        if let Some(ref wanted) = self.tag {
            if !tag.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if node.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| {
            match (node.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in input.split(',') {
            let chain = part
                .split_whitespace()
                .map(parse_compound)
                .collect::<Result<Vec<_>, _>>()?;
            if chain.is_empty() {
                return Err(SelectorError::Empty);
            }
            alternatives.push(chain);
        }
        Ok(Self { alternatives })
    }

    pub fn matches<N: SelectorNode>(&self, node: &N) -> bool {
        self.alternatives
            .iter()
            .any(|chain| matches_chain(chain, node))
    }
}

fn matches_chain<N: SelectorNode>(chain: &[Compound], node: &N) -> bool {
    let Some((last, mut remaining)) = chain.split_last() else {
        return false;
    };
    if !last.matches(node) {
        return false;
    }

    // Descendant-only chains can be matched greedily from the right.
    let mut current = node.parent();
    while let Some((target, before)) = remaining.split_last() {
        let Some(ancestor) = current else {
            return false;
        };
        if target.matches(&ancestor) {
            remaining = before;
        }
        current = ancestor.parent();
    }
    true
}

fn parse_compound(src: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut chars = src.char_indices().peekable();

    if matches!(chars.peek(), Some((_, '*'))) {
        chars.next();
    } else {
        let tag = take_ident(&mut chars);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '#' => compound.id = Some(take_name(&mut chars, '#')?),
            '.' => compound.classes.push(take_name(&mut chars, '.')?),
            '[' => {
                let name = take_name(&mut chars, '[')?;
                match chars.next() {
                    Some((_, ']')) => compound.attributes.push((name, None)),
                    Some((_, '=')) => {
                        let value = take_value(&mut chars)?;
                        match chars.next() {
                            Some((_, ']')) => compound.attributes.push((name, Some(value))),
                            Some((pos, ch)) => return Err(SelectorError::Unexpected { ch, pos }),
                            None => return Err(SelectorError::Unterminated),
                        }
                    }
                    Some((pos, ch)) => return Err(SelectorError::Unexpected { ch, pos }),
                    None => return Err(SelectorError::Unterminated),
                }
            }
            _ => return Err(SelectorError::Unexpected { ch, pos }),
        }
    }

    Ok(compound)
}

fn take_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn take_name(chars: &mut Peekable<CharIndices<'_>>, after: char) -> Result<String, SelectorError> {
    let name = take_ident(chars);
    if name.is_empty() {
        Err(SelectorError::MissingName(after))
    } else {
        Ok(name)
    }
}

fn take_value(chars: &mut Peekable<CharIndices<'_>>) -> Result<String, SelectorError> {
    match chars.peek() {
        Some(&(_, quote @ ('"' | '\''))) => {
            chars.next();
            let mut value = String::new();
            for (_, ch) in chars.by_ref() {
                if ch == quote {
                    return Ok(value);
                }
                value.push(ch);
            }
            Err(SelectorError::Unterminated)
        }
        _ => Ok(take_ident(chars)),
    }
}
