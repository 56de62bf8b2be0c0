//! A small CSS selector subset, tokenized with cssparser.
//!
//! Supported: type (`div`, `*`), class (`.a.b`), id (`#x`), attribute
//! presence and equality (`[data-gallery]`, `[data-gallery="cats"]`), the
//! descendant combinator (whitespace) and selector lists (`,`). That covers
//! every structural query the page modules and the lightbox make.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use indextree::{Arena, NodeId};

use crate::error::{DomError, DomResult};
use crate::node::{Element, NodeKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && tag != el.tag() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, expected)| {
            let actual = if name == "class" {
                (!el.classes.is_empty()).then(|| el.classes.join(" "))
            } else {
                el.attr(name).map(str::to_string)
            };
            match (actual, expected) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => &actual == expected,
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

type Step<'i, T> = Result<T, ParseError<'i, &'static str>>;

/// `name`, `name=ident` or `name="string"` inside `[...]`.
fn parse_attribute<'i>(input: &mut Parser<'i, '_>) -> Step<'i, (String, Option<String>)> {
    let name = input.expect_ident()?.to_ascii_lowercase();
    if input.is_exhausted() {
        return Ok((name, None));
    }
    input.expect_delim('=')?;
    let value = input.expect_ident_or_string()?.to_string();
    input.expect_exhausted()?;
    Ok((name, Some(value)))
}

fn parse_list<'i>(input: &mut Parser<'i, '_>) -> Step<'i, Vec<Vec<Compound>>> {
    let mut alternatives = Vec::new();
    let mut parts: Vec<Compound> = Vec::new();
    let mut current: Option<Compound> = None;

    loop {
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(_) => parts.extend(current.take()),
            Token::Comma => {
                parts.extend(current.take());
                if parts.is_empty() {
                    return Err(input.new_custom_error("empty selector"));
                }
                alternatives.push(std::mem::take(&mut parts));
            }
            Token::Ident(tag) if current.is_none() => {
                current = Some(Compound {
                    tag: Some(tag.to_ascii_lowercase()),
                    ..Compound::default()
                });
            }
            Token::Delim('*') if current.is_none() => {
                current = Some(Compound {
                    tag: Some("*".to_string()),
                    ..Compound::default()
                });
            }
            Token::Delim('.') => {
                let class = match input.next_including_whitespace() {
                    Ok(Token::Ident(class)) => Some(class.to_string()),
                    _ => None,
                };
                let class = class.ok_or_else(|| input.new_custom_error("expected a class name"))?;
                current.get_or_insert_with(Compound::default).classes.push(class);
            }
            Token::IDHash(id) => {
                current.get_or_insert_with(Compound::default).id = Some(id.to_string());
            }
            Token::SquareBracketBlock => {
                let attr = input.parse_nested_block(parse_attribute)?;
                current.get_or_insert_with(Compound::default).attrs.push(attr);
            }
            _ => return Err(input.new_custom_error("unsupported selector syntax")),
        }
    }

    parts.extend(current.take());
    if parts.is_empty() {
        return Err(input.new_custom_error("empty selector"));
    }
    alternatives.push(parts);
    Ok(alternatives)
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> DomResult<Self> {
        let mut input = ParserInput::new(source);
        let mut parser = Parser::new(&mut input);
        parse_list(&mut parser)
            .map(|alternatives| Self { alternatives })
            .map_err(|err| {
                let reason = match err.kind {
                    ParseErrorKind::Custom(reason) => reason,
                    ParseErrorKind::Basic(_) => "unexpected token",
                };
                DomError::selector(source, reason)
            })
    }

    /// Whether `node` matches any alternative.
    pub(crate) fn matches(&self, arena: &Arena<NodeKind>, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|parts| matches_complex(parts, arena, node))
    }
}

fn element(arena: &Arena<NodeKind>, node: NodeId) -> Option<&Element> {
    if node.is_removed(arena) {
        return None;
    }
    arena.get(node).and_then(|n| n.get().as_element())
}

fn matches_complex(parts: &[Compound], arena: &Arena<NodeKind>, node: NodeId) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    match element(arena, node) {
        Some(el) if last.matches(el) => {}
        _ => return false,
    }

    // Descendant-only combinators, so a greedy walk up the ancestors is exact.
    let mut ancestors = node.ancestors(arena).skip(1);
    for part in rest.iter().rev() {
        loop {
            match ancestors.next() {
                Some(ancestor) => {
                    if element(arena, ancestor).is_some_and(|el| part.matches(el)) {
                        break;
                    }
                }
                None => return false,
            }
        }
    }
    true
}
