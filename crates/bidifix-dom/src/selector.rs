//! Minimal selector matching for annotation targeting.
//!
//! Supports exactly what direction-correction policies need: a
//! comma-separated list of compound simple selectors made of a tag name,
//! `.class` terms, and `[attr]` / `[attr=value]` terms.
//! Combinators are not supported and are rejected at parse time.

use std::str::FromStr;

use crate::document::{Document, NodeId};

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector syntax: `{0}`")]
    Unsupported(String),
    #[error("unterminated attribute test in `{0}`")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, Default)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && el.tag != *tag
        {
            return false;
        }
        if !self.classes.iter().all(|c| doc.has_class(id, c)) {
            return false;
        }
        self.attrs.iter().all(|test| {
            match (doc.attribute(id, &test.name), &test.value) {
                (Some(actual), Some(expected)) => actual == *expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }
}

/// A parsed selector list.
#[derive(Debug, Clone)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in source.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            alternatives.push(parse_compound(part)?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { alternatives })
    }

    /// Whether the node is an element matching any alternative.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, id))
    }

    /// Matching elements strictly under `root`, document order, without
    /// descending into shadow subtrees.
    pub fn query_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .into_iter()
            .filter(|&n| self.matches(doc, n))
            .collect()
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

fn ident_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len())
}

fn parse_compound(source: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut rest = source;

    let len = ident_len(rest);
    if len > 0 {
        compound.tag = Some(rest[..len].to_ascii_lowercase());
        rest = &rest[len..];
    }

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let len = ident_len(after);
            if len == 0 {
                return Err(SelectorError::Unsupported(source.to_string()));
            }
            compound.classes.push(after[..len].to_string());
            rest = &after[len..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else {
                return Err(SelectorError::UnterminatedAttribute(source.to_string()));
            };
            let inner = &after[..end];
            let test = match inner.split_once('=') {
                Some((name, value)) => AttrTest {
                    name: name.trim().to_ascii_lowercase(),
                    value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                },
                None => AttrTest {
                    name: inner.trim().to_ascii_lowercase(),
                    value: None,
                },
            };
            if test.name.is_empty() {
                return Err(SelectorError::Unsupported(source.to_string()));
            }
            compound.attrs.push(test);
            rest = &after[end + 1..];
        } else {
            // Anything else (whitespace, combinators, pseudo-classes).
            return Err(SelectorError::Unsupported(source.to_string()));
        }
    }

    if compound.tag.is_none() && compound.classes.is_empty() && compound.attrs.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(tag: &str, class: &str, attr: Option<(&str, &str)>) -> (Document, NodeId) {
        let mut doc = Document::new();
        let el = doc.create_element(tag);
        doc.append_child(doc.root(), el).unwrap();
        if !class.is_empty() {
            doc.add_class(el, class);
        }
        if let Some((name, value)) = attr {
            doc.set_attribute(el, name, value);
        }
        (doc, el)
    }

    #[test]
    fn matches_tag_class_and_attribute_terms() {
        let (doc, el) = doc_with("pre", "hljs", Some(("data-message-role", "assistant")));

        for source in [
            "pre",
            ".hljs",
            "pre.hljs",
            "[data-message-role]",
            "[data-message-role=assistant]",
            "[data-message-role=\"assistant\"]",
            "code, pre",
        ] {
            let selector = Selector::parse(source).unwrap();
            assert!(selector.matches(&doc, el), "selector `{source}`");
        }

        let miss = Selector::parse("code, .katex-html").unwrap();
        assert!(!miss.matches(&doc, el));
    }

    #[test]
    fn text_nodes_never_match() {
        let mut doc = Document::new();
        let text = doc.create_text("pre");
        doc.append_child(doc.root(), text).unwrap();
        let selector = Selector::parse("pre").unwrap();
        assert!(!selector.matches(&doc, text));
    }

    #[test]
    fn rejects_combinators() {
        assert!(matches!(
            Selector::parse("div p"),
            Err(SelectorError::Unsupported(_))
        ));
        assert!(matches!(
            Selector::parse("[broken"),
            Err(SelectorError::UnterminatedAttribute(_))
        ));
        assert!(matches!(Selector::parse(" ,  "), Err(SelectorError::Empty)));
    }

    #[test]
    fn query_all_walks_light_tree_only() {
        let mut doc = Document::new();
        let outer = doc.create_element("pre");
        doc.append_child(doc.root(), outer).unwrap();
        let host = doc.create_element("div");
        doc.append_child(doc.root(), host).unwrap();
        let shadow = doc
            .attach_shadow(host, crate::document::ShadowRootMode::Open)
            .unwrap();
        let hidden = doc.create_element("pre");
        doc.append_child(shadow, hidden).unwrap();

        let selector = Selector::parse("pre").unwrap();
        assert_eq!(selector.query_all(&doc, doc.root()), vec![outer]);
        assert_eq!(selector.query_all(&doc, shadow), vec![hidden]);
    }
}
