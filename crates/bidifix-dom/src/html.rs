//! HTML ingestion.
//!
//! Translates markup parsed by `scraper` into the arena document. Used by
//! the demo binary and by tests to stand up realistic trees; the engine
//! itself never parses markup.
//!
//! `<template shadowrootmode="open"|"closed">` is promoted to a shadow
//! root on its parent element. Only the first such template per host is
//! promoted, matching how browsers treat declarative shadow roots.

use anyhow::{Context, Result};
use ego_tree::NodeRef;
use scraper::node::{Element, Node as ScrapedNode};
use scraper::Html;

use crate::document::{Document, NodeId, ShadowRootMode};

/// Parse a full HTML document; the returned tree is rooted at `body`.
pub fn parse_document(html: &str) -> Result<Document> {
    let parsed = Html::parse_document(html);
    let body = parsed
        .tree
        .root()
        .descendants()
        .find(|n| {
            n.value()
                .as_element()
                .is_some_and(|el| el.name().eq_ignore_ascii_case("body"))
        })
        .context("document has no body element")?;

    let mut doc = Document::with_root("body");
    let root = doc.root();
    if let Some(el) = body.value().as_element() {
        copy_attributes(&mut doc, root, el);
    }
    import_children(&mut doc, root, body)?;
    Ok(doc)
}

/// Parse an HTML fragment and append its top-level nodes under `parent`.
///
/// Each top-level subtree is built detached and appended in one step, so
/// an observer over `parent` sees exactly one child-list record per top
/// node, the same shape a host pipeline produces when it inserts a fully
/// rendered message.
pub fn append_fragment(doc: &mut Document, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
    let parsed = Html::parse_fragment(html);
    let top = fragment_top(parsed.tree.root());
    let mut added = Vec::new();
    for child in top.children() {
        if let Some(id) = import_node(doc, child)? {
            doc.append_child(parent, id)?;
            added.push(id);
        }
    }
    Ok(added)
}

/// Drill through the scaffolding (`html`/`head`/`body` wrappers) the
/// fragment parser adds around the actual content.
fn fragment_top(root: NodeRef<'_, ScrapedNode>) -> NodeRef<'_, ScrapedNode> {
    let mut current = root;
    loop {
        let mut children = current.children();
        let sole = match (children.next(), children.next()) {
            (Some(only), None) => only,
            _ => return current,
        };
        let is_wrapper = sole.value().as_element().is_some_and(|el| {
            matches!(el.name().to_ascii_lowercase().as_str(), "html" | "head" | "body")
        });
        if !is_wrapper {
            return current;
        }
        current = sole;
    }
}

fn copy_attributes(doc: &mut Document, id: NodeId, el: &Element) {
    for (name, value) in el.attrs() {
        doc.set_attribute(id, name, value);
    }
}

/// Build one scraped node as a detached subtree under this document.
/// Returns `None` for nodes that do not carry content (comments,
/// whitespace-only text, promoted shadow templates).
fn import_node(doc: &mut Document, node: NodeRef<'_, ScrapedNode>) -> Result<Option<NodeId>> {
    match node.value() {
        ScrapedNode::Text(text) => {
            let content: &str = text;
            if content.trim().is_empty() {
                return Ok(None);
            }
            Ok(Some(doc.create_text(content)))
        }
        ScrapedNode::Element(el) => {
            let id = doc.create_element(el.name());
            copy_attributes(doc, id, el);
            import_children(doc, id, node)?;
            Ok(Some(id))
        }
        _ => Ok(None),
    }
}

fn import_children(
    doc: &mut Document,
    parent: NodeId,
    node: NodeRef<'_, ScrapedNode>,
) -> Result<()> {
    let mut shadow_attached = false;
    for child in node.children() {
        if let ScrapedNode::Element(el) = child.value()
            && !shadow_attached
            && doc.is_element(parent)
            && el.name().eq_ignore_ascii_case("template")
            && let Some(mode) = declared_shadow_mode(el)
        {
            let shadow = doc.attach_shadow(parent, mode)?;
            import_children(doc, shadow, template_contents(child))?;
            shadow_attached = true;
            continue;
        }
        if let Some(id) = import_node(doc, child)? {
            doc.append_child(parent, id)?;
        }
    }
    Ok(())
}

/// The parser stores `<template>` contents in a separate fragment node
/// hanging off the template element, not as its direct children.
fn template_contents(template: NodeRef<'_, ScrapedNode>) -> NodeRef<'_, ScrapedNode> {
    template
        .children()
        .find(|c| matches!(c.value(), ScrapedNode::Fragment))
        .unwrap_or(template)
}

fn declared_shadow_mode(el: &Element) -> Option<ShadowRootMode> {
    let mode = el.attr("shadowrootmode").or_else(|| el.attr("shadowroot"))?;
    match mode.to_ascii_lowercase().as_str() {
        "open" => Some(ShadowRootMode::Open),
        "closed" => Some(ShadowRootMode::Closed),
        _ => None,
    }
}
