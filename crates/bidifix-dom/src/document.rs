//! Arena-backed document tree.
//!
//! Nodes are allocated in a flat arena and addressed by [`NodeId`]. Ids
//! stay valid for the lifetime of the document; a detached node keeps its
//! slot and simply becomes unreachable from the root. Shadow roots live in
//! the same arena but are never reachable through `children`/`descendants`
//! of their host, which is what keeps ordinary queries from seeing them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::observer::{MutationKind, MutationRecord, ObserverState};

/// Stable handle to a node in a [`Document`] arena.
///
/// Ids are only minted by the owning document and must not be used against
/// a different one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a shadow root was attached to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowRootMode {
    /// Contents are discoverable through [`Document::shadow_probe`].
    Open,
    /// Attachment is observable, contents are not reachable from outside.
    Closed,
}

/// Result of probing an element for an attached shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowProbe {
    /// No shadow root is attached.
    None,
    /// An open root; its scope node is returned.
    Open(NodeId),
    /// A closed root exists but its contents are off limits.
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct ShadowAttachment {
    mode: ShadowRootMode,
    root: NodeId,
}

/// Element payload: tag, attributes, class list, inline style.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    shadow: Option<ShadowAttachment>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
            shadow: None,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn style(&self) -> &BTreeMap<String, String> {
        &self.style
    }
}

/// Node payload variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// Scope node of a shadow subtree; `host` points back at the element
    /// the subtree is attached to.
    ShadowRoot { mode: ShadowRootMode, host: NodeId },
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Errors for structural edits. Marker-style writes (classes, attributes,
/// inline style) are deliberately lenient instead: applied to a non-element
/// they do nothing, so annotation passes never fail mid-walk.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("node cannot contain children")]
    ParentNotContainer,
    #[error("child is already attached to a parent")]
    ChildAlreadyAttached,
    #[error("edit would create a cycle")]
    WouldCycle,
    #[error("node is not a text node")]
    NotAText,
    #[error("shadow host must be an element")]
    ShadowHostNotElement,
    #[error("element already hosts a shadow root")]
    ShadowAlreadyAttached,
}

/// A mutable document tree plus its mutation-observer registry.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    pub(crate) observers: Vec<ObserverState>,
    pub(crate) next_observer: u64,
    mutations: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with a `body` root element.
    pub fn new() -> Self {
        Self::with_root("body")
    }

    /// Empty document rooted at an element with the given tag.
    pub fn with_root(tag: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            observers: Vec::new(),
            next_observer: 0,
            mutations: 0,
        };
        doc.root = doc.alloc(NodeKind::Element(ElementData::new(tag)));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of writes that actually changed the tree. Idempotent
    /// re-writes (same class, same attribute value) do not count.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    // ---------------------------------------------------------------
    // Construction / structural edits
    // ---------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Attach a detached node under `parent` (element or shadow root).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        match self.node(parent).kind {
            NodeKind::Element(_) | NodeKind::ShadowRoot { .. } => {}
            NodeKind::Text(_) => return Err(DomError::ParentNotContainer),
        }
        // Cycle detection first: an attached ancestor is still a cycle.
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(DomError::WouldCycle);
        }
        if self.node(child).parent.is_some() {
            return Err(DomError::ChildAlreadyAttached);
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        self.notify(
            parent,
            MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        );
        Ok(())
    }

    /// Detach a subtree from its parent. No-op for already-detached nodes.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else {
            return;
        };
        self.node_mut(parent).children.retain(|&c| c != node);
        self.node_mut(node).parent = None;
        self.notify(
            parent,
            MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![node],
            },
        );
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node).kind {
            NodeKind::Text(current) => {
                if current == text {
                    return Ok(());
                }
                *current = text.to_string();
            }
            _ => return Err(DomError::NotAText),
        }
        self.notify(node, MutationKind::CharacterData);
        Ok(())
    }

    /// Attach a shadow root to a host element and return its scope node.
    ///
    /// The returned id is the only handle to a closed root's contents,
    /// mirroring how the attaching code alone keeps that reference.
    pub fn attach_shadow(
        &mut self,
        host: NodeId,
        mode: ShadowRootMode,
    ) -> Result<NodeId, DomError> {
        match &self.node(host).kind {
            NodeKind::Element(el) => {
                if el.shadow.is_some() {
                    return Err(DomError::ShadowAlreadyAttached);
                }
            }
            _ => return Err(DomError::ShadowHostNotElement),
        }
        let root = self.alloc(NodeKind::ShadowRoot { mode, host });
        if let NodeKind::Element(el) = &mut self.node_mut(host).kind {
            el.shadow = Some(ShadowAttachment { mode, root });
        }
        Ok(root)
    }

    // ---------------------------------------------------------------
    // Annotation writes (lenient, idempotent)
    // ---------------------------------------------------------------

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Set an attribute. `class` and `style` route into the class list and
    /// style map so the two views never diverge.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => {
                for class in value.split_whitespace() {
                    self.add_class(id, class);
                }
                return;
            }
            "style" => {
                for (prop, val) in crate::style::parse_inline_declarations(value) {
                    self.set_style_property(id, &prop, &val);
                }
                return;
            }
            _ => {}
        }
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if el.attributes.get(&name).is_some_and(|v| v == value) {
            return;
        }
        el.attributes.insert(name.clone(), value.to_string());
        self.notify(id, MutationKind::Attributes { name });
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let name = name.to_ascii_lowercase();
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if el.attributes.remove(&name).is_none() {
            return;
        }
        self.notify(id, MutationKind::Attributes { name });
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() {
            return;
        }
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if el.classes.iter().any(|c| c == class) {
            return;
        }
        el.classes.push(class.to_string());
        self.notify(
            id,
            MutationKind::Attributes {
                name: "class".to_string(),
            },
        );
    }

    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if el.style.get(&property).is_some_and(|v| v == value) {
            return;
        }
        el.style.insert(property, value.to_string());
        self.notify(
            id,
            MutationKind::Attributes {
                name: "style".to_string(),
            },
        );
    }

    // ---------------------------------------------------------------
    // Read access
    // ---------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Host element of a shadow scope node.
    pub fn shadow_host(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::ShadowRoot { host, .. } => Some(host),
            _ => None,
        }
    }

    /// Probe an element for an attached shadow root.
    pub fn shadow_probe(&self, id: NodeId) -> ShadowProbe {
        match self.element(id).and_then(|el| el.shadow) {
            Some(ShadowAttachment {
                mode: ShadowRootMode::Open,
                root,
            }) => ShadowProbe::Open(root),
            Some(ShadowAttachment {
                mode: ShadowRootMode::Closed,
                ..
            }) => ShadowProbe::Closed,
            None => ShadowProbe::None,
        }
    }

    /// Attribute lookup; `class` and `style` are synthesized from the
    /// structured views.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let el = self.element(id)?;
        match name {
            "class" => {
                if el.classes.is_empty() {
                    None
                } else {
                    Some(el.classes.join(" "))
                }
            }
            "style" => {
                if el.style.is_empty() {
                    None
                } else {
                    Some(crate::style::render_inline_declarations(&el.style))
                }
            }
            _ => el.attributes.get(&name.to_ascii_lowercase()).cloned(),
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id)
            .and_then(|el| el.style.get(property).map(String::as_str))
    }

    /// Raw content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Concatenated descendant text, light tree only. Shadow subtrees do
    /// not contribute, matching what an ordinary content read would see.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.node(current).kind {
                NodeKind::Text(text) => out.push_str(text),
                _ => {
                    for &child in self.node(current).children.iter().rev() {
                        stack.push(child);
                    }
                }
            }
        }
        out
    }

    /// Parent chain, nearest first. Stops at a scope boundary: a shadow
    /// root has no parent, so the walk never escapes into the host tree.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).parent,
        }
    }

    /// All descendants of `root` in document order, excluding `root`
    /// itself and excluding shadow subtrees.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.node(current).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Every text node at or under `root`, in document order.
    pub fn text_nodes_under(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.is_text(root) {
            out.push(root);
        }
        out.extend(self.descendants(root).into_iter().filter(|&n| self.is_text(n)));
        out
    }

    // ---------------------------------------------------------------
    // Observer routing
    // ---------------------------------------------------------------

    fn in_observed_scope(&self, scope_root: NodeId, target: NodeId, subtree: bool) -> bool {
        if target == scope_root {
            return true;
        }
        subtree && self.ancestors(target).any(|a| a == scope_root)
    }

    fn notify(&mut self, target: NodeId, kind: MutationKind) {
        self.mutations += 1;
        trace!(?target, ?kind, "tree mutation");
        if self.observers.is_empty() {
            return;
        }
        let routed: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, obs)| {
                obs.filter.accepts(&kind)
                    && self.in_observed_scope(obs.root, target, obs.filter.subtree)
            })
            .map(|(idx, _)| idx)
            .collect();
        for idx in routed {
            self.observers[idx]
                .queue
                .push(MutationRecord {
                    target,
                    kind: kind.clone(),
                });
        }
    }
}

/// Iterator over the parent chain of a node, nearest ancestor first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}
