//! Direction tagging for a single node.

use bidifix_dom::{Document, NodeId, NodeKind};
use tracing::trace;

use crate::finder::closest;
use crate::policy::Policy;
use crate::script::contains_rtl;

/// Classify the node's text and mark it (and its nearest content wrapper)
/// for RTL layout when RTL script is present.
///
/// Monotonic and idempotent: markers are never removed, re-tagging a
/// marked region is a no-op, and a marked ancestor short-circuits the
/// whole call before any text is read. Never fails; nodes that cannot
/// carry markers are simply skipped.
pub fn tag(doc: &mut Document, node: NodeId, policy: &Policy) {
    let subject = match doc.kind(node) {
        NodeKind::Text(_) => match doc.parent(node) {
            Some(parent) if doc.is_element(parent) => parent,
            _ => return,
        },
        NodeKind::Element(_) => node,
        NodeKind::ShadowRoot { .. } => return,
    };

    // Anything already inside a marked region is settled.
    if std::iter::once(subject)
        .chain(doc.ancestors(subject))
        .any(|n| doc.has_class(n, &policy.rtl_class))
    {
        return;
    }

    let text = doc.text_content(subject);
    if !contains_rtl(&text) {
        return;
    }

    doc.add_class(subject, &policy.rtl_class);
    if let Some(wrapper) = closest(doc, subject, &policy.wrapper)
        && !doc.has_class(wrapper, &policy.rtl_class)
    {
        doc.add_class(wrapper, &policy.rtl_class);
    }
    trace!(?subject, "applied RTL marker");
}

#[cfg(test)]
mod tests {
    use bidifix_config::BidifixConfig;

    use super::*;

    fn policy() -> Policy {
        Policy::from_config(&BidifixConfig::default()).unwrap()
    }

    /// body > [data-message-role] > .markdown > p > text
    fn message_doc(text: &str) -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let message = doc.create_element("div");
        doc.set_attribute(message, "data-message-role", "assistant");
        doc.append_child(doc.root(), message).unwrap();
        let markdown = doc.create_element("div");
        doc.add_class(markdown, "markdown");
        doc.append_child(message, markdown).unwrap();
        let para = doc.create_element("p");
        doc.append_child(markdown, para).unwrap();
        let content = doc.create_text(text);
        doc.append_child(para, content).unwrap();
        (doc, message, markdown, para, content)
    }

    #[test]
    fn marks_subject_and_nearest_wrapper() {
        let (mut doc, message, markdown, para, content) = message_doc("שלום עולם");
        let policy = policy();
        tag(&mut doc, content, &policy);

        assert!(doc.has_class(para, &policy.rtl_class));
        assert!(doc.has_class(markdown, &policy.rtl_class));
        // Only the nearest wrapper is marked directly.
        assert!(!doc.has_class(message, &policy.rtl_class));
    }

    #[test]
    fn ltr_text_leaves_everything_untouched() {
        let (mut doc, _, markdown, para, content) = message_doc("plain english");
        let policy = policy();
        let before = doc.mutation_count();
        tag(&mut doc, content, &policy);
        assert_eq!(doc.mutation_count(), before);
        assert!(!doc.has_class(para, &policy.rtl_class));
        assert!(!doc.has_class(markdown, &policy.rtl_class));
    }

    #[test]
    fn second_tag_is_a_no_op() {
        let (mut doc, _, _, _, content) = message_doc("مرحبا");
        let policy = policy();
        tag(&mut doc, content, &policy);
        let settled = doc.mutation_count();
        tag(&mut doc, content, &policy);
        assert_eq!(doc.mutation_count(), settled);
    }

    #[test]
    fn marked_ancestor_short_circuits_descendants() {
        let (mut doc, _, markdown, para, _) = message_doc("שלום");
        let policy = policy();
        doc.add_class(markdown, &policy.rtl_class);

        let before = doc.mutation_count();
        // New RTL text under the already-marked region.
        let extra = doc.create_text("עוד טקסט");
        doc.append_child(para, extra).unwrap();
        let after_insert = doc.mutation_count();
        tag(&mut doc, extra, &policy);

        assert_eq!(doc.mutation_count(), after_insert);
        assert!(doc.mutation_count() > before);
        assert!(!doc.has_class(para, &policy.rtl_class));
    }

    #[test]
    fn unrelated_siblings_stay_unmarked() {
        let (mut doc, message, _, _, content) = message_doc("مرحبا");
        let policy = policy();
        let sibling = doc.create_element("div");
        doc.add_class(sibling, "markdown");
        doc.append_child(message, sibling).unwrap();

        tag(&mut doc, content, &policy);
        assert!(!doc.has_class(sibling, &policy.rtl_class));
    }

    #[test]
    fn tagging_an_element_uses_descendant_text() {
        let (mut doc, _, markdown, para, _) = message_doc("یک پیام");
        let policy = policy();
        tag(&mut doc, para, &policy);
        assert!(doc.has_class(para, &policy.rtl_class));
        assert!(doc.has_class(markdown, &policy.rtl_class));
    }
}
