//! Whole-subtree direction pass.

use bidifix_dom::{Document, NodeId};

use crate::policy::Policy;
use crate::tagger::tag;

/// Tag every text node at or under `root`, in document order.
///
/// Linear in the number of text nodes, which is what bounds both the
/// one-time startup pass over the whole document and the many small
/// passes over freshly inserted subtrees. Order is irrelevant to the
/// result: tagging is idempotent and order-independent.
pub fn scan(doc: &mut Document, root: NodeId, policy: &Policy) {
    for text in doc.text_nodes_under(root) {
        tag(doc, text, policy);
    }
}

#[cfg(test)]
mod tests {
    use bidifix_config::BidifixConfig;

    use super::*;

    #[test]
    fn tags_only_rtl_bearing_branches() {
        let mut doc = Document::new();
        let root = doc.root();
        let policy = Policy::from_config(&BidifixConfig::default()).unwrap();

        let left = doc.create_element("p");
        let ltr = doc.create_text("left to right");
        doc.append_child(doc.root(), left).unwrap();
        doc.append_child(left, ltr).unwrap();

        let right = doc.create_element("p");
        let rtl = doc.create_text("ימין לשמאל");
        doc.append_child(doc.root(), right).unwrap();
        doc.append_child(right, rtl).unwrap();

        scan(&mut doc, root, &policy);
        assert!(!doc.has_class(left, &policy.rtl_class));
        assert!(doc.has_class(right, &policy.rtl_class));
    }

    #[test]
    fn rescanning_is_idempotent() {
        let mut doc = Document::new();
        let root = doc.root();
        let policy = Policy::from_config(&BidifixConfig::default()).unwrap();
        let para = doc.create_element("p");
        let text = doc.create_text("متن فارسی");
        doc.append_child(doc.root(), para).unwrap();
        doc.append_child(para, text).unwrap();

        scan(&mut doc, root, &policy);
        let settled = doc.mutation_count();
        scan(&mut doc, root, &policy);
        scan(&mut doc, root, &policy);
        assert_eq!(doc.mutation_count(), settled);
    }
}
