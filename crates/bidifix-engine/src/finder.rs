//! Shadow-piercing structural queries.
//!
//! An ordinary selector query only sees the light tree; content rendered
//! inside shadow roots has to be discovered by walking every descendant
//! element and probing it for an attached root. A privacy-restricted
//! subtree is an expected condition, not an error, so closed roots are
//! skipped rather than failing the call. The skip is counted so callers
//! (and tests) can tell "nothing there" from "couldn't look".

use std::collections::HashSet;

use bidifix_dom::{Document, NodeId, Selector, ShadowProbe};
use tracing::trace;

/// Result of a shadow-piercing search.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Matching elements, deduplicated, host-tree scopes first.
    pub matches: Vec<NodeId>,
    /// Closed shadow roots encountered and skipped.
    pub closed_skipped: usize,
}

/// Tri-state summary of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one match was found.
    Found,
    /// Every reachable scope was searched and came up empty.
    Empty,
    /// Nothing found, but inaccessible subtrees were skipped, so absence
    /// is not conclusive.
    EmptyBehindClosed,
}

impl SearchReport {
    pub fn outcome(&self) -> SearchOutcome {
        if !self.matches.is_empty() {
            SearchOutcome::Found
        } else if self.closed_skipped > 0 {
            SearchOutcome::EmptyBehindClosed
        } else {
            SearchOutcome::Empty
        }
    }
}

/// Collect every element under `root` matching `selector`, descending
/// into open shadow roots attached anywhere below (or at) `root`.
///
/// Purely structural: no memory across calls, safe to repeat.
pub fn find_all(doc: &Document, root: NodeId, selector: &Selector) -> SearchReport {
    let mut report = SearchReport::default();
    let mut seen = HashSet::new();
    let mut visited_scopes = HashSet::new();
    let mut scopes = vec![root];

    while let Some(scope) = scopes.pop() {
        if !visited_scopes.insert(scope) {
            continue;
        }
        for found in selector.query_all(doc, scope) {
            if seen.insert(found) {
                report.matches.push(found);
            }
        }

        let mut probe_targets: Vec<NodeId> = Vec::new();
        if doc.is_element(scope) {
            probe_targets.push(scope);
        }
        probe_targets.extend(
            doc.descendants(scope)
                .into_iter()
                .filter(|&n| doc.is_element(n)),
        );
        for element in probe_targets {
            match doc.shadow_probe(element) {
                ShadowProbe::Open(shadow) => scopes.push(shadow),
                ShadowProbe::Closed => {
                    report.closed_skipped += 1;
                    trace!(?element, "skipping closed shadow root");
                }
                ShadowProbe::None => {}
            }
        }
    }
    report
}

/// Nearest of `from` and its ancestors matching `selector`, staying
/// within the current tree scope.
pub fn closest(doc: &Document, from: NodeId, selector: &Selector) -> Option<NodeId> {
    std::iter::once(from)
        .chain(doc.ancestors(from))
        .find(|&n| selector.matches(doc, n))
}

#[cfg(test)]
mod tests {
    use bidifix_dom::ShadowRootMode;

    use super::*;

    fn math_doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let light = doc.create_element("span");
        doc.add_class(light, "katex-html");
        doc.append_child(doc.root(), light).unwrap();

        let host = doc.create_element("div");
        doc.append_child(doc.root(), host).unwrap();
        let shadow = doc.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let hidden = doc.create_element("span");
        doc.add_class(hidden, "katex-html");
        doc.append_child(shadow, hidden).unwrap();
        (doc, light, hidden)
    }

    #[test]
    fn pierces_open_shadow_roots() {
        let (doc, light, hidden) = math_doc();
        let selector = Selector::parse(".katex-html").unwrap();
        let report = find_all(&doc, doc.root(), &selector);
        assert_eq!(report.matches, vec![light, hidden]);
        assert_eq!(report.outcome(), SearchOutcome::Found);
    }

    #[test]
    fn nested_shadow_roots_are_reached() {
        let (mut doc, _, hidden) = math_doc();
        // Second level: shadow root inside the first shadow scope.
        let inner_host = doc.create_element("div");
        let first_scope = doc.parent(hidden).unwrap();
        doc.append_child(first_scope, inner_host).unwrap();
        let inner_shadow = doc.attach_shadow(inner_host, ShadowRootMode::Open).unwrap();
        let deep = doc.create_element("span");
        doc.add_class(deep, "katex-html");
        doc.append_child(inner_shadow, deep).unwrap();

        let selector = Selector::parse(".katex-html").unwrap();
        let report = find_all(&doc, doc.root(), &selector);
        assert!(report.matches.contains(&deep));
        // Deduplicated even though scopes are visited along several paths.
        let unique: std::collections::HashSet<_> = report.matches.iter().collect();
        assert_eq!(unique.len(), report.matches.len());
    }

    #[test]
    fn closed_roots_are_counted_not_fatal() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(doc.root(), host).unwrap();
        let shadow = doc.attach_shadow(host, ShadowRootMode::Closed).unwrap();
        let hidden = doc.create_element("span");
        doc.add_class(hidden, "katex-html");
        doc.append_child(shadow, hidden).unwrap();

        let selector = Selector::parse(".katex-html").unwrap();
        let report = find_all(&doc, doc.root(), &selector);
        assert!(report.matches.is_empty());
        assert_eq!(report.closed_skipped, 1);
        assert_eq!(report.outcome(), SearchOutcome::EmptyBehindClosed);
    }

    #[test]
    fn closest_includes_self_and_stops_at_scope() {
        let mut doc = Document::new();
        let pre = doc.create_element("pre");
        doc.append_child(doc.root(), pre).unwrap();
        let code = doc.create_element("code");
        doc.append_child(pre, code).unwrap();

        let selector = Selector::parse("pre, code").unwrap();
        assert_eq!(closest(&doc, code, &selector), Some(code));
        let outer = Selector::parse("pre").unwrap();
        assert_eq!(closest(&doc, code, &outer), Some(pre));
        let missing = Selector::parse(".markdown").unwrap();
        assert_eq!(closest(&doc, code, &missing), None);
    }
}
