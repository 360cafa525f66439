//! LTR forcing for math-typesetting regions.
//!
//! Math output must stay LTR even inside a region flipped to RTL, and it
//! renders asynchronously: the typesetting library fills its container
//! some time after the insertion mutation. A single attempt therefore
//! reports whether it found anything, and the scheduler re-runs it on a
//! bounded retry chain.

use std::collections::HashSet;

use bidifix_dom::{Document, NodeId};
use tracing::{debug, trace};

use crate::finder::{closest, find_all};
use crate::policy::Policy;

/// One fix-up attempt under `root`.
///
/// Returns `false` when no math region exists yet ("retry later"), `true`
/// once at least one region was found and forced LTR. Re-running over
/// already-fixed regions is harmless: every write is idempotent.
pub fn fix_math(doc: &mut Document, root: NodeId, policy: &Policy) -> bool {
    // Union of the plain light-tree query and the shadow-piercing search.
    let direct = policy.math.query_all(doc, root);
    let report = find_all(doc, root, &policy.math);
    let mut seen = HashSet::new();
    let regions: Vec<NodeId> = direct
        .into_iter()
        .chain(report.matches)
        .filter(|&n| seen.insert(n))
        .collect();

    if regions.is_empty() {
        trace!(
            ?root,
            closed_skipped = report.closed_skipped,
            "no math regions yet"
        );
        return false;
    }

    let count = regions.len();
    for region in regions {
        force_ltr(doc, region);
        doc.add_class(region, &policy.math_class);
        // Math nested in a code container must not leave the container
        // flipped either.
        if let Some(code) = closest(doc, region, &policy.code) {
            force_ltr(doc, code);
        }
    }
    debug!(?root, count, "forced math regions LTR");
    true
}

/// Explicit direction attribute plus inline style, overriding any
/// inherited RTL from a marked ancestor wrapper.
fn force_ltr(doc: &mut Document, element: NodeId) {
    doc.set_attribute(element, "dir", "ltr");
    doc.set_style_property(element, "direction", "ltr");
    doc.set_style_property(element, "text-align", "left");
}
