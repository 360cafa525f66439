//! The reactive direction-correction engine.
//!
//! Owns the mutation subscription and the retry scheduler, with an
//! explicit lifecycle: construct against a configuration, `start` over a
//! document, then let the host drive it (`pump` after mutations are
//! delivered, `advance` as wall-clock time passes) and `stop` to tear
//! down. An engine instance is tied to one document at a time; tests can
//! run isolated instances against private trees.

use bidifix_config::BidifixConfig;
use bidifix_dom::{Document, MutationFilter, MutationKind, ObserverId, ShadowProbe};
use tracing::{debug, warn};

use crate::math::fix_math;
use crate::policy::{Policy, PolicyError};
use crate::scanner::scan;
use crate::scheduler::RetryScheduler;
use crate::tagger::tag;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is already started")]
    AlreadyStarted,
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Dispatches document mutations to the scanner, tagger, and math
/// compensator.
#[derive(Debug)]
pub struct DirectionEngine {
    policy: Policy,
    scheduler: RetryScheduler,
    observer: Option<ObserverId>,
}

impl DirectionEngine {
    pub fn new(config: &BidifixConfig) -> Result<Self, EngineError> {
        Ok(Self {
            policy: Policy::from_config(config)?,
            scheduler: RetryScheduler::new(),
            observer: None,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn is_running(&self) -> bool {
        self.observer.is_some()
    }

    /// Armed retry chains awaiting their next attempt.
    pub fn pending_retries(&self) -> usize {
        self.scheduler.pending()
    }

    /// Subscribe over the document root, run the initial full-document
    /// direction pass, and start the document-wide math retry chain.
    pub fn start(&mut self, doc: &mut Document) -> Result<(), EngineError> {
        if self.observer.is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        let root = doc.root();
        self.observer = Some(doc.observe(root, MutationFilter::content()));

        let Self {
            policy, scheduler, ..
        } = self;
        let policy: &Policy = policy;
        scan(doc, root, policy);
        scheduler.schedule(
            root,
            policy.retry.initial_attempts,
            policy.retry.initial_delay_ms,
            &mut |r| fix_math(doc, r, policy),
        );
        debug!("direction engine started");
        Ok(())
    }

    /// Drain and dispatch the pending mutation records, in delivery
    /// order. Returns how many records were processed.
    ///
    /// Ordering is immaterial to the outcome: every write downstream is
    /// idempotent, so duplicate or overlapping records cost time, never
    /// correctness.
    pub fn pump(&mut self, doc: &mut Document) -> usize {
        let Some(observer) = self.observer else {
            warn!("pump called on a stopped engine");
            return 0;
        };
        let records = doc.take_records(observer);
        let processed = records.len();

        let Self {
            policy, scheduler, ..
        } = self;
        let policy: &Policy = policy;
        let retry = policy.retry;

        for record in records {
            let target = record.target;
            match record.kind {
                MutationKind::ChildList { added, removed } => {
                    for node in removed {
                        scheduler.cancel_root(node);
                    }
                    for node in added {
                        tag(doc, node, policy);
                        if !doc.is_element(node) {
                            continue;
                        }
                        // Covers text inserted atomically with the element.
                        scan(doc, node, policy);
                        scheduler.schedule(node, retry.insert_attempts, retry.delay_ms, &mut |r| {
                            fix_math(doc, r, policy)
                        });
                        // A host arriving with its shadow root already
                        // attached needs its own chain: the host-rooted
                        // search reaches it, but content may only render
                        // into the shadow scope later.
                        if let ShadowProbe::Open(shadow) = doc.shadow_probe(node) {
                            scheduler.schedule(
                                shadow,
                                retry.insert_attempts,
                                retry.delay_ms,
                                &mut |r| fix_math(doc, r, policy),
                            );
                        }
                    }
                }
                MutationKind::CharacterData => {
                    tag(doc, target, policy);
                    // Math streamed in character by character renders under
                    // the text node's parent.
                    if let Some(parent) = doc.parent(target)
                        && doc.is_element(parent)
                    {
                        scheduler.schedule(parent, retry.text_attempts, retry.delay_ms, &mut |r| {
                            fix_math(doc, r, policy)
                        });
                    }
                }
                MutationKind::Attributes { .. } => {}
            }
        }
        processed
    }

    /// Advance the retry clock and run attempts that became due.
    pub fn advance(&mut self, doc: &mut Document, elapsed_ms: u64) {
        let Self {
            policy, scheduler, ..
        } = self;
        let policy: &Policy = policy;
        scheduler.advance(elapsed_ms, &mut |r| fix_math(doc, r, policy));
    }

    /// Disconnect from the document and drop all pending retry chains.
    /// Stopping an already-stopped engine is a no-op.
    pub fn stop(&mut self, doc: &mut Document) {
        if let Some(observer) = self.observer.take() {
            doc.disconnect(observer);
            debug!("direction engine stopped");
        }
        self.scheduler.clear();
    }
}
