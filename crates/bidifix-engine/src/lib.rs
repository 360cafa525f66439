//! Reactive text-direction correction over a live document tree.
//!
//! Chat-style interfaces render mixed-direction content: an otherwise LTR
//! page streams in answers containing Hebrew, Arabic or Persian script,
//! while code blocks and math typesetting inside those answers must stay
//! LTR. This crate watches the document for mutations and keeps the
//! presentation markers straight:
//!
//! - [`script::contains_rtl`]: pure RTL-range classification;
//! - [`tagger::tag`]: idempotent, monotonic RTL marking of a node and
//!   its nearest content wrapper;
//! - [`scanner::scan`]: the same, for every text node under a root;
//! - [`finder::find_all`]: selector search that pierces open shadow
//!   roots and tolerates closed ones;
//! - [`math::fix_math`]: forces math regions (and their enclosing code
//!   blocks) back to LTR;
//! - [`scheduler::RetryScheduler`]: bounded, cancellable retry chains
//!   over a virtual clock, absorbing the race against asynchronous math
//!   rendering;
//! - [`engine::DirectionEngine`]: the mutation dispatcher tying it all
//!   together, with an explicit start/pump/advance/stop lifecycle.
//!
//! The engine only ever annotates nodes (classes, `dir`, inline style);
//! it never creates, moves, or removes them, and every annotation is
//! idempotent, so repeated or overlapping passes are safe by
//! construction.

pub mod engine;
pub mod finder;
pub mod math;
pub mod policy;
pub mod scanner;
pub mod scheduler;
pub mod script;
pub mod tagger;

pub use engine::{DirectionEngine, EngineError};
pub use finder::{SearchOutcome, SearchReport, closest, find_all};
pub use math::fix_math;
pub use policy::{Policy, PolicyError, RetryPolicy};
pub use scanner::scan;
pub use scheduler::{RetryScheduler, RetryTask};
pub use script::contains_rtl;
pub use tagger::tag;
