//! Umbrella crate: re-exports the bidifix workspace surface so hosts can
//! depend on a single crate.

pub use bidifix_config as config;
pub use bidifix_dom as dom;
pub use bidifix_engine as engine;

pub use bidifix_config::BidifixConfig;
pub use bidifix_dom::{Document, MutationFilter, NodeId};
pub use bidifix_engine::{DirectionEngine, EngineError};
