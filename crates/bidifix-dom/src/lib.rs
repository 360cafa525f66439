//! Host-document model for the bidifix direction-correction engine.
//!
//! The real document tree lives in a host rendering pipeline; this crate
//! provides the equivalent structure the engine operates on: a mutable,
//! arena-backed tree of elements and text nodes with attributes, class
//! lists, inline styles, and open/closed shadow roots. Mutations are
//! reported to registered observers as ordered record batches, mirroring
//! the notification facility a host environment would expose.
//!
//! Shadow roots are deliberately invisible to ordinary traversal and
//! selector queries; callers must probe a host element explicitly
//! (`Document::shadow_probe`) and a closed root hides its contents.

pub mod document;
pub mod html;
pub mod observer;
pub mod selector;
pub mod style;

pub use document::{
    Document, DomError, ElementData, NodeId, NodeKind, ShadowProbe, ShadowRootMode,
};
pub use observer::{MutationFilter, MutationKind, MutationRecord, ObserverId};
pub use selector::{Selector, SelectorError};
