//! Domain model for copying OpenStreetMap data into a sandbox server.
//!
//! This crate holds the pure, network-free parts of the pipeline: the
//! element model, the keyed element collection, bounding-box handling and
//! partitioning, the optional graph filters, and the identifier renumbering
//! table used by the batched upload protocol.

#![forbid(unsafe_code)]

mod bbox;
mod collection;
mod element;
mod filters;
mod renumber;

pub use bbox::{BoundingBox, BoundingBoxError, MAX_COPY_AREA_SQ_DEG};
pub use collection::ElementSet;
pub use element::{Element, ElementKey, ElementKind, Member};
pub use filters::{FilterConfig, drop_dangling_references, drop_untagged_orphan_nodes, restrict_to_bbox};
pub use renumber::{IdMap, assign_placeholders};
