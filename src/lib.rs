//! Facade crate for the sandmirror tooling.
//!
//! This crate re-exports the domain types from `sandmirror-core` and the
//! pipeline entry points from `sandmirror-api`, so downstream code can depend
//! on a single crate.

#![forbid(unsafe_code)]

pub use sandmirror_core::{
    BoundingBox, BoundingBoxError, Element, ElementKey, ElementKind, ElementSet, FilterConfig,
    IdMap, MAX_COPY_AREA_SQ_DEG, Member,
};

pub use sandmirror_api::{
    ApiError, ChangeBatch, Changeset, HttpMapApi, MapApi, MirrorError, MirrorOptions,
    MirrorOutcome, OverpassSource, SnapshotQuery, SnapshotSource, mirror,
};
