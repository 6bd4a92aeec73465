//! Network layer and batch pipeline for the sandbox copier.
//!
//! This crate wraps the two external services the pipeline talks to: the
//! production-style editing API (capabilities, map download, changesets) and
//! the Overpass snapshot API. Both sit behind traits so the orchestrator in
//! [`mirror`] can be exercised against test doubles; the HTTP
//! implementations drive `reqwest` from synchronous code through an owned
//! current-thread runtime.

#![forbid(unsafe_code)]

mod changeset;
mod error;
mod fetch;
mod http;
mod map_api;
pub mod mirror;
mod overpass;
#[doc(hidden)]
pub mod test_support;
pub mod wire;

pub use changeset::Changeset;
pub use error::ApiError;
pub use fetch::{DEFAULT_CHANGESET_CAPACITY, changeset_capacity, fetch_with_split};
pub use http::{BuildError, HttpMapApi};
pub use map_api::MapApi;
pub use mirror::{MirrorError, MirrorOptions, MirrorOutcome};
pub use overpass::{OverpassSource, SnapshotQuery, SnapshotSource};
pub use wire::{ChangeBatch, WireError};

/// Generator label attached to changesets, payloads and user agents.
pub const GENERATOR: &str = concat!("sandmirror/", env!("CARGO_PKG_VERSION"));

/// The production OpenStreetMap editing API.
pub const OSM_API_URL: &str = "https://api.openstreetmap.org/api/0.6/";

/// The development sandbox editing API.
pub const SANDBOX_API_URL: &str = "https://master.apis.dev.openstreetmap.org/api/0.6/";

/// The default Overpass API endpoint.
pub const OVERPASS_API_URL: &str = "http://overpass-api.de/api";
