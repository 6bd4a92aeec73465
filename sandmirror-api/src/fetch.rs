//! Bounding-box downloads from the editing API.

use log::{info, warn};

use sandmirror_core::{BoundingBox, ElementSet};

use crate::error::ApiError;
use crate::map_api::MapApi;

/// Per-changeset element limit assumed when the server does not advertise
/// one.
pub const DEFAULT_CHANGESET_CAPACITY: usize = 10_000;

/// Download everything in the box, quartering it recursively whenever the
/// server rejects an area as too large.
///
/// Quadrant results merge first-wins: a key collision across quadrant
/// boundaries is the identical element. Rate limiting and every other
/// failure are fatal; the split is the only recovery.
pub fn fetch_with_split<S: MapApi>(api: &S, bbox: &BoundingBox) -> Result<ElementSet, ApiError> {
    match api.map_in_bbox(bbox) {
        Ok(elements) => Ok(elements),
        Err(ApiError::AreaTooLarge) => {
            info!("Area {bbox} is too large for one request; splitting in four.");
            let mut merged = ElementSet::new();
            for quadrant in bbox.quarter() {
                merged.merge(fetch_with_split(api, &quadrant)?);
            }
            Ok(merged)
        }
        Err(err) => Err(err),
    }
}

/// The server's per-changeset element limit, with a logged fallback when
/// the capabilities document does not carry one.
pub fn changeset_capacity<S: MapApi>(api: &S) -> Result<usize, ApiError> {
    match api.max_changeset_elements()? {
        Some(limit) if limit > 0 => Ok(usize::try_from(limit).unwrap_or(usize::MAX)),
        _ => {
            warn!("Failed to get the maximum changeset size; assuming {DEFAULT_CHANGESET_CAPACITY}.");
            Ok(DEFAULT_CHANGESET_CAPACITY)
        }
    }
}
