//! The top-level copy pipeline.
//!
//! Clears the target area on the sandbox, downloads a fresh snapshot from
//! the donor source and uploads it in capability-sized batches, renumbering
//! identifiers across the placeholder and server id spaces as it goes.
//! Everything runs strictly sequentially: later create batches depend on the
//! id mappings returned by earlier ones, and no batch is retried once sent.

use log::info;
use thiserror::Error;

use sandmirror_core::{
    BoundingBox, BoundingBoxError, ElementSet, FilterConfig, assign_placeholders,
};

use crate::changeset::Changeset;
use crate::error::ApiError;
use crate::fetch::{changeset_capacity, fetch_with_split};
use crate::map_api::MapApi;
use crate::overpass::{SnapshotQuery, SnapshotSource};
use crate::wire::ChangeBatch;

/// Existing-element count above which clearing requires confirmation.
pub const DELETE_CONFIRM_THRESHOLD: usize = 10_000;

const DELETE_COMMENT: &str = "Clearing an area before uploading";
const CREATE_COMMENT: &str = "Copying data from OSM";

/// Errors that abort a copy run.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The bounding box failed validation before any network call.
    #[error(transparent)]
    Bbox(#[from] BoundingBoxError),
    /// A fetch, delete or create call failed; the run stops where it was.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Configuration of one copy run.
#[derive(Debug, Default, Clone)]
pub struct MirrorOptions {
    /// Post-download filter stages; all off by default.
    pub filters: FilterConfig,
    /// Donor snapshot refinements.
    pub query: SnapshotQuery,
}

/// How a copy run ended. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Data was copied.
    Completed { deleted: usize, created: usize },
    /// The operator declined to clear the existing elements; nothing was
    /// touched.
    Declined { existing: usize },
    /// The donor returned nothing for the box.
    SourceEmpty { deleted: usize },
}

/// Run the full copy pipeline.
///
/// `sandbox` is the editing API being written to; `donor` is the
/// production-style API whose capability limit sizes the create batches;
/// `source` supplies the snapshot being copied. `confirm` is consulted once
/// when the sandbox already holds more than [`DELETE_CONFIRM_THRESHOLD`]
/// elements in the box.
pub fn run<S, D, X, F>(
    sandbox: &S,
    donor: &D,
    source: &X,
    bbox: &BoundingBox,
    options: &MirrorOptions,
    confirm: F,
) -> Result<MirrorOutcome, MirrorError>
where
    S: MapApi,
    D: MapApi,
    X: SnapshotSource,
    F: FnOnce(usize) -> bool,
{
    bbox.ensure_copyable()?;

    let existing = fetch_with_split(sandbox, bbox)?;
    if existing.len() > DELETE_CONFIRM_THRESHOLD && !confirm(existing.len()) {
        return Ok(MirrorOutcome::Declined {
            existing: existing.len(),
        });
    }

    let deleted = if existing.is_empty() {
        info!("Sandbox is empty there.");
        0
    } else {
        info!("Clearing the area on the sandbox server.");
        delete_elements(sandbox, existing)?
    };

    let mut elements = source.snapshot(bbox, &options.query)?;
    options.filters.apply(&mut elements, bbox);
    if elements.is_empty() {
        info!("No elements in the given bounding box.");
        return Ok(MirrorOutcome::SourceEmpty { deleted });
    }
    info!("Downloaded {} elements.", elements.len());

    info!("Uploading new data.");
    let created = create_elements(sandbox, donor, elements)?;
    Ok(MirrorOutcome::Completed { deleted, created })
}

/// Delete everything in the set, referencing elements first.
fn delete_elements<S: MapApi>(api: &S, existing: ElementSet) -> Result<usize, MirrorError> {
    let capacity = changeset_capacity(api)?;
    let values = existing.into_delete_order();
    for chunk in values.chunks(capacity) {
        let changeset = Changeset::open(api, DELETE_COMMENT)?;
        changeset.upload(&ChangeBatch::Delete(chunk))?;
    }
    Ok(values.len())
}

/// Create the whole set in capability-sized batches.
fn create_elements<S: MapApi, D: MapApi>(
    sandbox: &S,
    donor: &D,
    elements: ElementSet,
) -> Result<usize, MirrorError> {
    let capacity = changeset_capacity(donor)?;
    let mut values = elements.into_create_order();
    assign_placeholders(&mut values);
    let total = values.len();
    let mut start = 0;
    while start < total {
        let end = usize::min(start + capacity, total);
        let id_map = {
            let changeset = Changeset::open(sandbox, CREATE_COMMENT)?;
            changeset.upload(&ChangeBatch::Create(&values[start..end]))?
        };
        // Later batches may reference elements created in this one, so the
        // rewrite covers the whole working set, not just the batch.
        id_map.apply(&mut values);
        start = end;
    }
    Ok(total)
}
