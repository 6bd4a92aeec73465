//! The editing-API seam the pipeline drives.

use sandmirror_core::{BoundingBox, ElementSet, IdMap};

use crate::error::ApiError;
use crate::wire::ChangeBatch;

/// A production-style map editing API.
///
/// The pipeline only ever issues these five calls. The HTTP implementation
/// lives in [`crate::HttpMapApi`]; tests drive the pipeline through the stub
/// in [`crate::test_support`].
pub trait MapApi {
    /// The server's advertised per-changeset element limit, if it
    /// advertises one.
    fn max_changeset_elements(&self) -> Result<Option<u64>, ApiError>;

    /// Every element inside the box.
    ///
    /// Fails with [`ApiError::AreaTooLarge`] when the server refuses the
    /// box outright and with [`ApiError::RateLimited`] when the client has
    /// been blocked.
    fn map_in_bbox(&self, bbox: &BoundingBox) -> Result<ElementSet, ApiError>;

    /// Open a changeset with the given comment, returning its id.
    fn create_changeset(&self, comment: &str) -> Result<i64, ApiError>;

    /// Upload one homogeneous batch into an open changeset.
    ///
    /// For creations the returned map carries the server-assigned id for
    /// every submitted placeholder; for deletions it is empty.
    fn upload_changes(&self, changeset: i64, batch: &ChangeBatch<'_>) -> Result<IdMap, ApiError>;

    /// Close a changeset.
    fn close_changeset(&self, changeset: i64) -> Result<(), ApiError>;
}
