//! Changeset-scoped uploads.

use log::{debug, warn};

use sandmirror_core::IdMap;

use crate::error::ApiError;
use crate::map_api::MapApi;
use crate::wire::ChangeBatch;

/// A changeset held open for the lifetime of the value.
///
/// Opening fails the whole operation; uploads run inside the held
/// changeset; the changeset is closed when the value drops, whether the
/// scope unwinds from an error or not. A close failure is only logged:
/// by then any contained upload has already been durably committed.
#[derive(Debug)]
pub struct Changeset<'a, S: MapApi> {
    api: &'a S,
    id: i64,
}

impl<'a, S: MapApi> Changeset<'a, S> {
    /// Open a changeset with the given comment.
    pub fn open(api: &'a S, comment: &str) -> Result<Self, ApiError> {
        let id = api.create_changeset(comment)?;
        debug!("Opened changeset {id}.");
        Ok(Self { api, id })
    }

    /// The server-assigned changeset id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Submit one homogeneous batch, returning the server's id mapping.
    pub fn upload(&self, batch: &ChangeBatch<'_>) -> Result<IdMap, ApiError> {
        debug!(
            "Uploading {} batch of {} elements to changeset {}.",
            batch.operation(),
            batch.len(),
            self.id
        );
        self.api.upload_changes(self.id, batch)
    }
}

impl<S: MapApi> Drop for Changeset<'_, S> {
    fn drop(&mut self) {
        if let Err(err) = self.api.close_changeset(self.id) {
            warn!("Failed to close changeset {}: {err}", self.id);
        }
    }
}
