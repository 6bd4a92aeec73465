//! Test doubles for the network seams.
//!
//! [`StubMapApi`] and [`StubSnapshotSource`] record every call so
//! behavioural tests can assert on batch sizes, ordering and changeset
//! lifecycles without a server.

use std::cell::{Cell, RefCell};

use sandmirror_core::{BoundingBox, Element, ElementSet, IdMap};

use crate::error::ApiError;
use crate::map_api::MapApi;
use crate::overpass::{SnapshotQuery, SnapshotSource};
use crate::wire::ChangeBatch;

type MapFn = Box<dyn Fn(&BoundingBox) -> Result<ElementSet, ApiError>>;

/// One recorded upload call, with the batch snapshotted as submitted.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub changeset: i64,
    pub operation: &'static str,
    pub elements: Vec<Element>,
}

/// Scripted in-memory [`MapApi`].
pub struct StubMapApi {
    max_elements: Option<u64>,
    map_fn: MapFn,
    fail_upload: bool,
    fail_close: bool,
    /// Every box passed to `map_in_bbox`, in call order.
    pub map_calls: RefCell<Vec<BoundingBox>>,
    /// Every changeset comment passed to `create_changeset`, in call order.
    pub opened: RefCell<Vec<String>>,
    /// Every changeset id passed to `close_changeset`, in call order.
    pub closed: RefCell<Vec<i64>>,
    /// Every upload, in call order.
    pub uploads: RefCell<Vec<UploadRecord>>,
    next_changeset: Cell<i64>,
    next_real_id: Cell<i64>,
}

impl Default for StubMapApi {
    fn default() -> Self {
        Self::new()
    }
}

impl StubMapApi {
    /// A stub with an empty map and no advertised capability limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_elements: None,
            map_fn: Box::new(|_| Ok(ElementSet::new())),
            fail_upload: false,
            fail_close: false,
            map_calls: RefCell::new(Vec::new()),
            opened: RefCell::new(Vec::new()),
            closed: RefCell::new(Vec::new()),
            uploads: RefCell::new(Vec::new()),
            next_changeset: Cell::new(100),
            next_real_id: Cell::new(5000),
        }
    }

    /// Advertise a capability limit.
    #[must_use]
    pub fn with_max_elements(mut self, limit: u64) -> Self {
        self.max_elements = Some(limit);
        self
    }

    /// Script the map download.
    #[must_use]
    pub fn with_map(
        mut self,
        map_fn: impl Fn(&BoundingBox) -> Result<ElementSet, ApiError> + 'static,
    ) -> Self {
        self.map_fn = Box::new(map_fn);
        self
    }

    /// Make every upload fail with a server error.
    #[must_use]
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Make every changeset close fail with a server error.
    #[must_use]
    pub fn with_failing_closes(mut self) -> Self {
        self.fail_close = true;
        self
    }

    fn server_error(what: &str) -> ApiError {
        ApiError::Http {
            url: format!("stub:{what}"),
            status: 500,
            body: "stubbed failure".to_owned(),
        }
    }
}

impl MapApi for StubMapApi {
    fn max_changeset_elements(&self) -> Result<Option<u64>, ApiError> {
        Ok(self.max_elements)
    }

    fn map_in_bbox(&self, bbox: &BoundingBox) -> Result<ElementSet, ApiError> {
        self.map_calls.borrow_mut().push(*bbox);
        (self.map_fn)(bbox)
    }

    fn create_changeset(&self, comment: &str) -> Result<i64, ApiError> {
        let id = self.next_changeset.get();
        self.next_changeset.set(id + 1);
        self.opened.borrow_mut().push(comment.to_owned());
        Ok(id)
    }

    fn upload_changes(&self, changeset: i64, batch: &ChangeBatch<'_>) -> Result<IdMap, ApiError> {
        if self.fail_upload {
            return Err(Self::server_error("upload"));
        }
        self.uploads.borrow_mut().push(UploadRecord {
            changeset,
            operation: batch.operation(),
            elements: batch.elements().to_vec(),
        });
        match batch {
            ChangeBatch::Create(elements) => {
                let mut map = IdMap::new();
                for element in *elements {
                    let real_id = self.next_real_id.get();
                    self.next_real_id.set(real_id + 1);
                    map.insert(element.key(), real_id);
                }
                Ok(map)
            }
            ChangeBatch::Delete(_) => Ok(IdMap::new()),
        }
    }

    fn close_changeset(&self, changeset: i64) -> Result<(), ApiError> {
        if self.fail_close {
            return Err(Self::server_error("close"));
        }
        self.closed.borrow_mut().push(changeset);
        Ok(())
    }
}

/// Scripted in-memory [`SnapshotSource`].
pub struct StubSnapshotSource {
    elements: ElementSet,
    /// Every query issued, in call order.
    pub queries: RefCell<Vec<(BoundingBox, SnapshotQuery)>>,
}

impl StubSnapshotSource {
    #[must_use]
    pub fn with_elements(elements: ElementSet) -> Self {
        Self {
            elements,
            queries: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::with_elements(ElementSet::new())
    }
}

impl SnapshotSource for StubSnapshotSource {
    fn snapshot(
        &self,
        bbox: &BoundingBox,
        query: &SnapshotQuery,
    ) -> Result<ElementSet, ApiError> {
        self.queries.borrow_mut().push((*bbox, query.clone()));
        Ok(self.elements.clone())
    }
}
