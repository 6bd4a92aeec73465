//! The donor snapshot seam: Overpass API queries.

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use tokio::runtime::Runtime;

use sandmirror_core::{BoundingBox, ElementSet};

use crate::GENERATOR;
use crate::error::ApiError;
use crate::http::BuildError;
use crate::wire;

/// Server-side query timeout, in seconds.
const QUERY_TIMEOUT_SECS: u32 = 300;

/// Marker the endpoint embeds in a rejection body when the client is rate
/// limited.
const RATE_LIMIT_MARKER: &str = "rate_limited";

/// Optional refinements of a snapshot download.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    /// Tag-filter clause, e.g. `amenity=bench`, applied to every kind.
    pub filter: Option<String>,
    /// Point-in-time date clause (ISO 8601); the map as it was then.
    pub date: Option<String>,
}

/// A source of map snapshots for a bounding box.
///
/// Unlike the editing API's map download there is no split-and-retry here:
/// an oversized-area rejection fails the whole operation.
pub trait SnapshotSource {
    /// Every element in the box matching the query, with referenced child
    /// elements included transitively.
    fn snapshot(&self, bbox: &BoundingBox, query: &SnapshotQuery)
    -> Result<ElementSet, ApiError>;
}

/// [`SnapshotSource`] backed by an Overpass API endpoint.
pub struct OverpassSource {
    client: Client,
    runtime: Runtime,
    endpoint: String,
}

impl std::fmt::Debug for OverpassSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassSource")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OverpassSource {
    /// Build a source for the given Overpass endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the runtime fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, BuildError> {
        let client = Client::builder()
            .user_agent(GENERATOR)
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(u64::from(QUERY_TIMEOUT_SECS) + 30))
            .build()
            .map_err(BuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            endpoint: endpoint.into(),
        })
    }

    /// Render the Overpass QL query for a box.
    ///
    /// `(_.;>;)` pulls in every referenced child element, so ways and
    /// relations arrive with their geometry complete.
    fn build_query(bbox: &BoundingBox, query: &SnapshotQuery) -> String {
        let date = query
            .date
            .as_ref()
            .map(|d| format!("[date:\"{d}\"]"))
            .unwrap_or_default();
        let filter = query
            .filter
            .as_ref()
            .map(|f| format!("[{f}]"))
            .unwrap_or_default();
        format!(
            "[timeout:{QUERY_TIMEOUT_SECS}]{date}[bbox:{}];(nwr{filter};);(_.;>;);out meta qt;",
            bbox.overpass_param()
        )
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<(u16, String), ApiError> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|source| ApiError::Network {
                    url: url.to_owned(),
                    source,
                })?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|source| ApiError::Network {
                url: url.to_owned(),
                source,
            })?;
            Ok((status, body))
        })
    }

    /// Fetch and log the endpoint's status page, the one diagnostic that
    /// explains a rate limit.
    fn log_status(&self) {
        let url = format!("{}/status", self.endpoint.trim_end_matches('/'));
        match self.get(&url, &[]) {
            Ok((_, body)) => info!("Overpass status:\n{body}"),
            Err(err) => warn!("Could not fetch the Overpass status page: {err}"),
        }
    }
}

impl SnapshotSource for OverpassSource {
    fn snapshot(
        &self,
        bbox: &BoundingBox,
        query: &SnapshotQuery,
    ) -> Result<ElementSet, ApiError> {
        let url = format!("{}/interpreter", self.endpoint.trim_end_matches('/'));
        let data = Self::build_query(bbox, query);
        let (status, body) = self.get(&url, &[("data", data.as_str())])?;
        if !(200..300).contains(&status) {
            if body.contains(RATE_LIMIT_MARKER) {
                self.log_status();
                return Err(ApiError::RateLimited { body });
            }
            return Err(ApiError::Http { url, status, body });
        }
        Ok(wire::parse_elements(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bbox() -> BoundingBox {
        "10.0,50.0,10.05,50.05".parse().expect("valid bbox")
    }

    #[rstest]
    fn plain_query_has_timeout_bbox_and_recursion() {
        let rendered = OverpassSource::build_query(&bbox(), &SnapshotQuery::default());
        assert_eq!(
            rendered,
            "[timeout:300][bbox:50,10,50.05,10.05];(nwr;);(_.;>;);out meta qt;"
        );
    }

    #[rstest]
    fn filter_and_date_clauses_are_optional_and_ordered() {
        let query = SnapshotQuery {
            filter: Some("amenity=bench".to_owned()),
            date: Some("2024-05-01T00:00:00Z".to_owned()),
        };
        let rendered = OverpassSource::build_query(&bbox(), &query);
        assert_eq!(
            rendered,
            "[timeout:300][date:\"2024-05-01T00:00:00Z\"][bbox:50,10,50.05,10.05];\
             (nwr[amenity=bench];);(_.;>;);out meta qt;"
        );
    }
}
