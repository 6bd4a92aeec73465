//! HTTP implementation of the editing-API seam.
//!
//! The pipeline is synchronous; the implementation bridges to the async
//! `reqwest` client by blocking on an owned current-thread runtime, keeping
//! callers free of any async plumbing.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tokio::runtime::Runtime;

use sandmirror_core::{BoundingBox, ElementSet, IdMap};

use crate::GENERATOR;
use crate::error::ApiError;
use crate::map_api::MapApi;
use crate::wire::{self, ChangeBatch};

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout; map downloads of a full box can be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(330);

/// Errors building an API handle.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The HTTP client could not be constructed.
    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The async runtime could not be constructed.
    #[error("failed to build the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Outcome of one HTTP exchange, before status classification.
struct RawResponse {
    url: String,
    status: StatusCode,
    body: String,
}

/// A map editing API reached over HTTP.
pub struct HttpMapApi {
    client: Client,
    runtime: Runtime,
    base_url: String,
    auth: Option<String>,
}

impl std::fmt::Debug for HttpMapApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMapApi")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpMapApi {
    /// Build a handle for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BuildError> {
        let client = Client::builder()
            .user_agent(GENERATOR)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            base_url: base_url.into(),
            auth: None,
        })
    }

    /// Attach a pre-formed `Authorization` header value to every call.
    #[must_use]
    pub fn with_auth(mut self, header: impl Into<String>) -> Self {
        self.auth = Some(header.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential validation probe.
    pub fn user_details(&self) -> Result<(), ApiError> {
        let raw = self.request(Method::GET, "user/details", &[], None)?;
        expect_success(raw).map(drop)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<RawResponse, ApiError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        self.runtime.block_on(async {
            let mut request = self
                .client
                .request(method, &url)
                .header(CONTENT_TYPE, "application/xml");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(header) = &self.auth {
                request = request.header(AUTHORIZATION, header);
            }
            if let Some(body) = body {
                request = request.body(body);
            }
            let response = request.send().await.map_err(|source| ApiError::Network {
                url: url.clone(),
                source,
            })?;
            let status = response.status();
            let body = response.text().await.map_err(|source| ApiError::Network {
                url: url.clone(),
                source,
            })?;
            Ok(RawResponse { url, status, body })
        })
    }
}

fn expect_success(raw: RawResponse) -> Result<String, ApiError> {
    if raw.status.is_success() {
        Ok(raw.body)
    } else {
        Err(ApiError::Http {
            url: raw.url,
            status: raw.status.as_u16(),
            body: raw.body,
        })
    }
}

impl MapApi for HttpMapApi {
    fn max_changeset_elements(&self) -> Result<Option<u64>, ApiError> {
        let body = expect_success(self.request(Method::GET, "capabilities", &[], None)?)?;
        Ok(wire::parse_max_changeset_elements(&body)?)
    }

    fn map_in_bbox(&self, bbox: &BoundingBox) -> Result<ElementSet, ApiError> {
        let param = bbox.api_param();
        let raw = self.request(Method::GET, "map", &[("bbox", param.as_str())], None)?;
        match raw.status.as_u16() {
            400 => Err(ApiError::AreaTooLarge),
            509 => Err(ApiError::RateLimited { body: raw.body }),
            _ => {
                let body = expect_success(raw)?;
                Ok(wire::parse_elements(&body)?)
            }
        }
    }

    fn create_changeset(&self, comment: &str) -> Result<i64, ApiError> {
        let payload = wire::changeset_document(comment)?;
        let body = expect_success(self.request(
            Method::PUT,
            "changeset/create",
            &[],
            Some(payload),
        )?)?;
        body.trim()
            .parse()
            .map_err(|_| ApiError::ChangesetId { body })
    }

    fn upload_changes(&self, changeset: i64, batch: &ChangeBatch<'_>) -> Result<IdMap, ApiError> {
        let payload = wire::change_document(batch, changeset)?;
        let body = expect_success(self.request(
            Method::POST,
            &format!("changeset/{changeset}/upload"),
            &[],
            Some(payload),
        )?)?;
        Ok(wire::parse_diff_result(&body)?)
    }

    fn close_changeset(&self, changeset: i64) -> Result<(), ApiError> {
        expect_success(self.request(
            Method::PUT,
            &format!("changeset/{changeset}/close"),
            &[],
            None,
        )?)
        .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn debug_output_redacts_credentials() {
        let api = HttpMapApi::new("https://example.com/api/0.6/")
            .expect("handle builds")
            .with_auth("Basic c2VjcmV0OnNlY3JldA==");
        let rendered = format!("{api:?}");
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("redacted"));
    }

    #[rstest]
    fn base_url_is_kept_verbatim() {
        let api = HttpMapApi::new("https://example.com/api/0.6/").expect("handle builds");
        assert_eq!(api.base_url(), "https://example.com/api/0.6/");
    }
}
