//! Errors produced while talking to the map servers.

use thiserror::Error;

use crate::wire::WireError;

/// Errors from the editing API and the Overpass endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error contacting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    Http { url: String, status: u16, body: String },
    /// The server rejected the requested area as too large.
    ///
    /// Recoverable on the map download path by quartering the box; fatal
    /// everywhere else.
    #[error("the server rejected the requested area as too large")]
    AreaTooLarge,
    /// The server blocked the client for downloading too much.
    #[error("blocked from the API for downloading too much: {body}")]
    RateLimited { body: String },
    /// A response body could not be decoded.
    #[error("could not decode the server response: {0}")]
    Wire(#[from] WireError),
    /// Changeset creation answered with something other than an id.
    #[error("changeset creation returned an unexpected body: {body:?}")]
    ChangesetId { body: String },
}
