//! Error types emitted by the sandmirror CLI.

use thiserror::Error;

use sandmirror_api::{ApiError, BuildError, MirrorError, WireError};
use sandmirror_core::BoundingBoxError;

/// Errors emitted by the sandmirror CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// The positional bounding box did not parse or is too large.
    #[error("invalid bounding box: {0}")]
    BoundingBox(#[from] BoundingBoxError),
    /// The Overpass endpoint override is not a valid URL.
    #[error("invalid Overpass endpoint {url:?}: {source}")]
    OverpassEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// An API handle could not be constructed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Uploading requires credentials the operator did not offer.
    #[error("authentication is necessary to upload to the sandbox; pass --auth")]
    AuthRequired,
    /// Reading from the terminal failed.
    #[error("failed to read from the terminal: {0}")]
    Prompt(#[source] std::io::Error),
    /// The copy pipeline failed.
    #[error(transparent)]
    Mirror(#[from] MirrorError),
    /// A standalone API call failed outside the pipeline.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Rendering an osmChange document failed.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// Writing the osmChange output file failed.
    #[error("failed to write {path}: {source}")]
    WriteOsc {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
