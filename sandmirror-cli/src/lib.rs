//! Command-line interface for copying OpenStreetMap data into the sandbox.

#![forbid(unsafe_code)]

mod auth;
mod error;

use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use sandmirror_api::{
    ChangeBatch, HttpMapApi, MirrorOptions, MirrorOutcome, OSM_API_URL, OVERPASS_API_URL,
    OverpassSource, SANDBOX_API_URL, SnapshotQuery, SnapshotSource, mirror, wire,
};
use sandmirror_core::{BoundingBox, FilterConfig};

use auth::AuthOutcome;
pub use error::CliError;

/// Run the CLI with the current process arguments.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    cli.execute()
}

#[derive(Debug, Parser)]
#[command(
    name = "sandmirror",
    about = "Downloads data from the Overpass API and uploads it to the mapping sandbox",
    after_help = "Because sandboxes are for grown-ups, too!",
    version
)]
struct Cli {
    /// The target bounding box as minlon,minlat,maxlon,maxlat.
    bbox: String,

    /// Prompt for sandbox credentials before running. Authentication is
    /// necessary to upload data to the sandbox.
    #[arg(short, long)]
    auth: bool,

    /// Use a custom Overpass API instance.
    #[arg(long, value_name = "url", default_value = OVERPASS_API_URL)]
    overpass: String,

    /// Copy only elements matching an Overpass tag filter, e.g. "amenity=bench".
    #[arg(long, value_name = "expr")]
    filter: Option<String>,

    /// Copy the map as it was at this date (ISO 8601 timestamp).
    #[arg(long, value_name = "date")]
    date: Option<String>,

    /// Write the download as an osmChange file instead of uploading it.
    #[arg(long, value_name = "path")]
    write_osc: Option<PathBuf>,

    /// Drop nodes outside the box and relations nested in relations.
    #[arg(long)]
    clip_bbox: bool,

    /// Drop ways and relations with members missing from the download.
    #[arg(long)]
    drop_dangling: bool,

    /// Drop untagged nodes nothing references.
    #[arg(long)]
    drop_orphan_nodes: bool,
}

impl Cli {
    fn execute(&self) -> Result<(), CliError> {
        let bbox: BoundingBox = self.bbox.parse()?;
        let endpoint = self.validated_overpass_endpoint()?;
        let options = MirrorOptions {
            filters: self.filter_config(),
            query: SnapshotQuery {
                filter: self.filter.clone(),
                date: self.date.clone(),
            },
        };
        let source = OverpassSource::new(endpoint)?;

        if let Some(path) = &self.write_osc {
            return write_osc(&source, &bbox, &options, path);
        }

        if !self.auth {
            return Err(CliError::AuthRequired);
        }
        let sandbox = match auth::read_auth(SANDBOX_API_URL)? {
            AuthOutcome::Authenticated(api) => api,
            AuthOutcome::Declined => return Ok(()),
        };
        let donor = HttpMapApi::new(OSM_API_URL)?;

        match mirror::run(&sandbox, &donor, &source, &bbox, &options, confirm_deletion)? {
            MirrorOutcome::Completed { deleted, created } => {
                info!("Copied {created} elements ({deleted} cleared). Done.");
            }
            MirrorOutcome::Declined { .. } | MirrorOutcome::SourceEmpty { .. } => {}
        }
        Ok(())
    }

    fn validated_overpass_endpoint(&self) -> Result<String, CliError> {
        url::Url::parse(&self.overpass).map_err(|source| CliError::OverpassEndpoint {
            url: self.overpass.clone(),
            source,
        })?;
        Ok(self.overpass.clone())
    }

    const fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            clip_to_bbox: self.clip_bbox,
            drop_dangling: self.drop_dangling,
            drop_orphan_nodes: self.drop_orphan_nodes,
        }
    }
}

/// Download the snapshot and write it out as one create document, without
/// touching the sandbox.
fn write_osc(
    source: &OverpassSource,
    bbox: &BoundingBox,
    options: &MirrorOptions,
    path: &Path,
) -> Result<(), CliError> {
    let mut elements = source.snapshot(bbox, &options.query)?;
    options.filters.apply(&mut elements, bbox);
    let values = elements.into_create_order();
    let document = wire::change_document(&ChangeBatch::Create(&values), 1)?;
    std::fs::write(path, document).map_err(|source| CliError::WriteOsc {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote {} elements to {}.", values.len(), path.display());
    Ok(())
}

/// Ask the operator before clearing an unusually full area.
fn confirm_deletion(count: usize) -> bool {
    println!("Sandbox has {count} elements at this location.");
    println!("Proceed with deleting them? (type \"yes\" if agreed)");
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn uploading_without_auth_is_refused() {
        let cli = Cli::try_parse_from(["sandmirror", "10.0,50.0,10.05,50.05"])
            .expect("arguments parse");
        assert!(matches!(cli.execute(), Err(CliError::AuthRequired)));
    }

    #[rstest]
    fn overpass_endpoint_defaults_to_the_public_instance() {
        let cli = Cli::try_parse_from(["sandmirror", "-a", "10.0,50.0,10.05,50.05"])
            .expect("arguments parse");
        assert_eq!(cli.overpass, OVERPASS_API_URL);
        assert!(cli.filter.is_none());
        assert!(cli.date.is_none());
        assert!(cli.write_osc.is_none());
    }

    #[rstest]
    fn filter_flags_map_onto_the_config() {
        let cli = Cli::try_parse_from([
            "sandmirror",
            "-a",
            "--clip-bbox",
            "--drop-orphan-nodes",
            "10.0,50.0,10.05,50.05",
        ])
        .expect("arguments parse");
        let config = cli.filter_config();
        assert!(config.clip_to_bbox);
        assert!(!config.drop_dangling);
        assert!(config.drop_orphan_nodes);
    }

    #[rstest]
    fn malformed_bbox_is_reported_before_any_prompt() {
        let cli = Cli::try_parse_from(["sandmirror", "-a", "not-a-bbox"])
            .expect("arguments parse");
        assert!(matches!(
            cli.execute(),
            Err(CliError::BoundingBox(_))
        ));
    }

    #[rstest]
    fn bad_overpass_endpoint_is_rejected() {
        let cli = Cli::try_parse_from([
            "sandmirror",
            "-a",
            "--overpass",
            "not a url",
            "10.0,50.0,10.05,50.05",
        ])
        .expect("arguments parse");
        assert!(matches!(
            cli.execute(),
            Err(CliError::OverpassEndpoint { .. })
        ));
    }
}
