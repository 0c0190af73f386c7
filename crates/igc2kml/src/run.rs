//! Conversion of one IGC file to one KML file

use crate::settings::Settings;
use igc_kml_lib::{ConvertError, FlightModel, KML_MIME_TYPE, encode_kml};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("No valid fixes in {}, nothing to convert (pass --allow-empty to write anyway)", .0.display())]
    NoFixes(PathBuf),
}

/// Read and decode an IGC file, naming the model after the file stem
pub fn load_flight(path: &Path) -> Result<FlightModel, CliError> {
    let read_error = |source: ConvertError| CliError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| read_error(e.into()))?;
    let model = FlightModel::from_reader(BufReader::new(file)).map_err(read_error)?;

    Ok(match path.file_stem() {
        Some(stem) => model.with_source_name(stem.to_string_lossy()),
        None => model,
    })
}

/// Human readable overview of a decoded flight, one line per item
fn describe_flight(model: &FlightModel) -> Vec<String> {
    let metadata = model.metadata();
    let summary = model.summary();

    let mut lines = vec![format!(
        "Decoded {} valid fixes (pilot: {}, glider: {})",
        summary.fix_count,
        metadata.pilot.as_deref().unwrap_or("unknown"),
        metadata.glider.as_deref().unwrap_or("unknown")
    )];
    if let (Some(start), Some(end), Some(duration)) =
        (summary.start, summary.end, summary.duration())
    {
        lines.push(format!(
            "Flight from {} to {} UTC ({} min, {:.1} km)",
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%Y-%m-%d %H:%M:%S"),
            duration.num_minutes(),
            summary.distance_meters / 1000.0
        ));
    }
    if let Some(bounds) = model.bounding_rect() {
        lines.push(format!(
            "Track bounds: lat {:.5}..{:.5}, lon {:.5}..{:.5}",
            bounds.min().y,
            bounds.max().y,
            bounds.min().x,
            bounds.max().x
        ));
    }
    lines
}

/// Convert the configured input; returns where the document went
pub fn run(settings: &Settings) -> Result<Option<PathBuf>, CliError> {
    let model = load_flight(&settings.input)?;
    for line in describe_flight(&model) {
        tracing::info!("{line}");
    }

    if model.is_empty() && !settings.allow_empty {
        return Err(CliError::NoFixes(settings.input.clone()));
    }

    let options = settings.render_options();
    let kml = encode_kml(&model, &options)?;

    if settings.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(kml.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|source| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        return Ok(None);
    }

    let path = settings.output_path(&model);
    std::fs::write(&path, kml).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Wrote {} ({KML_MIME_TYPE})", path.display());

    Ok(Some(path))
}
