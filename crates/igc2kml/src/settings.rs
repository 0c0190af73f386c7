use clap::Parser;
use igc_kml_lib::kml::{DEFAULT_ALTITUDE_MODE, DEFAULT_STROKE_COLOR};
use igc_kml_lib::{AltitudeSource, FlightModel, RenderOptions};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// IGC to KML - Convert a glider or paraglider flight log into a KML track
pub struct Settings {
    /// IGC file to convert
    #[clap(value_name = "FILE")]
    pub input: PathBuf,

    /// Output KML file (default: the input path with a .kml extension)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the KML document to stdout instead of writing a file
    #[clap(long, default_value = "false", conflicts_with = "output")]
    pub stdout: bool,

    /// Document name (default: "Flight <pilot> <date>")
    #[clap(short, long, env = "IGC2KML_TITLE")]
    pub title: Option<String>,

    /// Track color as #RRGGBB
    #[clap(short, long, env = "IGC2KML_COLOR", default_value = DEFAULT_STROKE_COLOR)]
    pub color: String,

    /// KML altitude mode (absolute, clampToGround, relativeToGround)
    #[clap(long, env = "IGC2KML_ALTITUDE_MODE", default_value = DEFAULT_ALTITUDE_MODE)]
    pub altitude_mode: String,

    /// Altitude feeding the track (gps or pressure)
    #[clap(long, env = "IGC2KML_ALTITUDE_SOURCE", default_value = "gps")]
    pub altitude_source: AltitudeSource,

    /// Keep every Nth fix (0 is treated as 1)
    #[clap(long, env = "IGC2KML_THIN", default_value = "1")]
    pub thin: u64,

    /// Write the document even when the log has no valid fix
    #[clap(long, default_value = "false")]
    pub allow_empty: bool,
}

impl Settings {
    /// Rendering options with the stride clamped to at least 1
    pub fn render_options(&self) -> RenderOptions {
        let stride = usize::try_from(self.thin).unwrap_or(usize::MAX);

        RenderOptions {
            title: self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .map(str::to_string),
            stroke_color: self.color.clone(),
            altitude_mode: self.altitude_mode.clone(),
            altitude_source: self.altitude_source,
            decimation_stride: NonZeroUsize::new(stride).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Explicit `--output`, else the model's suggested name next to the input
    pub fn output_path(&self, model: &FlightModel) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_file_name(model.suggested_file_name()))
    }
}
