//! KML encoding of a decoded flight
//!
//! The document holds one styled `gx:Track` placemark (parallel `when` and
//! `gx:coord` lists) plus point placemarks for takeoff and landing.

pub mod xml;

use crate::color::hex_to_track_color;
use crate::flight::{Fix, FlightModel};
use crate::{Result, kml::xml::Element};
use chrono::{DateTime, SecondsFormat, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// MIME type of KML documents
pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";

/// Stroke color used when none is configured
pub const DEFAULT_STROKE_COLOR: &str = "#ff0055";
pub const DEFAULT_ALTITUDE_MODE: &str = "absolute";

const TRACK_STYLE_ID: &str = "trackStyle";
const TRACK_LINE_WIDTH: u32 = 3;
const TAKEOFF_NAME: &str = "Takeoff";
const LANDING_NAME: &str = "Landing";
const DESCRIPTION_SEPARATOR: &str = " • ";

/// Which altitude column feeds the track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AltitudeSource {
    #[default]
    Gps,
    Pressure,
}

impl AltitudeSource {
    #[inline]
    pub fn altitude_of(self, fix: &Fix) -> i32 {
        match self {
            Self::Gps => fix.gps_altitude,
            Self::Pressure => fix.pressure_altitude,
        }
    }
}

impl FromStr for AltitudeSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gps" => Ok(Self::Gps),
            "pressure" => Ok(Self::Pressure),
            other => Err(format!(
                "unknown altitude source '{other}' (expected 'gps' or 'pressure')"
            )),
        }
    }
}

impl fmt::Display for AltitudeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => f.write_str("gps"),
            Self::Pressure => f.write_str("pressure"),
        }
    }
}

/// Rendering configuration for [`encode_kml`]
///
/// Values are expected to be validated by the caller; the stroke color still
/// falls back to a fixed color when it is not `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderOptions {
    /// Document name; `None` or empty means auto-generated
    pub title: Option<String>,
    /// Web color `#RRGGBB`
    pub stroke_color: String,
    /// Emitted verbatim (`absolute`, `clampToGround`, `relativeToGround`)
    pub altitude_mode: String,
    pub altitude_source: AltitudeSource,
    /// Keep every Nth fix
    pub decimation_stride: NonZeroUsize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            altitude_mode: DEFAULT_ALTITUDE_MODE.to_string(),
            altitude_source: AltitudeSource::default(),
            decimation_stride: NonZeroUsize::MIN,
        }
    }
}

/// One retained fix, formatted for the track
#[derive(Debug, Clone, PartialEq)]
struct TrackPoint {
    when: String,
    coordinates: String,
}

/// Fixes at indices `0, stride, 2 * stride, ...`
pub fn decimate(fixes: &[Fix], stride: NonZeroUsize) -> impl Iterator<Item = &Fix> {
    fixes.iter().step_by(stride.get())
}

/// `longitude,latitude,altitude` with six decimals for the angles
pub fn format_coordinates(fix: &Fix, source: AltitudeSource) -> String {
    // Adding zero turns -0.0 (zero minutes west or south) into 0.0
    format!(
        "{:.6},{:.6},{}",
        fix.longitude() + 0.0,
        fix.latitude() + 0.0,
        source.altitude_of(fix)
    )
}

/// ISO-8601 UTC instant with milliseconds (`2024-07-23T10:22:30.000Z`)
pub fn format_when(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_human(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Document name: the configured title, or `Flight [pilot] <date of first fix>`
pub fn document_title(model: &FlightModel, options: &RenderOptions) -> String {
    if let Some(title) = options.title.as_deref().filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let date = model
        .fixes()
        .first()
        .map(|fix| fix.timestamp.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "flight".to_string());

    match &model.metadata().pilot {
        Some(pilot) => format!("Flight {pilot} {date}"),
        None => format!("Flight {date}"),
    }
}

/// Bullet separated list of the known header fields, fix count and time range
pub fn document_description(model: &FlightModel) -> String {
    let metadata = model.metadata();
    let mut parts = Vec::new();

    if let Some(pilot) = &metadata.pilot {
        parts.push(format!("Pilot: {pilot}"));
    }
    if let Some(glider) = &metadata.glider {
        parts.push(format!("Glider: {glider}"));
    }
    if let Some(site) = &metadata.site {
        parts.push(format!("Site: {site}"));
    }
    if let Some(gps) = &metadata.gps_receiver {
        parts.push(format!("GPS: {gps}"));
    }
    parts.push(format!("Fixes: {}", model.fixes().len()));
    if let (Some(first), Some(last)) = (model.fixes().first(), model.fixes().last()) {
        parts.push(format!("From: {} UTC", format_human(&first.timestamp)));
        parts.push(format!("To: {} UTC", format_human(&last.timestamp)));
    }

    parts.join(DESCRIPTION_SEPARATOR)
}

fn point_placemark(name: &'static str, coordinates: &str) -> Element {
    Element::new("Placemark")
        .with_child(Element::text_element("name", name))
        .with_child(
            Element::new("Point").with_child(Element::text_element("coordinates", coordinates)),
        )
}

/// Build the KML element tree for `model`
pub fn build_document(model: &FlightModel, options: &RenderOptions) -> Element {
    let points: Vec<TrackPoint> = decimate(model.fixes(), options.decimation_stride)
        .map(|fix| TrackPoint {
            when: format_when(&fix.timestamp),
            coordinates: format_coordinates(fix, options.altitude_source),
        })
        .collect();

    let color = hex_to_track_color(&options.stroke_color);
    let title = document_title(model, options);

    let style = Element::new("Style")
        .with_attribute("id", TRACK_STYLE_ID)
        .with_child(
            Element::new("LineStyle")
                .with_child(Element::text_element("color", &color))
                .with_child(Element::text_element("width", TRACK_LINE_WIDTH.to_string())),
        )
        .with_child(Element::new("PolyStyle").with_child(Element::text_element("color", &color)));

    let track = Element::new("gx:Track")
        .with_attribute("xmlns:gx", GX_NAMESPACE)
        .with_children(
            points
                .iter()
                .map(|point| Element::text_element("when", &point.when)),
        )
        .with_children(
            points
                .iter()
                .map(|point| Element::text_element("gx:coord", &point.coordinates)),
        )
        .with_child(Element::text_element("altitudeMode", &options.altitude_mode));

    let mut document = Element::new("Document")
        .with_child(Element::text_element("name", &title))
        .with_child(Element::text_element(
            "description",
            document_description(model),
        ))
        .with_child(style)
        .with_child(
            Element::new("Placemark")
                .with_child(Element::text_element("name", &title))
                .with_child(Element::text_element(
                    "styleUrl",
                    format!("#{TRACK_STYLE_ID}"),
                ))
                .with_child(track),
        );

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        document = document
            .with_child(point_placemark(TAKEOFF_NAME, &first.coordinates))
            .with_child(point_placemark(LANDING_NAME, &last.coordinates));
    }

    Element::new("kml")
        .with_attribute("xmlns", KML_NAMESPACE)
        .with_child(document)
}

/// Encode `model` as a KML document
///
/// A model without fixes still produces a valid document with an empty track
/// and no takeoff/landing placemarks.
pub fn encode_kml(model: &FlightModel, options: &RenderOptions) -> Result<String> {
    #[cfg(feature = "profiling")]
    profiling::scope!("kml::encode_kml");

    let document = build_document(model, options);
    let kml = xml::to_document_string(&document)?;
    tracing::debug!(
        "Encoded {} of {} fixes ({} bytes of KML)",
        model.fixes().len().div_ceil(options.decimation_stride.get()),
        model.fixes().len(),
        kml.len()
    );
    Ok(kml)
}
