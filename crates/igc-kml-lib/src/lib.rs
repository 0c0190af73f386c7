//! IGC → KML Library - Core Flight Decoding and Track Encoding
//!
//! This library turns the fixed-column text log written by glider and paraglider
//! flight recorders (IGC) into a KML document that mapping tools can display.
//! Both stages are pure functions: no I/O happens past [`FlightModel::from_reader`].
//!
//! # Architecture
//!
//! - **[`decode_coordinate`]**: IGC degree/minute encoding to signed decimal degrees
//! - **[`record`]**: Line classification and fixed-width field extraction
//! - **[`FlightModel`]**: Immutable flight metadata plus the ordered, valid fixes
//! - **[`encode_kml`]**: KML serialization driven by [`RenderOptions`]
//! - **[`hex_to_track_color`]**: Web `#RRGGBB` to KML `aabbggrr`
//!
//! # Example
//!
//! ```
//! use igc_kml_lib::{FlightModel, RenderOptions, encode_kml};
//!
//! let igc = "HFDTE230724\nB1022304530123N00612345EA0123401300\n";
//! let model = FlightModel::from_igc_str(igc);
//! assert_eq!(model.fixes().len(), 1);
//!
//! let kml = encode_kml(&model, &RenderOptions::default()).unwrap();
//! assert!(kml.contains("<gx:coord>6.205750,45.502050,1300</gx:coord>"));
//! ```

pub mod clock;
mod color;
mod coord;
mod flight;
pub mod kml;
pub mod record;

// Public API exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use color::{FALLBACK_TRACK_COLOR, hex_to_track_color};
pub use coord::{Hemisphere, decode_coordinate};
pub use flight::{Fix, FlightMetadata, FlightModel, FlightModelBuilder, FlightSummary};
pub use kml::{AltitudeSource, KML_MIME_TYPE, RenderOptions, encode_kml};

/// Error types for the conversion pipeline
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML serialization error: {0}")]
    Xml(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
