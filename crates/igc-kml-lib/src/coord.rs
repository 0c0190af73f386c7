//! Coordinate conversions for the IGC position encoding
//!
//! IGC stores each axis as whole degrees followed by minutes with three implied
//! decimals (`DDMMmmm` / `DDDMMmmm`) and a hemisphere letter.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hemisphere letter terminating an IGC latitude or longitude field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse the hemisphere tag byte (`N`, `S`, `E` or `W`)
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'N' => Some(Self::North),
            b'S' => Some(Self::South),
            b'E' => Some(Self::East),
            b'W' => Some(Self::West),
            _ => None,
        }
    }

    /// South and west are the negative halves
    #[inline]
    pub fn is_negative(self) -> bool {
        matches!(self, Self::South | Self::West)
    }
}

/// Convert an IGC coordinate to signed decimal degrees
///
/// # Arguments
/// * `degrees` - Whole degrees (2 digits for latitude, 3 for longitude)
/// * `minutes_thousandths` - Minutes times 1000 (`MMmmm`, 5 digits)
/// * `hemisphere` - Sign of the result
///
/// # Returns
/// Decimal degrees, negative for [`Hemisphere::South`] and [`Hemisphere::West`]
#[inline]
pub fn decode_coordinate(degrees: u32, minutes_thousandths: u32, hemisphere: Hemisphere) -> f64 {
    let minutes =
        f64::from(minutes_thousandths / 1000) + f64::from(minutes_thousandths % 1000) / 1000.0;
    let value = f64::from(degrees) + minutes / 60.0;
    if hemisphere.is_negative() { -value } else { value }
}
