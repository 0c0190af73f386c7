//! Web color to KML color conversion

/// KML color used when the requested stroke color is not `#RRGGBB`
pub const FALLBACK_TRACK_COLOR: &str = "ff5555ff";

/// Convert a web color (`#RRGGBB`, any case) to KML's `aabbggrr` order
///
/// Alpha is always opaque (`ff`) and the result is lowercase. Anything that is
/// not exactly a `#` followed by six hex digits yields [`FALLBACK_TRACK_COLOR`].
pub fn hex_to_track_color(web_hex: &str) -> String {
    let Some(digits) = web_hex.strip_prefix('#') else {
        return FALLBACK_TRACK_COLOR.to_string();
    };
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return FALLBACK_TRACK_COLOR.to_string();
    }

    let digits = digits.to_ascii_lowercase();
    let (red, green, blue) = (&digits[0..2], &digits[2..4], &digits[4..6]);
    format!("ff{blue}{green}{red}")
}
