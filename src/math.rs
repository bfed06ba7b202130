//! Small integer helpers shared by the painters.

/// Scale a product of two bytes (`0..=65025`) back into `0..=255`.
///
/// Shift-and-add approximation of `v / 255`. It is exact whenever `v` is a
/// multiple of 255, so fully opaque and fully transparent blends never lose
/// precision.
pub const fn div255(v: u32) -> u32 {
    (v + 1 + (v >> 8)) >> 8
}

/// Integer BT.601 luminance of an 8-bit RGB color, `0..=255`.
///
/// The weights sum to 256, so pure white maps to 255 and pure black to 0.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 151 + u32::from(b) * 28) >> 8) as u8
}
