//! Typed framebuffer access.
//!
//! A [`Surface`] borrows raw framebuffer bytes and fixes the pixel format
//! at the type level, so a canvas can only be driven by painters of the
//! matching format. The format tag supplies row pitch and byte addressing,
//! including the sub-byte pixel adjust for formats below 8 bits per pixel.

use std::marker::PhantomData;

use crate::bitmap::BitmapFormat;

/// Destination pixel layout of a framebuffer.
pub trait PixelFormat {
    /// Bits used by one pixel.
    const BITS_PER_PIXEL: usize;

    /// Row pitch in bytes for a `width` pixel framebuffer.
    fn stride(width: i32) -> usize;

    /// Byte offset of pixel `x` within its row.
    fn byte_offset(x: i32) -> usize;

    /// Pixel remainder of `x` within its byte, 0 for byte-aligned formats.
    fn x_adjust(x: i32) -> i32 {
        let _ = x;
        0
    }

    /// Decode the pixel at `x` of a row to 8-bit RGB, for export and tests.
    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8);
}

/// 16-bit 5-6-5, little endian.
#[derive(Debug, Clone, Copy)]
pub struct Rgb565;

/// 24-bit, stored B, G, R.
#[derive(Debug, Clone, Copy)]
pub struct Rgb888;

/// 32-bit with destination alpha, stored as little-endian `u32`.
#[derive(Debug, Clone, Copy)]
pub struct Argb8888;

/// 32-bit without alpha; the top byte is written as zero.
#[derive(Debug, Clone, Copy)]
pub struct Xrgb8888;

/// 1-bit monochrome, eight pixels per byte, most significant bit first.
#[derive(Debug, Clone, Copy)]
pub struct Bw;

/// 2-bit grayscale, four pixels per byte, lowest bits first.
#[derive(Debug, Clone, Copy)]
pub struct Gray2;

/// 4-bit grayscale, two pixels per byte, low nibble first.
#[derive(Debug, Clone, Copy)]
pub struct Gray4;

/// 8-bit, 2 bits per channel: R in bits 7..6 down to A in bits 1..0.
#[derive(Debug, Clone, Copy)]
pub struct Rgba2222;

/// 8-bit, 2 bits per channel: B in bits 7..6 down to A in bits 1..0.
#[derive(Debug, Clone, Copy)]
pub struct Bgra2222;

/// 8-bit, 2 bits per channel: A in bits 7..6 down to B in bits 1..0.
#[derive(Debug, Clone, Copy)]
pub struct Argb2222;

/// 8-bit, 2 bits per channel: A in bits 7..6 down to R in bits 1..0.
#[derive(Debug, Clone, Copy)]
pub struct Abgr2222;

impl PixelFormat for Rgb565 {
    const BITS_PER_PIXEL: usize = 16;

    fn stride(width: i32) -> usize {
        width as usize * 2
    }

    fn byte_offset(x: i32) -> usize {
        x as usize * 2
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        let i = x as usize * 2;
        let p = u16::from_le_bytes([row[i], row[i + 1]]);
        let r = ((p >> 11) & 0x1F) as u8;
        let g = ((p >> 5) & 0x3F) as u8;
        let b = (p & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

impl PixelFormat for Rgb888 {
    const BITS_PER_PIXEL: usize = 24;

    fn stride(width: i32) -> usize {
        width as usize * 3
    }

    fn byte_offset(x: i32) -> usize {
        x as usize * 3
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        let i = x as usize * 3;
        (row[i + 2], row[i + 1], row[i])
    }
}

fn read_rgb32(row: &[u8], x: i32) -> (u8, u8, u8) {
    let i = x as usize * 4;
    let p = u32::from_le_bytes([row[i], row[i + 1], row[i + 2], row[i + 3]]);
    ((p >> 16) as u8, (p >> 8) as u8, p as u8)
}

impl PixelFormat for Argb8888 {
    const BITS_PER_PIXEL: usize = 32;

    fn stride(width: i32) -> usize {
        width as usize * 4
    }

    fn byte_offset(x: i32) -> usize {
        x as usize * 4
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        read_rgb32(row, x)
    }
}

impl PixelFormat for Xrgb8888 {
    const BITS_PER_PIXEL: usize = 32;

    fn stride(width: i32) -> usize {
        width as usize * 4
    }

    fn byte_offset(x: i32) -> usize {
        x as usize * 4
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        read_rgb32(row, x)
    }
}

impl PixelFormat for Bw {
    const BITS_PER_PIXEL: usize = 1;

    fn stride(width: i32) -> usize {
        (width as usize + 7) / 8
    }

    fn byte_offset(x: i32) -> usize {
        x as usize / 8
    }

    fn x_adjust(x: i32) -> i32 {
        x % 8
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        let bit = (row[x as usize / 8] >> (7 - (x as usize % 8))) & 1;
        let v = if bit != 0 { 255 } else { 0 };
        (v, v, v)
    }
}

impl PixelFormat for Gray2 {
    const BITS_PER_PIXEL: usize = 2;

    fn stride(width: i32) -> usize {
        (width as usize + 3) / 4
    }

    fn byte_offset(x: i32) -> usize {
        x as usize / 4
    }

    fn x_adjust(x: i32) -> i32 {
        x % 4
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        let gray = (row[x as usize / 4] >> ((x as usize % 4) * 2)) & 0x03;
        let v = gray * 0x55;
        (v, v, v)
    }
}

impl PixelFormat for Gray4 {
    const BITS_PER_PIXEL: usize = 4;

    fn stride(width: i32) -> usize {
        (width as usize + 1) / 2
    }

    fn byte_offset(x: i32) -> usize {
        x as usize / 2
    }

    fn x_adjust(x: i32) -> i32 {
        x % 2
    }

    fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
        let gray = (row[x as usize / 2] >> ((x as usize % 2) * 4)) & 0x0F;
        let v = gray * 0x11;
        (v, v, v)
    }
}

/// Bit positions of the four 2-bit channels within a packed byte.
pub trait Layout2222: PixelFormat {
    const R_SHIFT: u32;
    const G_SHIFT: u32;
    const B_SHIFT: u32;
    const A_SHIFT: u32;

    /// The source bitmap format with the same channel order.
    const BITMAP_FORMAT: BitmapFormat;

    /// Pack four 2-bit channel values into a byte.
    fn pack(r: u8, g: u8, b: u8, a: u8) -> u8 {
        (r << Self::R_SHIFT) | (g << Self::G_SHIFT) | (b << Self::B_SHIFT) | (a << Self::A_SHIFT)
    }
}

macro_rules! impl_2222 {
    ($name:ident, $r:expr, $g:expr, $b:expr, $a:expr) => {
        impl PixelFormat for $name {
            const BITS_PER_PIXEL: usize = 8;

            fn stride(width: i32) -> usize {
                width as usize
            }

            fn byte_offset(x: i32) -> usize {
                x as usize
            }

            fn read_rgb(row: &[u8], x: i32) -> (u8, u8, u8) {
                let p = row[x as usize];
                (
                    ((p >> $r) & 3) * 0x55,
                    ((p >> $g) & 3) * 0x55,
                    ((p >> $b) & 3) * 0x55,
                )
            }
        }

        impl Layout2222 for $name {
            const R_SHIFT: u32 = $r;
            const G_SHIFT: u32 = $g;
            const B_SHIFT: u32 = $b;
            const A_SHIFT: u32 = $a;
            const BITMAP_FORMAT: BitmapFormat = BitmapFormat::$name;
        }
    };
}

impl_2222!(Rgba2222, 6, 4, 2, 0);
impl_2222!(Bgra2222, 2, 4, 6, 0);
impl_2222!(Argb2222, 4, 2, 0, 6);
impl_2222!(Abgr2222, 0, 2, 4, 6);

/// A borrowed framebuffer with a statically known pixel format.
#[derive(Debug)]
pub struct Surface<'a, F: PixelFormat> {
    data: &'a mut [u8],
    width: i32,
    height: i32,
    format: PhantomData<F>,
}

impl<'a, F: PixelFormat> Surface<'a, F> {
    pub fn new(data: &'a mut [u8], width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert!(
            data.len() >= F::stride(width) * height as usize,
            "framebuffer shorter than {}x{} at {} bpp",
            width,
            height,
            F::BITS_PER_PIXEL
        );
        Surface {
            data,
            width,
            height,
            format: PhantomData,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        F::stride(self.width)
    }

    /// Byte offset of the pixel at `(x, y)`.
    pub fn base_offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride() + F::byte_offset(x)
    }

    /// Sub-byte pixel adjust for `x`, see [`PixelFormat::x_adjust`].
    pub fn x_adjust(&self, x: i32) -> i32 {
        F::x_adjust(x)
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Decode one pixel to 8-bit RGB.
    pub fn pixel_rgb(&self, x: i32, y: i32) -> (u8, u8, u8) {
        debug_assert!(x >= 0 && x < self.width && y >= 0 && y < self.height);
        let row = &self.data[y as usize * self.stride()..];
        F::read_rgb(row, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_formats_expose_sub_byte_adjust() {
        assert_eq!(Bw::x_adjust(13), 5);
        assert_eq!(Bw::byte_offset(13), 1);
        assert_eq!(Gray2::x_adjust(13), 1);
        assert_eq!(Gray2::byte_offset(13), 3);
        assert_eq!(Gray4::x_adjust(13), 1);
        assert_eq!(Gray4::byte_offset(13), 6);
        assert_eq!(Rgb565::x_adjust(13), 0);
        assert_eq!(Rgb565::byte_offset(13), 26);
    }

    #[test]
    fn strides_round_up() {
        assert_eq!(Bw::stride(13), 2);
        assert_eq!(Gray2::stride(13), 4);
        assert_eq!(Gray4::stride(13), 7);
        assert_eq!(Rgb888::stride(13), 39);
    }

    #[test]
    fn rgb565_decode_replicates_high_bits() {
        let px = 0xF800u16.to_le_bytes();
        let row = [px[0], px[1]];
        assert_eq!(Rgb565::read_rgb(&row, 0), (255, 0, 0));
        let px = 0x07E0u16.to_le_bytes();
        let row = [px[0], px[1]];
        assert_eq!(Rgb565::read_rgb(&row, 0), (0, 255, 0));
    }

    #[test]
    fn surface_addresses_pixels() {
        let mut fb = vec![0u8; 4 * 2 * 2];
        let s = Surface::<Argb8888>::new(&mut fb, 2, 2);
        assert_eq!(s.stride(), 8);
        assert_eq!(s.base_offset(1, 1), 12);
        assert_eq!(s.x_adjust(1), 0);
    }

    #[test]
    fn layouts_2222_pack_and_decode_consistently() {
        let full = Rgba2222::pack(3, 0, 3, 3);
        assert_eq!(Rgba2222::read_rgb(&[full], 0), (255, 0, 255));
        let full = Argb2222::pack(3, 0, 3, 3);
        assert_eq!(Argb2222::read_rgb(&[full], 0), (255, 0, 255));
        assert_eq!(Rgba2222::pack(3, 0, 0, 0), 0b1100_0000);
        assert_eq!(Abgr2222::pack(3, 0, 0, 0), 0b0000_0011);
    }
}
