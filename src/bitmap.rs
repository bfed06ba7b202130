//! Source bitmap descriptors for the bitmap painters.
//!
//! A [`Bitmap`] borrows pixel data owned elsewhere and carries just enough
//! metadata for a painter to sample it: format, dimensions, an optional
//! alpha plane (grayscale formats) and an optional palette (`L8`).

use crate::rect::Rect;

/// Pixel layouts a bitmap painter can sample from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// 16-bit 5-6-5, two bytes per pixel.
    Rgb565,
    /// 24-bit, three bytes per pixel stored B, G, R.
    Rgb888,
    /// 32-bit with alpha, stored as a little-endian `u32` per pixel.
    Argb8888,
    /// 1-bit monochrome, eight pixels per byte, most significant bit first.
    Bw,
    /// Run-length encoded monochrome, see
    /// [`BwRleData`](crate::paint_bw::BwRleData) for the encoding.
    BwRle,
    /// 2-bit grayscale, four pixels per byte.
    Gray2,
    /// 4-bit grayscale, two pixels per byte.
    Gray4,
    /// 8-bit with 2 bits per channel, R in the top bits, A in the bottom.
    Rgba2222,
    /// 8-bit with 2 bits per channel, B in the top bits, A in the bottom.
    Bgra2222,
    /// 8-bit with 2 bits per channel, A in the top bits, B in the bottom.
    Argb2222,
    /// 8-bit with 2 bits per channel, A in the top bits, R in the bottom.
    Abgr2222,
    /// 8-bit palette indices; the palette lives in [`Clut`].
    L8,
}

/// Entry layout of an [`L8`](BitmapFormat::L8) palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClutFormat {
    /// Four bytes per entry, a little-endian ARGB `u32`.
    Argb8888,
    /// Three bytes per entry stored B, G, R.
    Rgb888,
    /// Two bytes per entry, little-endian 5-6-5.
    Rgb565,
}

/// A color lookup table for palette bitmaps.
#[derive(Debug, Clone, Copy)]
pub struct Clut<'a> {
    pub format: ClutFormat,
    pub entries: &'a [u8],
}

/// A borrowed source image.
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    pub format: BitmapFormat,
    pub width: i16,
    pub height: i16,
    pub data: &'a [u8],
    /// Per-pixel alpha for formats whose pixels carry none of their own:
    /// one byte per pixel for [`Rgb565`](BitmapFormat::Rgb565), packed
    /// like the pixel data for [`Gray2`](BitmapFormat::Gray2) and
    /// [`Gray4`](BitmapFormat::Gray4).
    pub alpha_plane: Option<&'a [u8]>,
    pub clut: Option<Clut<'a>>,
}

impl<'a> Bitmap<'a> {
    pub fn new(format: BitmapFormat, width: i16, height: i16, data: &'a [u8]) -> Self {
        debug_assert!(width > 0 && height > 0);
        if let Some(stride) = row_stride(format, width) {
            debug_assert!(
                data.len() >= stride * height as usize,
                "bitmap data shorter than {}x{} {:?}",
                width,
                height,
                format
            );
        }
        Bitmap {
            format,
            width,
            height,
            data,
            alpha_plane: None,
            clut: None,
        }
    }

    pub fn with_alpha_plane(mut self, plane: &'a [u8]) -> Self {
        debug_assert!(matches!(
            self.format,
            BitmapFormat::Rgb565 | BitmapFormat::Gray2 | BitmapFormat::Gray4
        ));
        let needed = match self.format {
            // One alpha byte per pixel.
            BitmapFormat::Rgb565 => self.width as usize * self.height as usize,
            // Packed like the pixel data.
            _ => row_stride(self.format, self.width).unwrap_or(0) * self.height as usize,
        };
        debug_assert!(
            plane.len() >= needed,
            "alpha plane shorter than {}x{} {:?}",
            self.width,
            self.height,
            self.format
        );
        self.alpha_plane = Some(plane);
        self
    }

    pub fn with_clut(mut self, clut: Clut<'a>) -> Self {
        debug_assert_eq!(self.format, BitmapFormat::L8);
        self.clut = Some(clut);
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

/// Bytes per row, or `None` for run-length encoded data.
fn row_stride(format: BitmapFormat, width: i16) -> Option<usize> {
    let w = width as usize;
    Some(match format {
        BitmapFormat::Rgb565 => w * 2,
        BitmapFormat::Rgb888 => w * 3,
        BitmapFormat::Argb8888 => w * 4,
        BitmapFormat::Bw => (w + 7) / 8,
        BitmapFormat::BwRle => return None,
        BitmapFormat::Gray2 => (w + 3) / 4,
        BitmapFormat::Gray4 => (w + 1) / 2,
        BitmapFormat::Rgba2222
        | BitmapFormat::Bgra2222
        | BitmapFormat::Argb2222
        | BitmapFormat::Abgr2222
        | BitmapFormat::L8 => w,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides() {
        assert_eq!(row_stride(BitmapFormat::Rgb565, 10), Some(20));
        assert_eq!(row_stride(BitmapFormat::Rgb888, 10), Some(30));
        assert_eq!(row_stride(BitmapFormat::Bw, 10), Some(2));
        assert_eq!(row_stride(BitmapFormat::Gray2, 10), Some(3));
        assert_eq!(row_stride(BitmapFormat::Gray4, 10), Some(5));
        assert_eq!(row_stride(BitmapFormat::L8, 10), Some(10));
        assert_eq!(row_stride(BitmapFormat::BwRle, 10), None);
    }

    #[test]
    fn descriptor_round_trip() {
        let data = [0u8; 8];
        let bmp = Bitmap::new(BitmapFormat::Gray4, 4, 2, &data).with_alpha_plane(&data);
        assert_eq!(bmp.rect(), Rect::new(0, 0, 4, 2));
        assert!(bmp.alpha_plane.is_some());
        assert!(bmp.clut.is_none());
    }

    #[test]
    fn rgb565_alpha_plane_is_one_byte_per_pixel() {
        let data = [0u8; 8];
        let plane = [0xFFu8; 4];
        let bmp = Bitmap::new(BitmapFormat::Rgb565, 2, 2, &data).with_alpha_plane(&plane);
        assert!(bmp.alpha_plane.is_some());
    }
}
