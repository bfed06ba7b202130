//! Painters for 4-bit grayscale framebuffers. Two pixels per byte, low
//! nibble first; blending runs through an 8-bit intermediate (a nibble
//! times `0x11`) and quantizes back with a shift.

use crate::bitmap::{Bitmap, BitmapFormat};
use crate::math::{div255, luminance};
use crate::painter::{BitmapSource, Painter, Rgba8};

fn get_gray(dest: &[u8], ix: i32) -> u32 {
    u32::from(dest[(ix / 2) as usize] >> ((ix % 2) * 4)) & 0x0F
}

fn put_gray(dest: &mut [u8], ix: i32, gray: u32) {
    let i = (ix / 2) as usize;
    let shift = (ix % 2) * 4;
    dest[i] = (dest[i] & !(0x0F << shift)) | ((gray as u8) << shift);
}

fn blend_gray(painter_gray: u32, fb_gray: u32, alpha: u32) -> u32 {
    div255((painter_gray * alpha + fb_gray * (0xFF - alpha)) * 0x11) >> 4
}

/// Paints one solid gray level.
#[derive(Debug, Clone, Copy)]
pub struct PainterGray4 {
    gray: u32,
}

impl PainterGray4 {
    pub fn new() -> Self {
        PainterGray4 { gray: 0 }
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.gray = u32::from(luminance(color.r, color.g, color.b)) >> 4;
    }
}

impl Default for PainterGray4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterGray4 {
    fn paint(&self, dest: &mut [u8], offset: i32, _widget_x: i32, _widget_y: i32, count: i32, alpha: u8) {
        if alpha == 0xFF {
            for i in offset..offset + count {
                put_gray(dest, i, self.gray);
            }
        } else {
            let alpha = u32::from(alpha);
            for i in offset..offset + count {
                put_gray(dest, i, blend_gray(self.gray, get_gray(dest, i), alpha));
            }
        }
    }
}

/// Paints pixels sampled from a GRAY4 bitmap, honoring its alpha plane
/// when it has one.
#[derive(Debug, Clone, Copy)]
pub struct PainterGray4Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterGray4Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert_eq!(bitmap.format, BitmapFormat::Gray4);
        PainterGray4Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterGray4Bitmap<'a> {
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, alpha: u8) {
        let mut bitmap_x = widget_x;
        let mut bitmap_y = widget_y;
        let mut offset = offset;
        let mut count = count;
        if !self.source.adjust(&mut bitmap_x, &mut bitmap_y, &mut offset, &mut count) {
            return;
        }

        let bitmap = &self.source.bitmap;
        let bw = i32::from(bitmap.width);
        let stride = ((bw + 1) / 2) as usize;
        let row = &bitmap.data[bitmap_y as usize * stride..];
        let alpha_row = bitmap
            .alpha_plane
            .map(|plane| &plane[bitmap_y as usize * stride..]);

        let mut sx = bitmap_x;
        for i in offset..offset + count {
            let gray = u32::from(row[(sx / 2) as usize] >> ((sx % 2) * 4)) & 0x0F;
            let a = match alpha_row {
                Some(plane) => {
                    let plane_a = u32::from(plane[(sx / 2) as usize] >> ((sx % 2) * 4)) & 0x0F;
                    div255(u32::from(alpha) * (plane_a * 0x11))
                }
                None => u32::from(alpha),
            };
            if a == 0xFF {
                put_gray(dest, i, gray);
            } else if a != 0 {
                put_gray(dest, i, blend_gray(gray, get_gray(dest, i), a));
            }
            sx += 1;
            if sx == bw {
                sx = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_packs_two_pixels_per_byte() {
        let mut p = PainterGray4::new();
        p.set_color(Rgba8::rgb(255, 255, 255));
        let mut fb = [0u8; 2];
        p.paint(&mut fb, 0, 0, 0, 3, 255);
        assert_eq!(fb, [0xFF, 0x0F]);
    }

    #[test]
    fn blend_quantizes_through_8_bit() {
        // White at half alpha over black: 128 >> 4 = 8.
        assert_eq!(blend_gray(15, 0, 128), 8);
        assert_eq!(blend_gray(15, 15, 1), 15);
        assert_eq!(blend_gray(0, 15, 255), 0);
    }

    #[test]
    fn bitmap_samples_low_nibble_first() {
        let data = [0x5Au8];
        let bitmap = Bitmap::new(BitmapFormat::Gray4, 2, 1, &data);
        let painter = PainterGray4Bitmap::new(bitmap);
        let mut fb = [0u8; 1];
        painter.paint(&mut fb, 0, 0, 0, 2, 255);
        assert_eq!(fb, [0x5A]);
        let mut fb = [0u8; 1];
        painter.paint(&mut fb, 1, 0, 0, 1, 255);
        assert_eq!(fb, [0xA0], "first sample lands in the high nibble slot");
    }
}
