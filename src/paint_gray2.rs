//! Painters for 2-bit grayscale framebuffers. Four pixels per byte, lowest
//! bits first; blending runs through an 8-bit intermediate (a 2-bit value
//! times `0x55`) and quantizes back with a shift.

use crate::bitmap::{Bitmap, BitmapFormat};
use crate::math::{div255, luminance};
use crate::painter::{BitmapSource, Painter, Rgba8};

fn get_gray(dest: &[u8], ix: i32) -> u32 {
    u32::from(dest[(ix / 4) as usize] >> ((ix % 4) * 2)) & 0x03
}

fn put_gray(dest: &mut [u8], ix: i32, gray: u32) {
    let i = (ix / 4) as usize;
    let shift = (ix % 4) * 2;
    dest[i] = (dest[i] & !(0x03 << shift)) | ((gray as u8) << shift);
}

fn blend_gray(painter_gray: u32, fb_gray: u32, alpha: u32) -> u32 {
    div255((painter_gray * alpha + fb_gray * (0xFF - alpha)) * 0x55) >> 6
}

/// Paints one solid gray level.
#[derive(Debug, Clone, Copy)]
pub struct PainterGray2 {
    gray: u32,
}

impl PainterGray2 {
    pub fn new() -> Self {
        PainterGray2 { gray: 0 }
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.gray = u32::from(luminance(color.r, color.g, color.b)) >> 6;
    }
}

impl Default for PainterGray2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterGray2 {
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

/// Paints pixels sampled from a GRAY2 bitmap, honoring its alpha plane
/// when it has one.
#[derive(Debug, Clone, Copy)]
pub struct PainterGray2Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterGray2Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert_eq!(bitmap.format, BitmapFormat::Gray2);
        PainterGray2Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterGray2Bitmap<'a> {
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
        let stride = ((bw + 3) / 4) as usize;
        let row = &bitmap.data[bitmap_y as usize * stride..];
        let alpha_row = bitmap
            .alpha_plane
            .map(|plane| &plane[bitmap_y as usize * stride..]);

        let mut sx = bitmap_x;
        for i in offset..offset + count {
            let gray = u32::from(row[(sx / 4) as usize] >> ((sx % 4) * 2)) & 0x03;
            let a = match alpha_row {
                Some(plane) => {
                    let plane_a = u32::from(plane[(sx / 4) as usize] >> ((sx % 4) * 2)) & 0x03;
                    div255(u32::from(alpha) * (plane_a * 0x55))
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
