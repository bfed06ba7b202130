//! Painters for the 8-bit 2-2-2-2 framebuffers. One painter pair serves
//! all four channel orders through the [`Layout2222`] tags; blending runs
//! through an 8-bit intermediate (a 2-bit value times `0x55`) and
//! quantizes back with a shift. Written pixels always come out opaque.

use std::marker::PhantomData;

use crate::bitmap::Bitmap;
use crate::math::div255;
use crate::painter::{BitmapSource, Painter, Rgba8};
use crate::surface::Layout2222;

fn channel8(pix: u8, shift: u32) -> u32 {
    (u32::from(pix >> shift) & 0x03) * 0x55
}

fn blend_pixel<F: Layout2222>(fb: u8, r: u32, g: u32, b: u32, alpha: u32) -> u8 {
    let ialpha = 0xFF - alpha;
    let mix = |fg: u32, bg: u32| (div255(fg * alpha + bg * ialpha) >> 6) as u8;
    F::pack(
        mix(r, channel8(fb, F::R_SHIFT)),
        mix(g, channel8(fb, F::G_SHIFT)),
        mix(b, channel8(fb, F::B_SHIFT)),
        3,
    )
}

/// Paints one solid color.
#[derive(Debug, Clone, Copy)]
pub struct Painter2222<F: Layout2222> {
    color: u8,
    red: u32,
    green: u32,
    blue: u32,
    format: PhantomData<F>,
}

impl<F: Layout2222> Painter2222<F> {
    pub fn new() -> Self {
        Painter2222 {
            color: F::pack(0, 0, 0, 3),
            red: 0,
            green: 0,
            blue: 0,
            format: PhantomData,
        }
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.color = F::pack(color.r >> 6, color.g >> 6, color.b >> 6, 3);
        self.red = u32::from(color.r);
        self.green = u32::from(color.g);
        self.blue = u32::from(color.b);
    }
}

impl<F: Layout2222> Default for Painter2222<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Layout2222> Painter for Painter2222<F> {
    fn paint(&self, dest: &mut [u8], offset: i32, _widget_x: i32, _widget_y: i32, count: i32, alpha: u8) {
        if alpha == 0xFF {
            for i in offset..offset + count {
                dest[i as usize] = self.color;
            }
        } else {
            let alpha = u32::from(alpha);
            for i in offset..offset + count {
                let ix = i as usize;
                dest[ix] = blend_pixel::<F>(dest[ix], self.red, self.green, self.blue, alpha);
            }
        }
    }
}

/// Paints pixels sampled from a bitmap with the same channel order as the
/// framebuffer.
#[derive(Debug, Clone, Copy)]
pub struct Painter2222Bitmap<'a, F: Layout2222> {
    pub source: BitmapSource<'a>,
    format: PhantomData<F>,
}

impl<'a, F: Layout2222> Painter2222Bitmap<'a, F> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert_eq!(bitmap.format, F::BITMAP_FORMAT);
        Painter2222Bitmap {
            source: BitmapSource::new(bitmap),
            format: PhantomData,
        }
    }
}

impl<'a, F: Layout2222> Painter for Painter2222Bitmap<'a, F> {
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
        let row = &bitmap.data[(bitmap_y * bw) as usize..];
        let mut available = bw - bitmap_x;
        let mut src_x = bitmap_x;
        let mut dst = offset;

        while count > 0 {
            let length = available.min(count);
            count -= length;
            for k in 0..length {
                let pix = row[(src_x + k) as usize];
                let src_a = channel8(pix, F::A_SHIFT);
                let a = div255(u32::from(alpha) * src_a);
                let ix = (dst + k) as usize;
                if a == 0xFF {
                    dest[ix] = pix;
                } else if a != 0 {
                    dest[ix] = blend_pixel::<F>(
                        dest[ix],
                        channel8(pix, F::R_SHIFT),
                        channel8(pix, F::G_SHIFT),
                        channel8(pix, F::B_SHIFT),
                        a,
                    );
                }
            }
            dst += length;
            src_x = 0;
            available = bw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::BitmapFormat;
    use crate::surface::{Abgr2222, Argb2222, Rgba2222};

    #[test]
    fn solid_store_respects_channel_order() {
        let mut rgba = Painter2222::<Rgba2222>::new();
        rgba.set_color(Rgba8::rgb(255, 0, 0));
        let mut fb = [0u8; 1];
        rgba.paint(&mut fb, 0, 0, 0, 1, 255);
        assert_eq!(fb, [0b1100_0011]);

        let mut abgr = Painter2222::<Abgr2222>::new();
        abgr.set_color(Rgba8::rgb(255, 0, 0));
        let mut fb = [0u8; 1];
        abgr.paint(&mut fb, 0, 0, 0, 1, 255);
        assert_eq!(fb, [0b1100_0011], "A top, R bottom");
    }

    #[test]
    fn blend_lands_between_quant_levels() {
        let mut p = Painter2222::<Rgba2222>::new();
        p.set_color(Rgba8::rgb(255, 255, 255));
        let mut fb = [Rgba2222::pack(0, 0, 0, 3); 1];
        p.paint(&mut fb, 0, 0, 0, 1, 128);
        // 128 quantizes to level 2 of 3 in every channel.
        assert_eq!(fb, [Rgba2222::pack(2, 2, 2, 3)]);
    }

    #[test]
    fn bitmap_source_alpha_gates_pixels() {
        let data = [
            Argb2222::pack(3, 0, 0, 3),
            Argb2222::pack(3, 0, 0, 0),
        ];
        let bitmap = Bitmap::new(BitmapFormat::Argb2222, 2, 1, &data);
        let painter = Painter2222Bitmap::<Argb2222>::new(bitmap);
        let mut fb = [0u8; 2];
        painter.paint(&mut fb, 0, 0, 0, 2, 255);
        assert_eq!(fb[0], Argb2222::pack(3, 0, 0, 3));
        assert_eq!(fb[1], 0, "transparent source pixel leaves the buffer");
    }
}
