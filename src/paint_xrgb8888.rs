//! Painters for XRGB8888 framebuffers. Pixels are four bytes stored
//! B, G, R, X; the destination counts as opaque and the X byte is written
//! as zero.

use crate::bitmap::{Bitmap, BitmapFormat, ClutFormat};
use crate::math::div255;
use crate::painter::{BitmapSource, GradientPiece, GradientRun, LinearGradient, Painter, Rgba8};

fn store_px(dest: &mut [u8], ix: i32, r: u8, g: u8, b: u8) {
    let i = ix as usize * 4;
    dest[i] = b;
    dest[i + 1] = g;
    dest[i + 2] = r;
    dest[i + 3] = 0;
}

fn blend_px(dest: &mut [u8], ix: i32, r: u8, g: u8, b: u8, alpha: u32) {
    let i = ix as usize * 4;
    let ialpha = 0xFF - alpha;
    dest[i] = div255(u32::from(b) * alpha + u32::from(dest[i]) * ialpha) as u8;
    dest[i + 1] = div255(u32::from(g) * alpha + u32::from(dest[i + 1]) * ialpha) as u8;
    dest[i + 2] = div255(u32::from(r) * alpha + u32::from(dest[i + 2]) * ialpha) as u8;
    dest[i + 3] = 0;
}

fn argb_channels(color: u32) -> (u8, u8, u8) {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

fn expand565(pix: u16) -> (u8, u8, u8) {
    let r = ((pix >> 11) & 0x1F) as u8;
    let g = ((pix >> 5) & 0x3F) as u8;
    let b = (pix & 0x1F) as u8;
    ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
}

/// Paints one solid color.
#[derive(Debug, Clone, Copy)]
pub struct PainterXrgb8888 {
    red: u8,
    green: u8,
    blue: u8,
}

impl PainterXrgb8888 {
    pub fn new() -> Self {
        PainterXrgb8888 {
            red: 0,
            green: 0,
            blue: 0,
        }
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.red = color.r;
        self.green = color.g;
        self.blue = color.b;
    }
}

impl Default for PainterXrgb8888 {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterXrgb8888 {
    fn paint(&self, dest: &mut [u8], offset: i32, _widget_x: i32, _widget_y: i32, count: i32, alpha: u8) {
        if alpha == 0xFF {
            for i in offset..offset + count {
                store_px(dest, i, self.red, self.green, self.blue);
            }
        } else {
            let alpha = u32::from(alpha);
            for i in offset..offset + count {
                blend_px(dest, i, self.red, self.green, self.blue, alpha);
            }
        }
    }
}

/// Paints pixels sampled from an ARGB8888 or RGB565 bitmap.
#[derive(Debug, Clone, Copy)]
pub struct PainterXrgb8888Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterXrgb8888Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert!(matches!(
            bitmap.format,
            BitmapFormat::Argb8888 | BitmapFormat::Rgb565
        ));
        PainterXrgb8888Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterXrgb8888Bitmap<'a> {
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
        let mut available = bw - bitmap_x;
        let mut src_x = bitmap_x;
        let mut dst = offset;

        match bitmap.format {
            BitmapFormat::Argb8888 => {
                let row = &bitmap.data[(bitmap_y * bw * 4) as usize..];
                while count > 0 {
                    let length = available.min(count);
                    count -= length;
                    for k in 0..length {
                        let i = (src_x + k) as usize * 4;
                        let srcpix =
                            u32::from_le_bytes([row[i], row[i + 1], row[i + 2], row[i + 3]]);
                        let a = div255(u32::from(alpha) * (srcpix >> 24));
                        let (r, g, b) = argb_channels(srcpix);
                        if a == 0xFF {
                            store_px(dest, dst + k, r, g, b);
                        } else if a != 0 {
                            blend_px(dest, dst + k, r, g, b, a);
                        }
                    }
                    dst += length;
                    src_x = 0;
                    available = bw;
                }
            }
            BitmapFormat::Rgb565 => {
                let row = &bitmap.data[(bitmap_y * bw * 2) as usize..];
                while count > 0 {
                    let length = available.min(count);
                    count -= length;
                    for k in 0..length {
                        let i = (src_x + k) as usize * 2;
                        let (r, g, b) = expand565(u16::from_le_bytes([row[i], row[i + 1]]));
                        if alpha == 0xFF {
                            store_px(dest, dst + k, r, g, b);
                        } else {
                            blend_px(dest, dst + k, r, g, b, u32::from(alpha));
                        }
                    }
                    dst += length;
                    src_x = 0;
                    available = bw;
                }
            }
            _ => {}
        }
    }
}

/// Paints pixels looked up in the palette of an L8 bitmap.
#[derive(Debug, Clone, Copy)]
pub struct PainterXrgb8888L8Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterXrgb8888L8Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert_eq!(bitmap.format, BitmapFormat::L8);
        debug_assert!(matches!(
            bitmap.clut.map(|c| c.format),
            Some(ClutFormat::Rgb888) | Some(ClutFormat::Argb8888)
        ));
        PainterXrgb8888L8Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterXrgb8888L8Bitmap<'a> {
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, alpha: u8) {
        let mut bitmap_x = widget_x;
        let mut bitmap_y = widget_y;
        let mut offset = offset;
        let mut count = count;
        if !self.source.adjust(&mut bitmap_x, &mut bitmap_y, &mut offset, &mut count) {
            return;
        }

        let bitmap = &self.source.bitmap;
        let clut = match bitmap.clut {
            Some(clut) => clut,
            None => return,
        };
        let bw = i32::from(bitmap.width);
        let row = &bitmap.data[(bitmap_y * bw) as usize..];
        let mut available = bw - bitmap_x;
        let mut src_x = bitmap_x;
        let mut dst = offset;

        while count > 0 {
            let length = available.min(count);
            count -= length;
            for k in 0..length {
                let index = row[(src_x + k) as usize] as usize;
                match clut.format {
                    ClutFormat::Rgb888 => {
                        let e = index * 3;
                        let (b, g, r) =
                            (clut.entries[e], clut.entries[e + 1], clut.entries[e + 2]);
                        if alpha == 0xFF {
                            store_px(dest, dst + k, r, g, b);
                        } else {
                            blend_px(dest, dst + k, r, g, b, u32::from(alpha));
                        }
                    }
                    ClutFormat::Argb8888 => {
                        let e = index * 4;
                        let entry = u32::from_le_bytes([
                            clut.entries[e],
                            clut.entries[e + 1],
                            clut.entries[e + 2],
                            clut.entries[e + 3],
                        ]);
                        let a = div255(u32::from(alpha) * (entry >> 24));
                        let (r, g, b) = argb_channels(entry);
                        if a == 0xFF {
                            store_px(dest, dst + k, r, g, b);
                        } else if a != 0 {
                            blend_px(dest, dst + k, r, g, b, a);
                        }
                    }
                    ClutFormat::Rgb565 => {}
                }
            }
            dst += length;
            src_x = 0;
            available = bw;
        }
    }
}

/// Paints a linear color gradient.
#[derive(Debug)]
pub struct PainterXrgb8888LinearGradient {
    pub gradient: LinearGradient,
}

impl PainterXrgb8888LinearGradient {
    pub fn new() -> Self {
        PainterXrgb8888LinearGradient {
            gradient: LinearGradient::new(),
        }
    }

    fn paint_flat(&self, dest: &mut [u8], offset: i32, count: i32, color: u32, alpha: u8) {
        let (r, g, b) = argb_channels(color);
        if self.gradient.is_solid && alpha == 0xFF {
            for i in offset..offset + count {
                store_px(dest, i, r, g, b);
            }
        } else {
            let alpha_tot = div255((color >> 24) * u32::from(alpha));
            if alpha_tot == 0 {
                return;
            }
            for i in offset..offset + count {
                blend_px(dest, i, r, g, b, alpha_tot);
            }
        }
    }

    fn paint_ramp(&self, dest: &mut [u8], offset: i32, count: i32, mut color_f: f32, alpha: u8) {
        let delta = self.gradient.delta_color;
        for i in offset..offset + count {
            let color_index = (color_f as i32).clamp(0, 1023);
            let color = self.gradient.texture[color_index as usize];
            let (r, g, b) = argb_channels(color);
            if self.gradient.is_solid && alpha == 0xFF {
                store_px(dest, i, r, g, b);
            } else {
                let alpha_tot = div255((color >> 24) * u32::from(alpha));
                if alpha_tot != 0 {
                    blend_px(dest, i, r, g, b, alpha_tot);
                }
            }
            color_f += delta;
        }
    }
}

impl Default for PainterXrgb8888LinearGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterXrgb8888LinearGradient {
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, alpha: u8) {
        if self.gradient.is_vertical {
            let (color, _) = self.gradient.row_color(widget_y);
            self.paint_flat(dest, offset, count, color, alpha);
            return;
        }

        for piece in self
            .gradient
            .span_pieces(widget_x, widget_y, count)
            .iter()
            .flatten()
        {
            let GradientPiece {
                offset: piece_offset,
                count: piece_count,
                run,
            } = *piece;
            match run {
                GradientRun::Flat(color) => {
                    self.paint_flat(dest, offset + piece_offset, piece_count, color, alpha);
                }
                GradientRun::Ramp { color_f } => {
                    self.paint_ramp(dest, offset + piece_offset, piece_count, color_f, alpha);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(dest: &[u8], i: usize) -> u32 {
        u32::from_le_bytes([dest[i * 4], dest[i * 4 + 1], dest[i * 4 + 2], dest[i * 4 + 3]])
    }

    #[test]
    fn store_zeroes_top_byte() {
        let mut p = PainterXrgb8888::new();
        p.set_color(Rgba8::rgb(255, 0, 0));
        let mut fb = [0xFFu8; 4];
        p.paint(&mut fb, 0, 0, 0, 1, 255);
        assert_eq!(px(&fb, 0), 0x00FF_0000);
    }

    #[test]
    fn blend_zeroes_top_byte() {
        let mut p = PainterXrgb8888::new();
        p.set_color(Rgba8::rgb(255, 0, 0));
        let mut fb = [0xFFu8; 4];
        p.paint(&mut fb, 0, 0, 0, 1, 128);
        let got = px(&fb, 0);
        assert_eq!(got >> 24, 0);
        assert_eq!((got >> 16) & 0xFF, 0xFF, "red over white stays red");
        assert_eq!(got & 0xFF, 127, "blue channel halves");
    }

    #[test]
    fn argb_source_blends_onto_opaque() {
        let bmp_px: Vec<u8> = [0x80FF_FFFFu32].iter().flat_map(|p| p.to_le_bytes()).collect();
        let bitmap = Bitmap::new(BitmapFormat::Argb8888, 1, 1, &bmp_px);
        let painter = PainterXrgb8888Bitmap::new(bitmap);
        let mut fb = [0u8; 4];
        painter.paint(&mut fb, 0, 0, 0, 1, 255);
        let got = px(&fb, 0);
        assert_eq!(got >> 24, 0);
        assert_eq!((got >> 16) & 0xFF, 128);
    }
}
