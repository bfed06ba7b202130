//! Painters for RGB565 framebuffers.

use crate::bitmap::{Bitmap, BitmapFormat, ClutFormat};
use crate::math::div255;
use crate::painter::{BitmapSource, GradientPiece, GradientRun, LinearGradient, Painter, Rgba8};

const RMASK: u32 = 0xF800;
const GMASK: u32 = 0x07E0;
const BMASK: u32 = 0x001F;

fn get16(dest: &[u8], ix: i32) -> u16 {
    let i = ix as usize * 2;
    u16::from_le_bytes([dest[i], dest[i + 1]])
}

fn put16(dest: &mut [u8], ix: i32, v: u16) {
    let i = ix as usize * 2;
    dest[i..i + 2].copy_from_slice(&v.to_le_bytes());
}

/// Pack an `0x00RRGGBB` value into 5-6-5.
fn native_color(color: u32) -> u16 {
    (((color >> 8) & RMASK) | ((color >> 5) & GMASK) | ((color >> 3) & BMASK)) as u16
}

fn native_color_from_rgb(r: u8, g: u8, b: u8) -> u16 {
    ((((u32::from(r)) << 8) & RMASK)
        | (((u32::from(g)) << 3) & GMASK)
        | ((u32::from(b) >> 3) & BMASK)) as u16
}

/// Blend pre-masked 5-6-5 components over a framebuffer pixel. Each channel
/// is scaled inside its own mask so no shifting out and back is needed.
fn alpha_blend(r: u32, g: u32, b: u32, bufpix: u16, alpha: u32) -> u16 {
    let ialpha = 0xFF - alpha;
    let buf = u32::from(bufpix);
    ((((r * alpha + (buf & RMASK) * ialpha) / 255) & RMASK)
        | (((g * alpha + (buf & GMASK) * ialpha) / 255) & GMASK)
        | (((b * alpha + (buf & BMASK) * ialpha) / 255) & BMASK)) as u16
}

fn masks_from_argb(color: u32) -> (u32, u32, u32) {
    ((color >> 8) & RMASK, (color >> 5) & GMASK, (color >> 3) & BMASK)
}

/// Pseudo random pattern used for dithering gradients.
fn random(x: i32, y: i32) -> u16 {
    let a = 15_485_863i64.wrapping_mul(i64::from(x) * i64::from(y));
    let v = a.wrapping_mul(a).wrapping_mul(a) % 2_038_074_743;
    (v & 0xFFFF) as u16
}

/// Quantization noise for gradient ramps; without it the 5 and 6 bit
/// channels show visible banding.
fn apply_noise(x: i32, y: i32, mut r: u8, mut g: u8, mut b: u8) -> u16 {
    let rounding = random(x, y);
    if r < 0xF8 {
        r += (rounding & 7) as u8;
    }
    if g < 0xFC {
        g += ((rounding >> 3) & 3) as u8;
    }
    if b < 0xF8 {
        b += ((rounding >> 5) & 7) as u8;
    }
    native_color_from_rgb(r, g, b)
}

/// Paints one solid color.
#[derive(Debug, Clone, Copy)]
pub struct PainterRgb565 {
    color: u16,
    red: u32,
    green: u32,
    blue: u32,
}

impl PainterRgb565 {
    pub fn new() -> Self {
        let mut p = PainterRgb565 {
            color: 0,
            red: 0,
            green: 0,
            blue: 0,
        };
        p.set_color(Rgba8::rgb(0, 0, 0));
        p
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.color = native_color_from_rgb(color.r, color.g, color.b);
        self.red = u32::from(self.color) & RMASK;
        self.green = u32::from(self.color) & GMASK;
        self.blue = u32::from(self.color) & BMASK;
    }
}

impl Default for PainterRgb565 {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterRgb565 {
    fn paint(&self, dest: &mut [u8], offset: i32, _widget_x: i32, _widget_y: i32, count: i32, alpha: u8) {
        if alpha == 0xFF {
            for i in offset..offset + count {
                put16(dest, i, self.color);
            }
        } else {
            let alpha = u32::from(alpha);
            for i in offset..offset + count {
                let blended = alpha_blend(self.red, self.green, self.blue, get16(dest, i), alpha);
                put16(dest, i, blended);
            }
        }
    }
}

/// Paints pixels sampled from an RGB565 or ARGB8888 bitmap.
#[derive(Debug, Clone, Copy)]
pub struct PainterRgb565Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterRgb565Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert!(matches!(
            bitmap.format,
            BitmapFormat::Rgb565 | BitmapFormat::Argb8888
        ));
        PainterRgb565Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterRgb565Bitmap<'a> {
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
            BitmapFormat::Rgb565 => {
                let row = &bitmap.data[(bitmap_y * bw * 2) as usize..];
                // RGB565 carries no alpha of its own; it lives in a separate
                // 8 bit plane when the bitmap has one.
                let alpha_row = bitmap
                    .alpha_plane
                    .map(|plane| &plane[(bitmap_y * bw) as usize..]);
                while count > 0 {
                    let length = available.min(count);
                    count -= length;
                    for k in 0..length {
                        let srcpix = get16(row, src_x + k);
                        let a = match alpha_row {
                            Some(plane) => {
                                div255(u32::from(alpha) * u32::from(plane[(src_x + k) as usize]))
                            }
                            None => u32::from(alpha),
                        };
                        if a == 0xFF {
                            put16(dest, dst + k, srcpix);
                        } else if a != 0 {
                            let s = u32::from(srcpix);
                            let blended = alpha_blend(
                                s & RMASK,
                                s & GMASK,
                                s & BMASK,
                                get16(dest, dst + k),
                                a,
                            );
                            put16(dest, dst + k, blended);
                        }
                    }
                    dst += length;
                    src_x = 0;
                    available = bw;
                }
            }
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
                        if a == 0xFF {
                            put16(dest, dst + k, native_color(srcpix));
                        } else if a != 0 {
                            let (r, g, b) = masks_from_argb(srcpix);
                            let blended = alpha_blend(r, g, b, get16(dest, dst + k), a);
                            put16(dest, dst + k, blended);
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
pub struct PainterRgb565L8Bitmap<'a> {
    pub source: BitmapSource<'a>,
}

impl<'a> PainterRgb565L8Bitmap<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        debug_assert_eq!(bitmap.format, BitmapFormat::L8);
        debug_assert!(bitmap.clut.is_some());
        PainterRgb565L8Bitmap {
            source: BitmapSource::new(bitmap),
        }
    }
}

impl<'a> Painter for PainterRgb565L8Bitmap<'a> {
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
                    ClutFormat::Rgb565 => {
                        let entry = get16(clut.entries, index as i32);
                        if alpha == 0xFF {
                            put16(dest, dst + k, entry);
                        } else {
                            let e = u32::from(entry);
                            let blended = alpha_blend(
                                e & RMASK,
                                e & GMASK,
                                e & BMASK,
                                get16(dest, dst + k),
                                u32::from(alpha),
                            );
                            put16(dest, dst + k, blended);
                        }
                    }
                    ClutFormat::Rgb888 => {
                        // Entries are stored B, G, R.
                        let e = index * 3;
                        let (b, g, r) =
                            (clut.entries[e], clut.entries[e + 1], clut.entries[e + 2]);
                        if alpha == 0xFF {
                            put16(dest, dst + k, native_color_from_rgb(r, g, b));
                        } else {
                            let blended = alpha_blend(
                                (u32::from(r) << 8) & RMASK,
                                (u32::from(g) << 3) & GMASK,
                                u32::from(b) >> 3,
                                get16(dest, dst + k),
                                u32::from(alpha),
                            );
                            put16(dest, dst + k, blended);
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
                        if a == 0xFF {
                            put16(dest, dst + k, native_color(entry));
                        } else if a != 0 {
                            let (r, g, b) = masks_from_argb(entry);
                            let blended = alpha_blend(r, g, b, get16(dest, dst + k), a);
                            put16(dest, dst + k, blended);
                        }
                    }
                }
            }
            dst += length;
            src_x = 0;
            available = bw;
        }
    }
}

/// Paints a linear color gradient, dithered to hide 5-6-5 banding.
#[derive(Debug)]
pub struct PainterRgb565LinearGradient {
    pub gradient: LinearGradient,
}

impl PainterRgb565LinearGradient {
    pub fn new() -> Self {
        PainterRgb565LinearGradient {
            gradient: LinearGradient::new(),
        }
    }

    fn paint_flat(&self, dest: &mut [u8], offset: i32, count: i32, color: u32, alpha: u8, noise: Option<(i32, i32)>) {
        if self.gradient.is_solid && alpha == 0xFF {
            if let Some((x0, y)) = noise {
                let b = (color & 0xFF) as u8;
                let g = ((color >> 8) & 0xFF) as u8;
                let r = ((color >> 16) & 0xFF) as u8;
                let mut x = x0;
                for i in offset..offset + count {
                    put16(dest, i, apply_noise(x, y, r, g, b));
                    x += 1;
                }
            } else {
                let native = native_color(color);
                for i in offset..offset + count {
                    put16(dest, i, native);
                }
            }
        } else {
            let a = (color >> 24) & 0xFF;
            let alpha_tot = div255(a * u32::from(alpha));
            if alpha_tot == 0 {
                return;
            }
            let (r, g, b) = masks_from_argb(color);
            for i in offset..offset + count {
                let blended = alpha_blend(r, g, b, get16(dest, i), alpha_tot);
                put16(dest, i, blended);
            }
        }
    }

    fn paint_ramp(&self, dest: &mut [u8], offset: i32, count: i32, mut color_f: f32, widget_y: i32, alpha: u8) {
        let delta = self.gradient.delta_color;
        if self.gradient.is_solid && alpha == 0xFF {
            for i in offset..offset + count {
                // The clamp covers float rounding at the last ramp pixel.
                let color_index = (color_f as i32).clamp(0, 1023);
                let color = self.gradient.texture[color_index as usize];
                let b = (color & 0xFF) as u8;
                let g = ((color >> 8) & 0xFF) as u8;
                let r = ((color >> 16) & 0xFF) as u8;
                put16(dest, i, apply_noise(color_index, widget_y, r, g, b));
                color_f += delta;
            }
        } else {
            for i in offset..offset + count {
                let color_index = (color_f as i32).clamp(0, 1023);
                let color = self.gradient.texture[color_index as usize];
                let alpha_tot = div255((color >> 24) * u32::from(alpha));
                if alpha_tot != 0 {
                    let (r, g, b) = masks_from_argb(color);
                    let blended = alpha_blend(r, g, b, get16(dest, i), alpha_tot);
                    put16(dest, i, blended);
                }
                color_f += delta;
            }
        }
    }
}

impl Default for PainterRgb565LinearGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for PainterRgb565LinearGradient {
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, alpha: u8) {
        if self.gradient.is_vertical {
            let (color, in_ramp) = self.gradient.row_color(widget_y);
            let noise = if in_ramp {
                Some((widget_x, widget_y))
            } else {
                None
            };
            self.paint_flat(dest, offset, count, color, alpha, noise);
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
                    self.paint_flat(dest, offset + piece_offset, piece_count, color, alpha, None);
                }
                GradientRun::Ramp { color_f } => {
                    self.paint_ramp(dest, offset + piece_offset, piece_count, color_f, widget_y, alpha);
                }
            }
        }
    }
}
