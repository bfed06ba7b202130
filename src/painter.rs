//! The painter contract and state shared by all painter families.
//!
//! The rasterizer hands every coverage span to a painter, which owns the
//! destination pixel layout. `dest` is the scanline slice starting at the
//! byte that holds the first pixel of the drawn area; `offset` is the pixel
//! position within it, including any sub-byte adjustment for packed
//! formats. `widget_x`/`widget_y` are coordinates relative to the widget,
//! for painters whose color depends on position.

use crate::bitmap::Bitmap;
use crate::rect::Rect;

/// Number of entries in a gradient color table.
pub const GRADIENT_TEXTURE_SIZE: usize = 1024;

/// A color with 8 bits per channel. Solid painters ignore the alpha
/// channel; the alpha of a drawing comes in per span from the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba8 { r, g, b, a }
    }

    /// Fully opaque color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba8 { r, g, b, a: 255 }
    }

    /// Pack as `0xAARRGGBB`.
    pub fn argb32(self) -> u32 {
        (u32::from(self.a) << 24)
            | (u32::from(self.r) << 16)
            | (u32::from(self.g) << 8)
            | u32::from(self.b)
    }

    pub fn from_argb32(v: u32) -> Self {
        Rgba8 {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
            a: (v >> 24) as u8,
        }
    }
}

/// Fills coverage spans into a framebuffer in one specific pixel format.
pub trait Painter {
    /// Called once before each rendered drawing. Returning `false` skips
    /// the drawing entirely.
    fn setup(&mut self, widget_rect: &Rect) -> bool {
        let _ = widget_rect;
        true
    }

    /// Blend `count` pixels starting `offset` pixels into `dest` with the
    /// given span `alpha` (1..=255).
    fn paint(&self, dest: &mut [u8], offset: i32, widget_x: i32, widget_y: i32, count: i32, alpha: u8);

    /// Called after the drawing has been rendered, also when nothing was
    /// painted.
    fn tear_down(&self) {}
}

/// Sampling state shared by the bitmap painters: the source bitmap, an
/// offset moving it inside the widget, and optional tiling.
#[derive(Debug, Clone, Copy)]
pub struct BitmapSource<'a> {
    pub bitmap: Bitmap<'a>,
    x_offset: i16,
    y_offset: i16,
    tiled: bool,
}

impl<'a> BitmapSource<'a> {
    pub fn new(bitmap: Bitmap<'a>) -> Self {
        BitmapSource {
            bitmap,
            x_offset: 0,
            y_offset: 0,
            tiled: false,
        }
    }

    /// Repeat the bitmap in both directions instead of painting it once.
    pub fn set_tiled(&mut self, tiled: bool) {
        self.tiled = tiled;
    }

    pub fn tiled(&self) -> bool {
        self.tiled
    }

    /// Move the sampling position; works for tiled and non-tiled painters.
    pub fn set_offset(&mut self, x: i16, y: i16) {
        self.x_offset = x;
        self.y_offset = y;
    }

    pub fn offset(&self) -> (i16, i16) {
        (self.x_offset, self.y_offset)
    }

    /// Map a span position into bitmap coordinates.
    ///
    /// Tiled sources wrap both coordinates into the bitmap. Non-tiled
    /// sources clip: the span is trimmed on the left (moving `offset`
    /// along), rejected if fully outside, and `count` is capped at the
    /// remainder of the bitmap row. Returns `false` when nothing is left
    /// to paint.
    pub fn adjust(
        &self,
        bitmap_x: &mut i32,
        bitmap_y: &mut i32,
        offset: &mut i32,
        count: &mut i32,
    ) -> bool {
        let w = i32::from(self.bitmap.width);
        let h = i32::from(self.bitmap.height);
        *bitmap_x += i32::from(self.x_offset);
        *bitmap_y += i32::from(self.y_offset);
        if self.tiled {
            *bitmap_x %= w;
            if *bitmap_x < 0 {
                *bitmap_x += w;
            }
            *bitmap_y %= h;
            if *bitmap_y < 0 {
                *bitmap_y += h;
            }
            return true;
        }
        if *bitmap_x < 0 {
            if *bitmap_x + *count <= 0 {
                return false;
            }
            *count += *bitmap_x;
            *offset -= *bitmap_x;
            *bitmap_x = 0;
        }
        if *bitmap_x >= w || *bitmap_y < 0 || *bitmap_y >= h {
            return false;
        }
        if *bitmap_x + *count > w {
            *count = w - *bitmap_x;
        }
        true
    }
}

/// One homogeneous piece of a gradient span.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GradientRun {
    /// Every pixel takes the same texture entry.
    Flat(u32),
    /// The texture index starts at `color_f` and advances by `delta_color`
    /// per pixel.
    Ramp { color_f: f32 },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GradientPiece {
    /// Pixels from the start of the span.
    pub offset: i32,
    pub count: i32,
    pub run: GradientRun,
}

/// Geometry and color table of a linear gradient, shared by the gradient
/// painters of every destination format.
///
/// The color line runs perpendicular to the gradient vector. For each
/// scanline the painter computes where the first and last color lines cross
/// it and splits the span into a flat start piece, a color ramp and a flat
/// end piece; axis-aligned gradients take cheaper paths.
#[derive(Debug)]
pub struct LinearGradient {
    pub(crate) coord0: i16,
    pub(crate) coord1: i16,
    pub(crate) texture: [u32; GRADIENT_TEXTURE_SIZE],
    pub(crate) is_solid: bool,
    pub(crate) is_vertical: bool,
    pub(crate) is_horizontal: bool,
    cl_slope: f32,
    cl_offset: f32,
    horizontal_distance: f32,
    pub(crate) delta_color: f32,
}

impl Default for LinearGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearGradient {
    pub fn new() -> Self {
        LinearGradient {
            coord0: 0,
            coord1: 100,
            texture: [0; GRADIENT_TEXTURE_SIZE],
            is_solid: false,
            is_vertical: false,
            is_horizontal: false,
            cl_slope: 0.0,
            cl_offset: 0.0,
            horizontal_distance: 0.0,
            delta_color: 0.0,
        }
    }

    /// Set the gradient line. The first texture color sits at the start
    /// point, the last at the end point; `width` and `height` are the
    /// dimensions of the widget the line was laid out in.
    pub fn set_end_points(
        &mut self,
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        width: f32,
        height: f32,
    ) {
        self.is_vertical = start_x == end_x;
        self.is_horizontal = start_y == end_y;

        if !self.is_vertical && !self.is_horizontal {
            let cvx = end_x - start_x;
            let cvy = end_y - start_y;

            // The color line direction, normalized through the bounding box
            // so non-square widgets keep the requested angle.
            let cvxbb = cvx / width;
            let cvybb = cvy / height;
            let colorline_dx = -cvybb * width;
            let colorline_dy = cvxbb * height;

            if colorline_dx == 0.0 {
                self.is_horizontal = true;
            } else {
                self.cl_slope = colorline_dy / colorline_dx;
                if self.cl_slope == 0.0 {
                    self.is_vertical = true;
                } else {
                    // First color line passes through the start point.
                    self.cl_offset = start_y - start_x * self.cl_slope;
                    // Horizontal distance between the first and the last
                    // color line; sign encodes the direction.
                    self.horizontal_distance = cvx - cvy / self.cl_slope;
                    self.delta_color = 1024.0 / self.horizontal_distance;
                    if self.horizontal_distance < 0.0 {
                        self.horizontal_distance = -self.horizontal_distance;
                    }
                    return;
                }
            }
        }

        if self.is_vertical {
            self.delta_color = 1023.9999 / (end_y - start_y);
            if start_y < end_y {
                self.coord0 = start_y as i16;
                self.coord1 = end_y as i16;
            } else {
                self.coord0 = end_y as i16;
                self.coord1 = start_y as i16;
            }
        } else if self.is_horizontal {
            self.delta_color = 1023.9999 / (end_x - start_x);
            if start_x < end_x {
                self.coord0 = start_x as i16;
                self.coord1 = end_x as i16;
            } else {
                self.coord0 = end_x as i16;
                self.coord1 = start_x as i16;
            }
            self.horizontal_distance = f32::from(self.coord1 - self.coord0);
        }
    }

    /// Use a prebuilt color table. `solid` declares that all entries are
    /// fully opaque, allowing the painters to store instead of blend.
    pub fn set_texture(&mut self, texture: &[u32; GRADIENT_TEXTURE_SIZE], solid: bool) {
        self.texture = *texture;
        self.is_solid = solid;
    }

    /// Fill the color table with a linear blend from `start` to `end`.
    pub fn set_colors(&mut self, start: Rgba8, end: Rgba8) {
        let last = (GRADIENT_TEXTURE_SIZE - 1) as u32;
        for (i, entry) in self.texture.iter_mut().enumerate() {
            let i = i as u32;
            let mix = |a: u8, b: u8| -> u32 {
                (u32::from(a) * (last - i) + u32::from(b) * i + last / 2) / last
            };
            *entry = (mix(start.a, end.a) << 24)
                | (mix(start.r, end.r) << 16)
                | (mix(start.g, end.g) << 8)
                | mix(start.b, end.b);
        }
        self.is_solid = start.a == 255 && end.a == 255;
    }

    /// Color shared by the whole scanline of a vertical gradient. The flag
    /// is true inside the ramp, where RGB565 painters add dither noise.
    pub(crate) fn row_color(&self, widget_y: i32) -> (u32, bool) {
        if widget_y <= i32::from(self.coord0) {
            (self.texture[if self.delta_color > 0.0 { 0 } else { 1023 }], false)
        } else if widget_y >= i32::from(self.coord1) {
            (self.texture[if self.delta_color > 0.0 { 1023 } else { 0 }], false)
        } else {
            let color_offset = ((widget_y - i32::from(self.coord0)) as f32 * self.delta_color) as i32;
            let index = if self.delta_color > 0.0 {
                color_offset
            } else {
                1023 + color_offset
            };
            (self.texture[index.clamp(0, 1023) as usize], true)
        }
    }

    /// Split a horizontal span into up to three homogeneous pieces.
    /// Returns the pieces in left-to-right order; unused slots are `None`.
    pub(crate) fn span_pieces(
        &self,
        widget_x: i32,
        widget_y: i32,
        count: i32,
    ) -> [Option<GradientPiece>; 3] {
        let mut pieces = [None, None, None];
        let mut next = 0;

        // Where the first color line crosses this scanline.
        let vx0 = if self.is_horizontal {
            f32::from(self.coord0)
        } else {
            let mut vx0 = (widget_y as f32 - self.cl_offset) / self.cl_slope;
            if self.delta_color < 0.0 {
                vx0 -= self.horizontal_distance;
            }
            vx0
        };

        let mut x = widget_x;

        if x as f32 <= vx0 {
            let pixels = (vx0 + 1.0 - x as f32).min(count as f32) as i32;
            pieces[next] = Some(GradientPiece {
                offset: x - widget_x,
                count: pixels,
                run: GradientRun::Flat(
                    self.texture[if self.delta_color > 0.0 { 0 } else { 1023 }],
                ),
            });
            next += 1;
            x += pixels;
        }

        let right = widget_x + count;
        if x < right {
            let vx1 = vx0 + self.horizontal_distance;
            if (x as f32) < vx1 {
                let endx = (right as f32).min(vx1) as i32;
                if endx > x {
                    let base = if self.delta_color > 0.0 { 0.0 } else { 1023.9999 };
                    let color_f = base + (x as f32 - vx0) * self.delta_color;
                    pieces[next] = Some(GradientPiece {
                        offset: x - widget_x,
                        count: endx - x,
                        run: GradientRun::Ramp { color_f },
                    });
                    next += 1;
                }
                x = endx;
            }
            if x < right {
                pieces[next] = Some(GradientPiece {
                    offset: x - widget_x,
                    count: right - x,
                    run: GradientRun::Flat(
                        self.texture[if self.delta_color > 0.0 { 1023 } else { 0 }],
                    ),
                });
            }
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_packing_round_trips() {
        let c = Rgba8::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.argb32(), 0x7812_3456);
        assert_eq!(Rgba8::from_argb32(c.argb32()), c);
        assert_eq!(Rgba8::rgb(1, 2, 3).a, 255);
    }

    #[test]
    fn two_color_table_hits_both_ends() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::rgb(255, 0, 0), Rgba8::rgb(0, 0, 255));
        assert_eq!(g.texture[0], 0xFFFF_0000);
        assert_eq!(g.texture[1023], 0xFF00_00FF);
        assert!(g.is_solid);
        let mid = Rgba8::from_argb32(g.texture[512]);
        assert!(mid.r > 100 && mid.r < 155);
        assert!(mid.b > 100 && mid.b < 155);
    }

    #[test]
    fn translucent_ends_clear_solid_flag() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::new(255, 0, 0, 128), Rgba8::rgb(0, 0, 255));
        assert!(!g.is_solid);
    }

    #[test]
    fn vertical_gradient_clamps_outside_rows() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::rgb(10, 20, 30), Rgba8::rgb(200, 210, 220));
        g.set_end_points(0.0, 10.0, 0.0, 20.0, 40.0, 40.0);
        assert!(g.is_vertical);
        let (top, top_ramp) = g.row_color(0);
        let (bottom, bottom_ramp) = g.row_color(30);
        assert_eq!(top, g.texture[0]);
        assert_eq!(bottom, g.texture[1023]);
        assert!(!top_ramp && !bottom_ramp);
        let (_, mid_ramp) = g.row_color(15);
        assert!(mid_ramp);
    }

    #[test]
    fn reversed_vertical_gradient_swaps_direction() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::rgb(0, 0, 0), Rgba8::rgb(255, 255, 255));
        g.set_end_points(0.0, 20.0, 0.0, 10.0, 40.0, 40.0);
        assert!(g.is_vertical);
        assert!(g.delta_color < 0.0);
        // Rows at or above the start of the ramp take the end color.
        assert_eq!(g.row_color(5).0, g.texture[1023]);
        assert_eq!(g.row_color(25).0, g.texture[0]);
    }

    #[test]
    fn diagonal_span_splits_into_three_pieces() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::rgb(0, 0, 0), Rgba8::rgb(255, 255, 255));
        g.set_end_points(0.0, 0.0, 10.0, 10.0, 10.0, 10.0);
        assert!(!g.is_vertical && !g.is_horizontal);
        let pieces = g.span_pieces(-20, 5, 60);
        let used: Vec<_> = pieces.iter().flatten().collect();
        assert_eq!(used.len(), 3);
        assert!(matches!(used[0].run, GradientRun::Flat(_)));
        assert!(matches!(used[1].run, GradientRun::Ramp { .. }));
        assert!(matches!(used[2].run, GradientRun::Flat(_)));
        let total: i32 = used.iter().map(|p| p.count).sum();
        assert_eq!(total, 60);
        assert_eq!(used[0].offset, 0);
        assert_eq!(used[1].offset, used[0].count);
    }

    #[test]
    fn horizontal_span_right_of_ramp_is_flat_end_color() {
        let mut g = LinearGradient::new();
        g.set_colors(Rgba8::rgb(0, 0, 0), Rgba8::rgb(255, 255, 255));
        g.set_end_points(10.0, 0.0, 20.0, 0.0, 40.0, 40.0);
        assert!(g.is_horizontal);
        let pieces = g.span_pieces(30, 0, 5);
        let used: Vec<_> = pieces.iter().flatten().collect();
        assert_eq!(used.len(), 1);
        match used[0].run {
            GradientRun::Flat(c) => assert_eq!(c, g.texture[1023]),
            GradientRun::Ramp { .. } => panic!("expected flat piece"),
        }
    }
}
