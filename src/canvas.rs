//! The pen interface shapes draw through.
//!
//! A [`Canvas`] binds a cell arena, a [`Surface`] and a painter for the
//! duration of one drawing. Pen coordinates are relative to the canvas
//! area; the canvas translates them into the invalidated region, elides
//! path segments that cannot affect it and feeds the rest to the
//! rasterizer. `render` sweeps the outline and blends it into the surface.

use std::f32::consts::PI;

use crate::cell::CellBuffer;
use crate::fixed::Q5;
use crate::math::div255;
use crate::painter::Painter;
use crate::raster::{FillingRule, Rasterizer};
use crate::rect::Rect;
use crate::surface::{PixelFormat, Surface};
use crate::Error;

const POINT_IS_ABOVE: u8 = 1 << 0;
const POINT_IS_BELOW: u8 = 1 << 1;
const POINT_IS_LEFT: u8 = 1 << 2;
const POINT_IS_RIGHT: u8 = 1 << 3;

const CURVE_COLLINEARITY_EPSILON: f32 = 1e-10;
const CURVE_RECURSION_LIMIT: u32 = 8;
const DISTANCE_TOLERANCE: f32 = 0.25;
const ANGLE_TOLERANCE: f32 = 0.1;

/// Pen-based drawing bound to a surface, a painter and a cell arena.
pub struct Canvas<'a, 'b, F: PixelFormat, P: Painter> {
    painter: &'a mut P,
    surface: &'a mut Surface<'b, F>,
    rasterizer: Rasterizer<'a>,
    canvas_alpha: u8,
    dirty_absolute: Rect,

    // Invalidated area in Q5, relative to the canvas area.
    invalidated_x: Q5,
    invalidated_y: Q5,
    invalidated_width: Q5,
    invalidated_height: Q5,

    // Pen state for eliding segments outside the invalidated area.
    is_pen_down: bool,
    was_pen_down: bool,
    previous_x: Q5,
    previous_y: Q5,
    previous_outside: u8,
    pen_down_outside: u8,
    initial_move_to_x: Q5,
    initial_move_to_y: Q5,
}

impl<'a, 'b, F: PixelFormat, P: Painter> Canvas<'a, 'b, F, P> {
    /// Prepare for drawing the invalidated part of a canvas area.
    ///
    /// `canvas_area` positions the drawing in surface coordinates;
    /// `invalidated_area` is relative to it and bounds everything this
    /// canvas will touch.
    pub fn new(
        cells: &'a mut CellBuffer,
        surface: &'a mut Surface<'b, F>,
        painter: &'a mut P,
        canvas_area: Rect,
        invalidated_area: Rect,
        alpha: u8,
    ) -> Self {
        debug_assert_eq!(
            Rect::new(0, 0, canvas_area.width, canvas_area.height).intersection(&invalidated_area),
            invalidated_area,
            "invalidated area must lie inside the canvas area"
        );
        let dirty_absolute = Rect::new(
            canvas_area.x + invalidated_area.x,
            canvas_area.y + invalidated_area.y,
            invalidated_area.width,
            invalidated_area.height,
        );

        let mut rasterizer = Rasterizer::new(cells);
        rasterizer.reset(
            i32::from(invalidated_area.x),
            i32::from(invalidated_area.y),
        );
        rasterizer.set_max_render(
            i32::from(invalidated_area.width),
            i32::from(invalidated_area.height),
        );

        Canvas {
            painter,
            surface,
            rasterizer,
            canvas_alpha: alpha,
            dirty_absolute,
            invalidated_x: Q5::from(i32::from(invalidated_area.x)),
            invalidated_y: Q5::from(i32::from(invalidated_area.y)),
            invalidated_width: Q5::from(i32::from(invalidated_area.width)),
            invalidated_height: Q5::from(i32::from(invalidated_area.height)),
            is_pen_down: false,
            was_pen_down: false,
            previous_x: Q5::default(),
            previous_y: Q5::default(),
            previous_outside: 0,
            pen_down_outside: 0,
            initial_move_to_x: Q5::default(),
            initial_move_to_y: Q5::default(),
        }
    }

    pub fn set_filling_rule(&mut self, rule: FillingRule) {
        self.rasterizer.set_filling_rule(rule);
    }

    pub fn filling_rule(&self) -> FillingRule {
        self.rasterizer.filling_rule()
    }

    /// Move the pen without drawing, starting a new figure. A pen position
    /// outside the invalidated area is only remembered; the rasterizer
    /// hears about it when a later segment comes back inside.
    pub fn move_to<T: Into<Q5>>(&mut self, x: T, y: T) {
        self.move_to_q5(x.into(), y.into());
    }

    /// Draw a line from the current pen position. Segments that stay
    /// outside the invalidated area on one side are elided.
    pub fn line_to<T: Into<Q5>>(&mut self, x: T, y: T) {
        self.line_to_q5(x.into(), y.into());
    }

    /// Flatten a quadratic bezier from `(x0, y0)` via the control point to
    /// `(x, y)` into line segments.
    pub fn quadratic_bezier_to(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, x: f32, y: f32) {
        self.recursive_quadratic_bezier(x0, y0, x1, y1, x, y, 0);
        self.line_to(x, y);
    }

    /// Flatten a cubic bezier from `(x0, y0)` via two control points to
    /// `(x, y)` into line segments.
    #[allow(clippy::too_many_arguments)]
    pub fn cubic_bezier_to(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    ) {
        self.recursive_cubic_bezier(x0, y0, x1, y1, x2, y2, x, y, 0);
        self.line_to(x, y);
    }

    /// Close the current figure. Returns `false` when the outline has
    /// already overflowed the cell arena.
    pub fn close(&mut self) -> bool {
        if self.is_pen_down {
            if self.previous_outside & self.pen_down_outside != 0 {
                // The figure ends outside on the side where the pen went
                // down; the rasterizer's own closing edge covers it.
            } else {
                if self.previous_outside != 0 {
                    self.rasterizer
                        .line_to(self.previous_x.raw(), self.previous_y.raw());
                }
                self.rasterizer
                    .line_to(self.initial_move_to_x.raw(), self.initial_move_to_y.raw());
            }
        }
        self.is_pen_down = false;
        !self.rasterizer.was_too_complex()
    }

    pub fn was_outline_too_complex(&self) -> bool {
        self.rasterizer.was_too_complex()
    }

    /// Close the outline, sweep it and paint. `custom_alpha` is combined
    /// with the canvas alpha; zero alpha or an untouched pen draw nothing
    /// and succeed. The painter is torn down on every path, including
    /// failure, so one `setup` always pairs with one `tear_down`.
    pub fn render(&mut self, custom_alpha: u8) -> Result<(), Error> {
        let result = self.render_painter(custom_alpha);
        self.painter.tear_down();
        result
    }

    fn render_painter(&mut self, custom_alpha: u8) -> Result<(), Error> {
        let alpha = div255(u32::from(self.canvas_alpha) * u32::from(custom_alpha)) as u8;
        if alpha == 0 || !self.was_pen_down {
            return Ok(());
        }

        if !self.close() {
            return Err(Error::OutlineTooComplex {
                missing_bytes: self.rasterizer.missing_bytes(),
            });
        }

        let x = i32::from(self.dirty_absolute.x);
        let y = i32::from(self.dirty_absolute.y);
        let base = self.surface.base_offset(x, y);
        let x_adjust = self.surface.x_adjust(x);
        let stride = self.surface.stride();

        self.rasterizer.render(
            &*self.painter,
            self.surface.data_mut(),
            base,
            stride,
            x_adjust,
            alpha,
        )
    }

    fn move_to_q5(&mut self, x: Q5, y: Q5) {
        if self.is_pen_down && !self.close() {
            return;
        }

        let x = x - self.invalidated_x;
        let y = y - self.invalidated_y;

        let outside = self.is_outside(x, y);
        if outside != 0 {
            self.is_pen_down = false;
        } else {
            self.pen_down_outside = outside;
            self.rasterizer.move_to(x.raw(), y.raw());
            self.is_pen_down = true;
            self.was_pen_down = true;
        }

        self.initial_move_to_x = x;
        self.initial_move_to_y = y;
        self.previous_x = x;
        self.previous_y = y;
        self.previous_outside = outside;
    }

    fn line_to_q5(&mut self, x: Q5, y: Q5) {
        let x = x - self.invalidated_x;
        let y = y - self.invalidated_y;

        let mut outside = self.is_outside(x, y);

        if self.previous_outside == 0 {
            self.rasterizer.line_to(x.raw(), y.raw());
        } else if outside == 0 || (self.previous_outside & outside) == 0 {
            // Inside again, or outside on another side: the elided run
            // ends here and the remembered point anchors the path.
            if !self.is_pen_down {
                self.pen_down_outside = self.previous_outside;
                self.rasterizer
                    .move_to(self.previous_x.raw(), self.previous_y.raw());
                self.is_pen_down = true;
                self.was_pen_down = true;
            } else {
                self.rasterizer
                    .line_to(self.previous_x.raw(), self.previous_y.raw());
            }
            self.rasterizer.line_to(x.raw(), y.raw());
        } else {
            // Stays outside; narrow to the sides shared with the run so
            // a later crossing is detected against all of them.
            outside &= self.previous_outside;
        }

        self.previous_x = x;
        self.previous_y = y;
        self.previous_outside = outside;
    }

    fn is_outside(&self, x: Q5, y: Q5) -> u8 {
        let zero = Q5::from_raw(0);
        (if y < zero {
            POINT_IS_ABOVE
        } else if y >= self.invalidated_height {
            POINT_IS_BELOW
        } else {
            0
        }) | (if x < zero {
            POINT_IS_LEFT
        } else if x >= self.invalidated_width {
            POINT_IS_RIGHT
        } else {
            0
        })
    }

    fn recursive_quadratic_bezier(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let mut dx = x3 - x1;
        let mut dy = y3 - y1;
        let d = ((x2 - x3) * dy - (y2 - y3) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= DISTANCE_TOLERANCE * (dx * dx + dy * dy) {
                let mut da = ((y3 - y2).atan2(x3 - x2) - (y2 - y1).atan2(x2 - x1)).abs();
                if da >= PI {
                    da = 2.0 * PI - da;
                }
                if da < ANGLE_TOLERANCE {
                    self.line_to(x123, y123);
                    return;
                }
            }
        } else {
            dx = x123 - (x1 + x3) / 2.0;
            dy = y123 - (y1 + y3) / 2.0;
            if dx * dx + dy * dy <= DISTANCE_TOLERANCE {
                self.line_to(x123, y123);
                return;
            }
        }

        self.recursive_quadratic_bezier(x1, y1, x12, y12, x123, y123, level + 1);
        self.recursive_quadratic_bezier(x123, y123, x23, y23, x3, y3, level + 1);
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_cubic_bezier(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        x4: f32,
        y4: f32,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x34 = (x3 + x4) / 2.0;
        let y34 = (y3 + y4) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        // The first level always subdivides.
        if level > 0 {
            let mut dx = x4 - x1;
            let mut dy = y4 - y1;

            let d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
            let d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

            if d2 > CURVE_COLLINEARITY_EPSILON && d3 > CURVE_COLLINEARITY_EPSILON {
                if (d2 + d3) * (d2 + d3) <= DISTANCE_TOLERANCE * (dx * dx + dy * dy) {
                    let a23 = (y3 - y2).atan2(x3 - x2);
                    let mut da1 = (a23 - (y2 - y1).atan2(x2 - x1)).abs();
                    let mut da2 = ((y4 - y3).atan2(x4 - x3) - a23).abs();
                    if da1 >= PI {
                        da1 = 2.0 * PI - da1;
                    }
                    if da2 >= PI {
                        da2 = 2.0 * PI - da2;
                    }
                    if da1 + da2 < ANGLE_TOLERANCE {
                        self.line_to(x1234, y1234);
                        return;
                    }
                }
            } else if d2 > CURVE_COLLINEARITY_EPSILON {
                // Control point 3 sits on the chord.
                if d2 * d2 <= DISTANCE_TOLERANCE * (dx * dx + dy * dy) {
                    let mut da1 = ((y3 - y2).atan2(x3 - x2) - (y2 - y1).atan2(x2 - x1)).abs();
                    if da1 >= PI {
                        da1 = 2.0 * PI - da1;
                    }
                    if da1 < ANGLE_TOLERANCE {
                        self.line_to(x2, y2);
                        self.line_to(x3, y3);
                        return;
                    }
                }
            } else if d3 > CURVE_COLLINEARITY_EPSILON {
                // Control point 2 sits on the chord.
                if d3 * d3 <= DISTANCE_TOLERANCE * (dx * dx + dy * dy) {
                    let mut da1 = ((y4 - y3).atan2(x4 - x3) - (y3 - y2).atan2(x3 - x2)).abs();
                    if da1 >= PI {
                        da1 = 2.0 * PI - da1;
                    }
                    if da1 < ANGLE_TOLERANCE {
                        self.line_to(x2, y2);
                        self.line_to(x3, y3);
                        return;
                    }
                }
            } else {
                // Fully collinear.
                dx = x1234 - (x1 + x4) / 2.0;
                dy = y1234 - (y1 + y4) / 2.0;
                if dx * dx + dy * dy <= DISTANCE_TOLERANCE {
                    self.line_to(x1234, y1234);
                    return;
                }
            }
        }

        self.recursive_cubic_bezier(x1, y1, x12, y12, x123, y123, x1234, y1234, level + 1);
        self.recursive_cubic_bezier(x1234, y1234, x234, y234, x34, y34, x4, y4, level + 1);
    }
}
