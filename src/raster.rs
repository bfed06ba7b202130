//! Scanline sweep turning sorted coverage cells into painted spans.
//!
//! The rasterizer owns an [`Outline`] and drives a [`Painter`] over the
//! framebuffer: cells sharing a pixel are merged, a partial pixel is painted
//! from `cover` and `area`, and the gap to the next cell is painted as an
//! interior span from the running cover sum. Pixels left of column zero and
//! right of the render width are skipped here, which is why the outline
//! keeps cells outside those columns.

use crate::cell::CellBuffer;
use crate::math::div255;
use crate::outline::Outline;
use crate::painter::Painter;
use crate::{Error, POLY_BASE_SHIFT};

/// Fraction bits of a coverage value after the sweep.
pub const AA_SHIFT: i32 = 8;
/// Full coverage.
pub const AA_NUM: i32 = 1 << AA_SHIFT;
/// Largest representable alpha.
pub const AA_MASK: i32 = AA_NUM - 1;
/// Twice full coverage, the period of the even-odd rule.
pub const AA_2NUM: i32 = AA_NUM * 2;
/// Mask folding a cover into one even-odd period.
pub const AA_2MASK: i32 = AA_2NUM - 1;

/// How accumulated winding converts to opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillingRule {
    /// Fill anything inside the outermost boundary regardless of winding.
    NonZero,
    /// Alternate between filled and unfilled at each boundary crossing.
    EvenOdd,
}

impl Default for FillingRule {
    fn default() -> Self {
        FillingRule::NonZero
    }
}

/// Convert an accumulated area term into an alpha value `0..=255`.
pub fn calculate_alpha(rule: FillingRule, area: i32) -> u32 {
    let mut cover = area >> (POLY_BASE_SHIFT * 2 + 1 - AA_SHIFT);
    if cover < 0 {
        cover = -cover;
    }
    if rule == FillingRule::EvenOdd {
        cover &= AA_2MASK;
        if cover > AA_NUM {
            cover = AA_2NUM - cover;
        }
    }
    cover.min(AA_MASK) as u32
}

/// Anti-aliased polygon rasterizer bound to one cell arena.
pub struct Rasterizer<'a> {
    outline: Outline<'a>,
    filling_rule: FillingRule,
    offset_x: i32,
    offset_y: i32,
    width: i32,
}

impl<'a> Rasterizer<'a> {
    pub fn new(buffer: &'a mut CellBuffer) -> Self {
        Rasterizer {
            outline: Outline::new(buffer),
            filling_rule: FillingRule::NonZero,
            offset_x: 0,
            offset_y: 0,
            width: 0,
        }
    }

    /// Drop any outline built so far and set the widget coordinates of the
    /// rendered region's top left corner.
    pub fn reset(&mut self, offset_x: i32, offset_y: i32) {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.outline.reset();
    }

    pub fn set_filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    pub fn filling_rule(&self) -> FillingRule {
        self.filling_rule
    }

    /// Bound the rendered region; cells outside `0..height` are discarded
    /// during outline walking, columns outside `0..width` during the sweep.
    pub fn set_max_render(&mut self, width: i32, height: i32) {
        self.width = width;
        self.outline.set_max_render_height(height);
    }

    /// Add a vertex starting a new contour, in 26.5 fixed point.
    pub fn move_to(&mut self, x: i32, y: i32) {
        if !self.outline.was_too_complex() {
            self.outline.move_to(x, y);
        }
    }

    /// Add a contour vertex, in 26.5 fixed point.
    pub fn line_to(&mut self, x: i32, y: i32) {
        if !self.outline.was_too_complex() {
            self.outline.line_to(x, y);
        }
    }

    pub fn was_too_complex(&self) -> bool {
        self.outline.was_too_complex()
    }

    pub fn missing_bytes(&self) -> usize {
        self.outline.missing_bytes()
    }

    /// Sweep the accumulated cells and paint every span.
    ///
    /// `fb` is the whole framebuffer, `base` the byte offset of the pixel at
    /// the top left of the rendered region, `stride` the framebuffer row
    /// pitch and `x_adjust` the sub-byte pixel remainder of that corner for
    /// packed destination formats. Every span alpha is scaled by
    /// `global_alpha` before it reaches the painter.
    ///
    /// When the outline overflowed the cell buffer nothing is painted and
    /// the missing byte count is reported back.
    pub fn render<P: Painter>(
        &mut self,
        painter: &P,
        fb: &mut [u8],
        base: usize,
        stride: usize,
        x_adjust: i32,
        global_alpha: u8,
    ) -> Result<(), Error> {
        let rule = self.filling_rule;
        let width = self.width;
        let offset_x = self.offset_x;
        let offset_y = self.offset_y;

        let too_complex = {
            self.outline.finish();
            self.outline.was_too_complex()
        };
        if too_complex {
            return Err(Error::OutlineTooComplex {
                missing_bytes: self.outline.missing_bytes(),
            });
        }

        let cells = self.outline.finish();
        if cells.is_empty() {
            return Ok(());
        }

        let global_alpha = u32::from(global_alpha);
        let n = cells.len();
        let mut i = 0;
        let mut cover: i32 = 0;
        let mut old_y = i32::from(cells[0].y);
        let mut widget_y = old_y + offset_y;
        let mut row_start = base + old_y as usize * stride;

        while i < n {
            let start_x = i32::from(cells[i].x);
            let y = i32::from(cells[i].y);
            if y != old_y {
                old_y = y;
                widget_y = old_y + offset_y;
                row_start = base + old_y as usize * stride;
            }

            let mut area = i32::from(cells[i].area);
            cover += i32::from(cells[i].cover);
            i += 1;
            // Merge every cell on the same pixel.
            while i < n && i32::from(cells[i].x) == start_x && i32::from(cells[i].y) == y {
                area += i32::from(cells[i].area);
                cover += i32::from(cells[i].cover);
                i += 1;
            }

            let mut x = start_x;
            if area != 0 {
                if x >= 0 && x < width {
                    let alpha = div255(
                        calculate_alpha(rule, (cover << (POLY_BASE_SHIFT + 1)) - area)
                            * global_alpha,
                    );
                    if alpha != 0 {
                        debug_assert!(row_start < fb.len());
                        let row_end = (row_start + stride).min(fb.len());
                        painter.paint(
                            &mut fb[row_start..row_end],
                            x + x_adjust,
                            x + offset_x,
                            widget_y,
                            1,
                            alpha as u8,
                        );
                    }
                }
                x += 1;
            }

            if i >= n {
                break;
            }

            // Interior span up to the next cell. At the end of a scanline the
            // cover sum of a closed outline is zero, so a span computed
            // against the next row's first cell never paints.
            let mut count = i32::from(cells[i].x) - x;
            if count > 0 {
                if x < 0 {
                    count += x;
                    x = 0;
                }
                if count > 0 {
                    if x + count >= width {
                        count = width - x;
                    }
                    if count > 0 {
                        let alpha = div255(
                            calculate_alpha(rule, cover << (POLY_BASE_SHIFT + 1)) * global_alpha,
                        );
                        if alpha != 0 {
                            debug_assert!(row_start < fb.len());
                            let row_end = (row_start + stride).min(fb.len());
                            painter.paint(
                                &mut fb[row_start..row_end],
                                x + x_adjust,
                                x + offset_x,
                                widget_y,
                                count,
                                alpha as u8,
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellBuffer, CELL_SIZE};
    use crate::rect::Rect;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Call {
        offset: i32,
        widget_x: i32,
        widget_y: i32,
        count: i32,
        alpha: u8,
    }

    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<Call>>,
    }

    impl Painter for Recording {
        fn setup(&mut self, _widget_rect: &Rect) -> bool {
            true
        }

        fn paint(
            &self,
            _dest: &mut [u8],
            offset: i32,
            widget_x: i32,
            widget_y: i32,
            count: i32,
            alpha: u8,
        ) {
            self.calls.borrow_mut().push(Call {
                offset,
                widget_x,
                widget_y,
                count,
                alpha,
            });
        }
    }

    fn q5(v: i32) -> i32 {
        v * crate::POLY_BASE_SIZE
    }

    fn square(r: &mut Rasterizer<'_>, x0: i32, y0: i32, x1: i32, y1: i32) {
        r.move_to(q5(x0), q5(y0));
        r.line_to(q5(x1), q5(y0));
        r.line_to(q5(x1), q5(y1));
        r.line_to(q5(x0), q5(y1));
    }

    fn render_into(
        r: &mut Rasterizer<'_>,
        painter: &Recording,
        width: usize,
        height: usize,
        alpha: u8,
    ) -> Result<(), Error> {
        let mut fb = vec![0u8; width * height];
        r.render(painter, &mut fb, 0, width, 0, alpha)
    }

    #[test]
    fn pixel_aligned_square_paints_full_spans() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(5, 7);
        r.set_max_render(10, 10);
        square(&mut r, 0, 0, 3, 2);
        let painter = Recording::default();
        render_into(&mut r, &painter, 10, 10, 255).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 2);
        for (row, call) in calls.iter().enumerate() {
            assert_eq!(call.count, 3);
            assert_eq!(call.alpha, 255);
            assert_eq!(call.widget_x, 5);
            assert_eq!(call.widget_y, 7 + row as i32);
            assert_eq!(call.offset, 0);
        }
    }

    #[test]
    fn x_adjust_shifts_offset_only() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(10, 10);
        square(&mut r, 1, 0, 2, 1);
        let painter = Recording::default();
        let mut fb = vec![0u8; 100];
        r.render(&painter, &mut fb, 0, 10, 3, 255).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].offset, 4);
        assert_eq!(calls[0].widget_x, 1);
    }

    #[test]
    fn half_coverage_splits_between_columns() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(10, 1);
        // One pixel tall, from x=0.5 to x=1.5.
        r.move_to(q5(1) / 2, q5(0));
        r.line_to(q5(3) / 2, q5(0));
        r.line_to(q5(3) / 2, q5(1));
        r.line_to(q5(1) / 2, q5(1));
        let painter = Recording::default();
        render_into(&mut r, &painter, 10, 1, 255).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[0].widget_x, calls[0].alpha), (0, 128));
        assert_eq!((calls[1].widget_x, calls[1].alpha), (1, 128));
    }

    #[test]
    fn even_odd_cancels_double_winding() {
        for (rule, expect_paint) in
            [(FillingRule::NonZero, true), (FillingRule::EvenOdd, false)]
        {
            let mut buf = CellBuffer::new(64 * CELL_SIZE);
            let mut r = Rasterizer::new(&mut buf);
            r.reset(0, 0);
            r.set_max_render(10, 10);
            r.set_filling_rule(rule);
            square(&mut r, 0, 0, 4, 4);
            square(&mut r, 0, 0, 4, 4);
            let painter = Recording::default();
            render_into(&mut r, &painter, 10, 10, 255).unwrap();
            let painted = !painter.calls.borrow().is_empty();
            assert_eq!(painted, expect_paint, "rule {:?}", rule);
        }
    }

    #[test]
    fn global_alpha_scales_spans() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(10, 10);
        square(&mut r, 0, 0, 2, 1);
        let painter = Recording::default();
        render_into(&mut r, &painter, 10, 10, 128).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].alpha, 128);
    }

    #[test]
    fn spans_clip_to_render_width() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(3, 2);
        square(&mut r, 0, 0, 5, 1);
        let painter = Recording::default();
        render_into(&mut r, &painter, 3, 2, 255).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].widget_x, calls[0].count), (0, 3));
    }

    #[test]
    fn spans_clip_left_of_zero() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(10, 2);
        square(&mut r, -2, 0, 2, 1);
        let painter = Recording::default();
        render_into(&mut r, &painter, 10, 2, 255).unwrap();
        let calls = painter.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].widget_x, calls[0].count), (0, 2));
    }

    #[test]
    fn overflow_paints_nothing_and_reports_shortfall() {
        let mut buf = CellBuffer::new(2 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(64, 64);
        r.move_to(q5(0), q5(0));
        r.line_to(q5(40), q5(40));
        r.line_to(q5(0), q5(40));
        let painter = Recording::default();
        let err = render_into(&mut r, &painter, 64, 64, 255).unwrap_err();
        match err {
            Error::OutlineTooComplex { missing_bytes } => assert!(missing_bytes > 0),
        }
        assert!(painter.calls.borrow().is_empty());
    }

    #[test]
    fn empty_outline_renders_nothing() {
        let mut buf = CellBuffer::new(16 * CELL_SIZE);
        let mut r = Rasterizer::new(&mut buf);
        r.reset(0, 0);
        r.set_max_render(10, 10);
        let painter = Recording::default();
        render_into(&mut r, &painter, 10, 10, 255).unwrap();
        assert!(painter.calls.borrow().is_empty());
    }
}
