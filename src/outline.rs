//! Incremental outline to coverage-cell conversion.
//!
//! Accepts polygon vertices in 26.5 fixed point and walks every edge with an
//! integer DDA, accumulating one [`Cell`] per pixel the edge passes through.
//! Cells go into a caller-owned [`CellBuffer`]; when it fills up the walk
//! keeps counting what it could not store so the caller can size a retry.
//!
//! Cells are only registered for scanlines inside `0..max_render_height`.
//! Columns are not clipped here; the sweep in
//! [`raster`](crate::raster) handles horizontal limits and needs cells
//! outside them to keep running the cover sum.

use crate::cell::{Cell, CellBuffer, CELL_SIZE};
use crate::{POLY_BASE_MASK, POLY_BASE_SHIFT, POLY_BASE_SIZE};

const COORD_SENTINEL: i32 = 0x7FFF;

/// Edge walker writing coverage cells into a borrowed [`CellBuffer`].
pub struct Outline<'a> {
    buf: &'a mut CellBuffer,
    cur: Cell,
    close_x: i32,
    close_y: i32,
    cur_x: i32,
    cur_y: i32,
    max_render_height: i32,
    dropped: usize,
    needs_close: bool,
    sorted: bool,
}

impl<'a> Outline<'a> {
    pub fn new(buf: &'a mut CellBuffer) -> Self {
        buf.clear();
        let mut cur = Cell::new();
        cur.set(COORD_SENTINEL, COORD_SENTINEL, 0, 0);
        Outline {
            buf,
            cur,
            close_x: 0,
            close_y: 0,
            cur_x: 0,
            cur_y: 0,
            max_render_height: 0,
            dropped: 0,
            needs_close: false,
            sorted: false,
        }
    }

    /// Discard all cells and start a fresh outline.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.cur.set(COORD_SENTINEL, COORD_SENTINEL, 0, 0);
        self.dropped = 0;
        self.needs_close = false;
        self.sorted = false;
    }

    /// Scanlines at or beyond `height` are discarded as they are produced.
    pub fn set_max_render_height(&mut self, height: i32) {
        self.max_render_height = height;
    }

    /// True when at least one cell did not fit in the buffer.
    pub fn was_too_complex(&self) -> bool {
        self.dropped > 0
    }

    /// Additional bytes the buffer would have needed for the current outline.
    pub fn missing_bytes(&self) -> usize {
        self.dropped * CELL_SIZE
    }

    /// Start a new contour at `(x, y)`, closing any open one first.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.close_if_open();
        self.set_cur_cell(x >> POLY_BASE_SHIFT, y >> POLY_BASE_SHIFT);
        self.close_x = x;
        self.close_y = y;
        self.cur_x = x;
        self.cur_y = y;
    }

    /// Extend the current contour with an edge to `(x, y)`.
    pub fn line_to(&mut self, x: i32, y: i32) {
        self.render_line(self.cur_x, self.cur_y, x, y);
        self.cur_x = x;
        self.cur_y = y;
        self.needs_close = true;
    }

    /// Draw the implicit edge back to the contour start.
    pub fn close_if_open(&mut self) {
        if self.needs_close {
            self.render_line(self.cur_x, self.cur_y, self.close_x, self.close_y);
            self.cur_x = self.close_x;
            self.cur_y = self.close_y;
            self.needs_close = false;
        }
    }

    /// Close the outline, flush the working cell and hand back all cells
    /// ordered by scanline, then column.
    pub fn finish(&mut self) -> &[Cell] {
        if !self.sorted {
            self.close_if_open();
            self.flush_cur_cell();
            self.buf.sort();
            self.buf.note_usage();
            self.sorted = true;
        }
        self.buf.cells()
    }

    fn flush_cur_cell(&mut self) {
        if self.cur.has_cover() {
            let y = i32::from(self.cur.y);
            if y >= 0 && y < self.max_render_height && !self.buf.try_push(self.cur) {
                self.dropped += 1;
            }
        }
        self.cur.set_cover(0, 0);
    }

    fn set_cur_cell(&mut self, x: i32, y: i32) {
        if i32::from(self.cur.x) != x || i32::from(self.cur.y) != y {
            self.flush_cur_cell();
            self.cur.set(x, y, 0, 0);
        }
    }

    /// Accumulate coverage for a run that stays within scanline `ey`.
    /// `y1` and `y2` are subpixel fractions within the scanline.
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> POLY_BASE_SHIFT;
        let ex2 = x2 >> POLY_BASE_SHIFT;
        let fx1 = x1 & POLY_BASE_MASK;
        let fx2 = x2 & POLY_BASE_MASK;

        // Flat run contributes no cover, only reposition.
        if y1 == y2 {
            self.set_cur_cell(ex2, ey);
            return;
        }

        // Run confined to a single cell.
        if ex1 == ex2 {
            let delta = y2 - y1;
            self.cur.add_cover(delta, (fx1 + fx2) * delta);
            return;
        }

        // The run crosses cell borders; distribute cover with a DDA.
        let (mut p, first, incr, dx) = if x2 - x1 < 0 {
            (fx1 * (y2 - y1), 0, -1, x1 - x2)
        } else {
            ((POLY_BASE_SIZE - fx1) * (y2 - y1), POLY_BASE_SIZE, 1, x2 - x1)
        };
        let mut delta = p / dx;
        let mut xmod = p % dx;
        if xmod < 0 {
            delta -= 1;
            xmod += dx;
        }
        self.cur.add_cover(delta, (fx1 + first) * delta);

        let mut ex1 = ex1 + incr;
        self.set_cur_cell(ex1, ey);
        let mut y1 = y1 + delta;

        if ex1 != ex2 {
            p = POLY_BASE_SIZE * (y2 - y1 + delta);
            let mut lift = p / dx;
            let mut rem = p % dx;
            if rem < 0 {
                lift -= 1;
                rem += dx;
            }
            xmod -= dx;

            while ex1 != ex2 {
                delta = lift;
                xmod += rem;
                if xmod >= 0 {
                    xmod -= dx;
                    delta += 1;
                }
                self.cur.add_cover(delta, POLY_BASE_SIZE * delta);
                y1 += delta;
                ex1 += incr;
                self.set_cur_cell(ex1, ey);
            }
        }
        delta = y2 - y1;
        self.cur
            .add_cover(delta, (fx2 + POLY_BASE_SIZE - first) * delta);
    }

    fn render_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx_limit = 16384 << POLY_BASE_SHIFT;
        let dx = x2 - x1;

        // Keep the fixed point products below from overflowing.
        if dx >= dx_limit || dx <= -dx_limit {
            let cx = (x1 + x2) / 2;
            let cy = (y1 + y2) / 2;
            self.render_line(x1, y1, cx, cy);
            self.render_line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 - y1;
        let ey1 = y1 >> POLY_BASE_SHIFT;
        let ey2 = y2 >> POLY_BASE_SHIFT;
        let fy1 = y1 & POLY_BASE_MASK;
        let fy2 = y2 & POLY_BASE_MASK;

        self.set_cur_cell(x1 >> POLY_BASE_SHIFT, ey1);

        // Everything on a single scanline.
        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        // Vertical line: each crossed scanline gets the same contribution.
        if dx == 0 {
            let ex = x1 >> POLY_BASE_SHIFT;
            let two_fx = (x1 - (ex << POLY_BASE_SHIFT)) << 1;

            let (first, incr) = if dy < 0 { (0, -1) } else { (POLY_BASE_SIZE, 1) };
            let mut delta = first - fy1;
            self.cur.add_cover(delta, two_fx * delta);

            let mut ey1 = ey1 + incr;
            self.set_cur_cell(ex, ey1);
            delta = first + first - POLY_BASE_SIZE;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.cur.set_cover(delta, area);
                ey1 += incr;
                self.set_cur_cell(ex, ey1);
            }
            delta = fy2 - POLY_BASE_SIZE + first;
            self.cur.add_cover(delta, two_fx * delta);
            return;
        }

        // General case: one horizontal run per scanline crossed.
        let (p, first, incr, dy) = if dy < 0 {
            (fy1 * dx, 0, -1, -dy)
        } else {
            ((POLY_BASE_SIZE - fy1) * dx, POLY_BASE_SIZE, 1, dy)
        };
        let mut delta = p / dy;
        let mut xmod = p % dy;
        if xmod < 0 {
            delta -= 1;
            xmod += dy;
        }
        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);

        let mut ey1 = ey1 + incr;
        self.set_cur_cell(x_from >> POLY_BASE_SHIFT, ey1);

        if ey1 != ey2 {
            let p = POLY_BASE_SIZE * dx;
            let mut lift = p / dy;
            let mut rem = p % dy;
            if rem < 0 {
                lift -= 1;
                rem += dy;
            }
            xmod -= dy;
            while ey1 != ey2 {
                delta = lift;
                xmod += rem;
                if xmod >= 0 {
                    xmod -= dy;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, POLY_BASE_SIZE - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_cur_cell(x_from >> POLY_BASE_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, POLY_BASE_SIZE - first, x2, fy2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q5(v: i32) -> i32 {
        v * POLY_BASE_SIZE
    }

    #[test]
    fn unit_square_produces_balanced_cover() {
        let mut buf = CellBuffer::new(16 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(4);
        outline.move_to(q5(0), q5(0));
        outline.line_to(q5(1), q5(0));
        outline.line_to(q5(1), q5(1));
        outline.line_to(q5(0), q5(1));
        let cells = outline.finish().to_vec();

        // Pixel-aligned edges leave only the two vertical crossings.
        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].x, cells[0].y), (0, 0));
        assert_eq!((cells[1].x, cells[1].y), (1, 0));
        assert_eq!(i32::from(cells[0].cover) + i32::from(cells[1].cover), 0);
        assert_eq!(
            i32::from(cells[0].cover).abs(),
            POLY_BASE_SIZE,
            "full-height crossing covers the whole scanline"
        );
    }

    #[test]
    fn scanlines_outside_limit_are_dropped() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(2);
        // A tall rectangle from y=-2 to y=4; only rows 0 and 1 may remain.
        outline.move_to(q5(0), q5(-2));
        outline.line_to(q5(1), q5(-2));
        outline.line_to(q5(1), q5(4));
        outline.line_to(q5(0), q5(4));
        let cells = outline.finish();
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|c| c.y == 0 || c.y == 1));
        // Vertical clipping is not an overflow.
        assert_eq!(outline.missing_bytes(), 0);
    }

    #[test]
    fn negative_columns_are_kept() {
        let mut buf = CellBuffer::new(64 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(4);
        outline.move_to(q5(-2), q5(0));
        outline.line_to(q5(2), q5(0));
        outline.line_to(q5(2), q5(1));
        outline.line_to(q5(-2), q5(1));
        let cells = outline.finish();
        assert!(cells.iter().any(|c| c.x < 0));
    }

    #[test]
    fn overflow_reports_missing_bytes() {
        let mut buf = CellBuffer::new(2 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(64);
        // A diagonal across many scanlines needs far more than two cells.
        outline.move_to(q5(0), q5(0));
        outline.line_to(q5(40), q5(40));
        outline.line_to(q5(0), q5(40));
        outline.finish();
        assert!(outline.was_too_complex());
        assert!(outline.missing_bytes() >= CELL_SIZE);
        assert_eq!(outline.missing_bytes() % CELL_SIZE, 0);
    }

    #[test]
    fn reset_clears_overflow_state() {
        let mut buf = CellBuffer::new(2 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(64);
        outline.move_to(q5(0), q5(0));
        outline.line_to(q5(40), q5(40));
        outline.line_to(q5(0), q5(40));
        outline.finish();
        assert!(outline.was_too_complex());
        outline.reset();
        assert!(!outline.was_too_complex());
        assert_eq!(outline.finish().len(), 0);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut buf = CellBuffer::new(16 * CELL_SIZE);
        let mut outline = Outline::new(&mut buf);
        outline.set_max_render_height(4);
        outline.move_to(q5(0), q5(0));
        outline.line_to(q5(2), q5(1));
        outline.line_to(q5(0), q5(2));
        let first = outline.finish().to_vec();
        let second = outline.finish().to_vec();
        assert_eq!(first, second);
    }
}
