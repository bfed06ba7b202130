//! Split-and-retry driving of canvas drawings.
//!
//! A [`CanvasWidget`] owns a shape and a position on the surface and draws
//! the shape through a [`Canvas`]. When the cell arena cannot hold the
//! outline of the invalidated area, the widget halves the strip height and
//! tries again, down to single scanlines; a line that does not fit even on
//! its own is skipped rather than drawn wrong. The strip height that ended
//! up working is remembered, so the next draw starts there instead of
//! re-discovering the same memory ceiling.

use log::{debug, warn};

use crate::canvas::Canvas;
use crate::cell::CellBuffer;
use crate::painter::Painter;
use crate::rect::Rect;
use crate::surface::{PixelFormat, Surface};
use crate::Error;

/// A shape that can draw itself through the canvas pen.
pub trait CanvasDrawable {
    /// Draw the shape, in widget-relative coordinates, and render it.
    /// Implementations build the path with the pen and finish with
    /// [`Canvas::render`], propagating its result.
    fn draw_canvas<F: PixelFormat, P: Painter>(
        &self,
        canvas: &mut Canvas<'_, '_, F, P>,
    ) -> Result<(), Error>;

    /// The widget-relative rectangle the shape can touch. Used to clip the
    /// invalidated area before any rasterization work is done.
    fn minimal_rect(&self, widget_rect: &Rect) -> Rect {
        Rect::new(0, 0, widget_rect.width, widget_rect.height)
    }
}

/// Positions a [`CanvasDrawable`] on a surface and renders it within a
/// bounded cell arena.
pub struct CanvasWidget<S: CanvasDrawable> {
    shape: S,
    rect: Rect,
    alpha: u8,
    // Strip height of the last draw; 0 until a draw has run.
    split_height: i16,
}

impl<S: CanvasDrawable> CanvasWidget<S> {
    /// Place `shape` at `rect` in surface coordinates, fully opaque.
    pub fn new(shape: S, rect: Rect) -> Self {
        CanvasWidget {
            shape,
            rect,
            alpha: 255,
            split_height: 0,
        }
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut S {
        &mut self.shape
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    /// Strip height the previous draw settled on, 0 before the first draw.
    /// A value smaller than the drawn area means that draw had to split.
    pub fn split_height(&self) -> i16 {
        self.split_height
    }

    /// Draw the shape into the invalidated area, given widget-relative.
    ///
    /// Runs the painter `setup`/`tear_down` pair once per rendered strip.
    /// Too-complex outlines shrink the strip; everything else about a draw
    /// is infallible, so the method does not return a result. Skipped
    /// single lines are reported through [`log`].
    pub fn draw<F: PixelFormat, P: Painter>(
        &mut self,
        cells: &mut CellBuffer,
        surface: &mut Surface<'_, F>,
        painter: &mut P,
        invalidated_area: Rect,
    ) {
        let bounds = Rect::new(0, 0, self.rect.width, self.rect.height);
        let mut area = invalidated_area
            .intersection(&self.shape.minimal_rect(&self.rect))
            .intersection(&bounds);
        if area.is_empty() {
            return;
        }

        let bottom = area.bottom();
        if self.split_height > 0 && self.split_height < area.height {
            area.height = self.split_height;
        }
        let mut granularity = area.height;

        while area.y < bottom {
            loop {
                if !painter.setup(&self.rect) {
                    return;
                }
                let mut canvas = Canvas::new(
                    &mut *cells,
                    &mut *surface,
                    &mut *painter,
                    self.rect,
                    area,
                    self.alpha,
                );
                match self.shape.draw_canvas(&mut canvas) {
                    Ok(()) => break,
                    Err(Error::OutlineTooComplex { .. }) => {
                        if area.height == 1 {
                            warn!("CWR was unable to complete a draw operation due to limited memory.");
                            break;
                        }
                        // Cannot become 0 as (2+1)>>1=1.
                        area.height = (area.height + 1) >> 1;
                        granularity = area.height;
                        debug!("CWR will split draw into multiple draws due to limited memory.");
                    }
                }
            }
            area.y += area.height;
            if area.bottom() > bottom {
                area.height = bottom - area.y;
            }
        }
        self.split_height = granularity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CELL_SIZE;
    use crate::paint_rgb565::PainterRgb565;
    use crate::painter::Rgba8;
    use crate::surface::Rgb565;

    /// Closed polygon over integer vertices, widget relative.
    struct Polygon(Vec<(i32, i32)>);

    impl CanvasDrawable for Polygon {
        fn draw_canvas<F: PixelFormat, P: Painter>(
            &self,
            canvas: &mut Canvas<'_, '_, F, P>,
        ) -> Result<(), Error> {
            let mut points = self.0.iter();
            if let Some(&(x, y)) = points.next() {
                canvas.move_to(x, y);
                for &(x, y) in points {
                    canvas.line_to(x, y);
                }
            }
            canvas.render(255)
        }
    }

    /// Painter whose setup always refuses, as with an unset bitmap.
    struct NeverReady(PainterRgb565);

    impl Painter for NeverReady {
        fn setup(&mut self, _widget_rect: &Rect) -> bool {
            false
        }

        fn paint(
            &self,
            dest: &mut [u8],
            offset: i32,
            widget_x: i32,
            widget_y: i32,
            count: i32,
            alpha: u8,
        ) {
            self.0.paint(dest, offset, widget_x, widget_y, count, alpha);
        }
    }

    fn red_painter() -> PainterRgb565 {
        let mut p = PainterRgb565::new();
        p.set_color(Rgba8::rgb(255, 0, 0));
        p
    }

    fn px(fb: &[u8], w: i32, x: i32, y: i32) -> u16 {
        let i = (y * w + x) as usize * 2;
        u16::from_le_bytes([fb[i], fb[i + 1]])
    }

    fn square_widget() -> CanvasWidget<Polygon> {
        let shape = Polygon(vec![(1, 1), (9, 1), (9, 9), (1, 9)]);
        CanvasWidget::new(shape, Rect::new(0, 0, 10, 10))
    }

    #[test]
    fn roomy_buffer_draws_in_one_pass() {
        let mut cells = CellBuffer::new(1024 * CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = red_painter();
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        assert_eq!(widget.split_height(), 10);
        drop(surface);
        assert_eq!(px(&fb, 10, 5, 5), 0xF800);
        assert_eq!(px(&fb, 10, 0, 0), 0x0000);
    }

    #[test]
    fn tight_buffer_splits_and_still_draws_everything() {
        let mut reference = vec![0u8; 10 * 10 * 2];
        {
            let mut cells = CellBuffer::new(1024 * CELL_SIZE);
            let mut surface = Surface::<Rgb565>::new(&mut reference, 10, 10);
            let mut painter = red_painter();
            let mut widget = square_widget();
            widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        }

        // Room for a couple of strip outlines but not the full square.
        let mut cells = CellBuffer::new(10 * CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = red_painter();
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        let settled = widget.split_height();
        assert!(settled < 10 && settled >= 1, "settled at {}", settled);
        drop(surface);
        assert_eq!(fb, reference, "split draw must produce identical pixels");
    }

    #[test]
    fn split_height_is_remembered_across_draws() {
        let mut cells = CellBuffer::new(10 * CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = red_painter();
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        let first = widget.split_height();
        assert!(first < 10);
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        assert_eq!(
            widget.split_height(),
            first,
            "second draw starts at the remembered height and keeps it"
        );
    }

    #[test]
    fn hopeless_buffer_skips_lines_without_crashing() {
        // One cell can never hold even a single line of the outline.
        let mut cells = CellBuffer::new(CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = red_painter();
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        assert_eq!(widget.split_height(), 1);
        drop(surface);
        assert!(fb.iter().all(|&b| b == 0), "skipped lines stay untouched");
    }

    #[test]
    fn refused_setup_draws_nothing() {
        let mut cells = CellBuffer::new(1024 * CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = NeverReady(red_painter());
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 10));
        drop(surface);
        assert!(fb.iter().all(|&b| b == 0));
        assert_eq!(cells.len(), 0);
    }

    #[test]
    fn empty_clipped_area_is_a_no_op() {
        let mut cells = CellBuffer::new(1024 * CELL_SIZE);
        let mut fb = vec![0u8; 10 * 10 * 2];
        let mut surface = Surface::<Rgb565>::new(&mut fb, 10, 10);
        let mut painter = red_painter();
        let mut widget = square_widget();
        widget.draw(&mut cells, &mut surface, &mut painter, Rect::new(0, 0, 10, 0));
        assert_eq!(widget.split_height(), 0, "no draw ran, nothing remembered");
        drop(surface);
        assert!(fb.iter().all(|&b| b == 0));
    }
}
