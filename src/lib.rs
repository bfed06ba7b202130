//! Anti-aliased canvas rendering for fixed-memory framebuffers
//!
//! The pipeline, leaf to root:
//!
//!    CellBuffer            - arena of coverage cells, sized once at startup
//!    Outline               - line segments (Q5) -> cells with cover and area
//!    Rasterizer            - sorted cells -> coverage spans -> painter
//!    Painter               - one per framebuffer format, blends a span
//!    Canvas                - pen interface (move_to/line_to), clipping
//!    CanvasWidget          - split-retry driver under memory pressure
//!
//! A shape draws itself through a [`Canvas`] bound to a [`Surface`] and a
//! painter; the rasterizer fills the cell arena and sweeps it row by row,
//! handing each span to the painter. When the arena cannot hold the outline
//! of the invalidated area, the widget driver halves the area and retries,
//! down to single scanlines.
//!
//! ```
//! use cwr::{Canvas, CellBuffer, PainterRgb565, Rect, Rgb565, Rgba8, Surface};
//!
//! let mut cells = CellBuffer::new(8192);
//! let mut fb = vec![0u8; 100 * 100 * 2];
//! let mut surface = Surface::<Rgb565>::new(&mut fb, 100, 100);
//! let mut painter = PainterRgb565::new();
//! painter.set_color(Rgba8::new(255, 0, 0, 255));
//!
//! let area = Rect::new(0, 0, 100, 100);
//! let mut canvas = Canvas::new(&mut cells, &mut surface, &mut painter, area, area, 255);
//! canvas.move_to(10, 10);
//! canvas.line_to(50, 90);
//! canvas.line_to(90, 10);
//! canvas.render(255).unwrap();
//! ```

pub mod bitmap;
pub mod canvas;
pub mod cell;
pub mod fixed;
pub mod graph;
pub mod math;
pub mod outline;
pub mod paint_2222;
pub mod paint_argb8888;
pub mod paint_bw;
pub mod paint_gray2;
pub mod paint_gray4;
pub mod paint_rgb565;
pub mod paint_rgb888;
pub mod paint_xrgb8888;
pub mod painter;
pub mod ppm;
pub mod raster;
pub mod rect;
pub mod surface;
pub mod widget;

pub use crate::bitmap::*;
pub use crate::canvas::*;
pub use crate::cell::*;
pub use crate::fixed::*;
pub use crate::graph::*;
pub use crate::math::*;
pub use crate::outline::*;
pub use crate::paint_2222::*;
pub use crate::paint_argb8888::*;
pub use crate::paint_bw::*;
pub use crate::paint_gray2::*;
pub use crate::paint_gray4::*;
pub use crate::paint_rgb565::*;
pub use crate::paint_rgb888::*;
pub use crate::paint_xrgb8888::*;
pub use crate::painter::*;
pub use crate::raster::*;
pub use crate::rect::*;
pub use crate::surface::*;
pub use crate::widget::*;

/// Number of fractional bits in pen and cell coordinates (Q5).
pub const POLY_BASE_SHIFT: i32 = 5;
/// One pixel in Q5 units.
pub const POLY_BASE_SIZE: i32 = 1 << POLY_BASE_SHIFT;
/// Mask extracting the fractional part of a Q5 coordinate.
pub const POLY_BASE_MASK: i32 = POLY_BASE_SIZE - 1;

/// Errors surfaced by the draw path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The outline needed more cells than the arena holds. Nothing was
    /// painted; the caller may retry with a smaller area.
    #[error("outline too complex for the cell buffer ({missing_bytes} bytes short)")]
    OutlineTooComplex {
        /// Bytes of cell storage that were requested but unavailable.
        missing_bytes: usize,
    },
}
