//! Coverage cells and the fixed-size arena they live in.
//!
//! The rasterizer decomposes every outline into per-pixel cells carrying a
//! partial `cover` (vertical crossing) and `area` (horizontal position
//! weighted coverage). All cells are stored in a [`CellBuffer`] allocated
//! once up front; a drawing that produces more cells than the buffer holds
//! is reported rather than silently growing the allocation, so callers can
//! retry with a smaller region.

use std::mem;

use log::debug;

/// One coverage cell. Accumulation happens in `i32` and is narrowed on
/// store, matching the compact in-memory layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub x: i16,
    pub y: i16,
    pub cover: i16,
    pub area: i16,
}

/// Bytes occupied by a single cell.
pub const CELL_SIZE: usize = mem::size_of::<Cell>();

impl Cell {
    pub fn new() -> Self {
        Cell::default()
    }

    pub fn set(&mut self, x: i32, y: i32, cover: i32, area: i32) {
        self.x = x as i16;
        self.y = y as i16;
        self.cover = cover as i16;
        self.area = area as i16;
    }

    pub fn set_coord(&mut self, x: i32, y: i32) {
        self.x = x as i16;
        self.y = y as i16;
    }

    pub fn set_cover(&mut self, cover: i32, area: i32) {
        self.cover = cover as i16;
        self.area = area as i16;
    }

    pub fn add_cover(&mut self, cover: i32, area: i32) {
        self.cover = (i32::from(self.cover) + cover) as i16;
        self.area = (i32::from(self.area) + area) as i16;
    }

    pub fn has_cover(&self) -> bool {
        self.cover != 0 || self.area != 0
    }
}

/// Preallocated cell storage shared by every drawing that renders through
/// it. The capacity is fixed at construction; [`try_push`](Self::try_push)
/// refuses cells beyond it and the caller decides how to degrade.
#[derive(Debug)]
pub struct CellBuffer {
    cells: Vec<Cell>,
    max_cells: usize,
    peak_cells: usize,
}

impl CellBuffer {
    /// Create a buffer that holds `size_in_bytes / CELL_SIZE` cells.
    pub fn new(size_in_bytes: usize) -> Self {
        let max_cells = size_in_bytes / CELL_SIZE;
        CellBuffer {
            cells: Vec::with_capacity(max_cells),
            max_cells,
            peak_cells: 0,
        }
    }

    pub fn capacity_cells(&self) -> usize {
        self.max_cells
    }

    pub fn capacity_bytes(&self) -> usize {
        self.max_cells * CELL_SIZE
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Append a cell unless the buffer is full. Never reallocates.
    pub fn try_push(&mut self, cell: Cell) -> bool {
        if self.cells.len() >= self.max_cells {
            return false;
        }
        self.cells.push(cell);
        true
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Order cells by scanline, then by column within the scanline.
    pub fn sort(&mut self) {
        self.cells.sort_unstable_by_key(|c| (c.y, c.x));
    }

    /// Record the space the finished drawing needed. Logs once per new high
    /// water mark so buffer sizing can be read off a debug run.
    pub fn note_usage(&mut self) {
        let used = self.cells.len();
        if used > self.peak_cells {
            self.peak_cells = used;
            debug!(
                "cell buffer high water mark: {} of {} bytes ({} cells)",
                used * CELL_SIZE,
                self.capacity_bytes(),
                used
            );
        }
    }

    /// Largest number of bytes any drawing has needed so far.
    pub fn peak_bytes(&self) -> usize {
        self.peak_cells * CELL_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_is_eight_bytes() {
        assert_eq!(CELL_SIZE, 8);
    }

    #[test]
    fn accumulation_narrows_on_store() {
        let mut c = Cell::new();
        c.set_cover(40_000, -40_000);
        // Stored as i16, so the value wraps rather than panicking.
        assert_eq!(i32::from(c.cover), 40_000i32 as i16 as i32);
        c.add_cover(1, 1);
        assert!(c.has_cover());
    }

    #[test]
    fn buffer_capacity_is_hard() {
        let mut buf = CellBuffer::new(3 * CELL_SIZE + CELL_SIZE - 1);
        assert_eq!(buf.capacity_cells(), 3);
        for _ in 0..3 {
            assert!(buf.try_push(Cell::new()));
        }
        assert!(!buf.try_push(Cell::new()));
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn sort_orders_by_scanline_then_column() {
        let mut buf = CellBuffer::new(4 * CELL_SIZE);
        for &(x, y) in &[(3, 1), (0, 2), (1, 1), (5, 0)] {
            let mut c = Cell::new();
            c.set_coord(x, y);
            assert!(buf.try_push(c));
        }
        buf.sort();
        let order: Vec<(i16, i16)> = buf.cells().iter().map(|c| (c.y, c.x)).collect();
        assert_eq!(order, vec![(0, 5), (1, 1), (1, 3), (2, 0)]);
    }

    #[test]
    fn peak_tracks_largest_drawing() {
        let mut buf = CellBuffer::new(8 * CELL_SIZE);
        for _ in 0..5 {
            buf.try_push(Cell::new());
        }
        buf.note_usage();
        buf.clear();
        for _ in 0..2 {
            buf.try_push(Cell::new());
        }
        buf.note_usage();
        assert_eq!(buf.peak_bytes(), 5 * CELL_SIZE);
    }
}
