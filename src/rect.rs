//! Axis-aligned integer rectangles.
//!
//! Positions and sizes are `i16`, matching the coordinate range of the cell
//! rasterizer and the small displays this crate targets.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
}

impl Rect {
    pub fn new(x: i16, y: i16, width: i16, height: i16) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column.
    pub fn right(&self) -> i16 {
        self.x + self.width
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i16 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// The overlapping region, or an empty rectangle when disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Rect::default();
        }
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Grow to cover `other` as well.
    pub fn expand_to_fit(&mut self, other: &Rect) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        self.x = self.x.min(other.x);
        self.y = self.y.min(other.y);
        self.width = right - self.x;
        self.height = bottom - self.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 5, 5));
    }

    #[test]
    fn intersection_disjoint_is_empty() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 4, 4);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn expand_covers_both() {
        let mut a = Rect::new(2, 2, 3, 3);
        a.expand_to_fit(&Rect::new(0, 4, 2, 4));
        assert_eq!(a, Rect::new(0, 2, 5, 6));
    }

    #[test]
    fn expand_from_empty_adopts_other() {
        let mut a = Rect::default();
        a.expand_to_fit(&Rect::new(3, 1, 2, 2));
        assert_eq!(a, Rect::new(3, 1, 2, 2));
    }
}
