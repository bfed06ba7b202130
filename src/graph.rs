//! Fixed-capacity sample storage for graph widgets.
//!
//! Four policies over a preallocated array of samples, differing in what
//! happens when the array is full. Each maps a screen index (0 = leftmost
//! plotted point) to a storage slot and to a global sample number, so axis
//! labels stay correct across wrapping; the mapping arithmetic is what
//! distinguishes the policies.
//!
//! Values are plain `i32`s; any fixed-point scaling of real measurements
//! happens in the widget layer before insertion.

/// Sorted (x, y) storage for a static graph.
///
/// Points keep ascending x order. Inserting an x that is already present
/// replaces that point's y value; inserting a new x into a full graph is
/// rejected.
#[derive(Debug)]
pub struct GraphData {
    x_values: Vec<i32>,
    y_values: Vec<i32>,
    used: usize,
}

impl GraphData {
    pub fn new(capacity: usize) -> Self {
        GraphData {
            x_values: vec![0; capacity],
            y_values: vec![0; capacity],
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.x_values.len()
    }

    pub fn used_capacity(&self) -> usize {
        self.used
    }

    pub fn clear(&mut self) {
        self.used = 0;
    }

    /// Insert a point, keeping x ascending. Returns the index the point
    /// ended up at, or `None` when the graph is full and `x` is not a
    /// replacement of an existing point.
    pub fn add_point(&mut self, x: i32, y: i32) -> Option<usize> {
        let mut index = 0;
        if self.used == 0 || self.x_values[self.used - 1] < x {
            index = self.used;
        } else {
            while index < self.used && self.x_values[index] < x {
                index += 1;
            }
            if index < self.used && self.x_values[index] == x {
                self.y_values[index] = y;
                return Some(index);
            }
        }
        if self.used == self.capacity() {
            return None;
        }
        for i in (index + 1..=self.used).rev() {
            self.x_values[i] = self.x_values[i - 1];
            self.y_values[i] = self.y_values[i - 1];
        }
        self.used += 1;
        self.x_values[index] = x;
        self.y_values[index] = y;
        Some(index)
    }

    pub fn point_at(&self, index: usize) -> (i32, i32) {
        assert!(index < self.used);
        (self.x_values[index], self.y_values[index])
    }

    /// Static graphs never renumber; the screen index is the sample number.
    pub fn index_to_global_index(&self, index: usize) -> i32 {
        index as i32
    }
}

/// Scrolling storage: once full, each new sample pushes the oldest one off
/// the left edge of the graph.
#[derive(Debug)]
pub struct GraphScrollData {
    values: Vec<i32>,
    used: usize,
    current: usize,
    counter: u32,
}

impl GraphScrollData {
    pub fn new(capacity: usize) -> Self {
        GraphScrollData {
            values: vec![0; capacity],
            used: 0,
            current: 0,
            counter: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn used_capacity(&self) -> usize {
        self.used
    }

    /// Samples inserted since construction; survives [`clear`](Self::clear)
    /// so global sample numbers stay monotonic.
    pub fn sample_count(&self) -> u32 {
        self.counter
    }

    pub fn clear(&mut self) {
        self.used = 0;
        self.current = 0;
    }

    /// Store a sample, overwriting the oldest once the graph is full.
    /// Returns the slot written.
    pub fn add_value(&mut self, value: i32) -> usize {
        self.counter += 1;
        let index = self.current;
        self.current = (self.current + 1) % self.capacity();
        if index == self.used {
            self.used += 1;
        }
        self.values[index] = value;
        index
    }

    /// Storage slot of a screen index. Identity until the buffer wraps.
    pub fn data_index(&self, screen_index: usize) -> usize {
        if self.used < self.capacity() {
            screen_index
        } else {
            (screen_index + self.current) % self.capacity()
        }
    }

    pub fn value_at(&self, screen_index: usize) -> i32 {
        assert!(screen_index < self.used);
        self.values[self.data_index(screen_index)]
    }

    /// Global sample number of a screen index; screen index 0 is always the
    /// oldest retained sample.
    pub fn index_to_global_index(&self, screen_index: usize) -> i32 {
        if self.used < self.capacity() {
            return self.data_index(screen_index) as i32;
        }
        (self.counter as i32 - self.capacity() as i32) + screen_index as i32
    }
}

/// Storage that fills left to right, then starts over from an empty graph.
///
/// The insertion after the graph has filled clears every prior sample
/// first, giving the sawtooth redraw this policy is used for.
#[derive(Debug)]
pub struct GraphWrapAndClearData {
    values: Vec<i32>,
    used: usize,
    counter: u32,
}

impl GraphWrapAndClearData {
    pub fn new(capacity: usize) -> Self {
        GraphWrapAndClearData {
            values: vec![0; capacity],
            used: 0,
            counter: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn used_capacity(&self) -> usize {
        self.used
    }

    pub fn sample_count(&self) -> u32 {
        self.counter
    }

    pub fn clear(&mut self) {
        self.used = 0;
    }

    /// Store a sample, clearing the whole graph first when it is full.
    /// Returns the slot written.
    pub fn add_value(&mut self, value: i32) -> usize {
        if self.used >= self.capacity() {
            self.clear();
        }
        self.counter += 1;
        let index = self.used;
        self.used += 1;
        self.values[index] = value;
        index
    }

    pub fn value_at(&self, screen_index: usize) -> i32 {
        assert!(screen_index < self.used);
        self.values[screen_index]
    }

    /// Labels restart from zero after every wrap.
    pub fn index_to_global_index(&self, screen_index: usize) -> i32 {
        screen_index as i32
    }
}

/// Storage that overwrites in place, sweep style.
///
/// Samples stay at their slot; the write position wraps around and a gap
/// index tracks the discontinuity between the newest and the oldest sample
/// so renderers can skip the connecting line across it.
#[derive(Debug)]
pub struct GraphWrapAndOverwriteData {
    values: Vec<i32>,
    used: usize,
    current: usize,
    gap_before: usize,
    counter: u32,
}

impl GraphWrapAndOverwriteData {
    pub fn new(capacity: usize) -> Self {
        GraphWrapAndOverwriteData {
            values: vec![0; capacity],
            used: 0,
            current: 0,
            gap_before: 0,
            counter: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn used_capacity(&self) -> usize {
        self.used
    }

    pub fn sample_count(&self) -> u32 {
        self.counter
    }

    pub fn clear(&mut self) {
        self.used = 0;
        self.current = 0;
    }

    /// Store a sample at the next slot, wrapping in place. Returns the slot
    /// written; the gap moves to just after it.
    pub fn add_value(&mut self, value: i32) -> usize {
        self.counter += 1;
        let index = self.current;
        self.current = (self.current + 1) % self.capacity();
        if index == self.used {
            self.used += 1;
        }
        self.values[index] = value;
        self.gap_before = index + 1;
        index
    }

    /// The graph is disconnected immediately before this slot; equal to the
    /// most recently written slot plus one.
    pub fn gap_before_index(&self) -> usize {
        self.gap_before
    }

    pub fn value_at(&self, screen_index: usize) -> i32 {
        assert!(screen_index < self.used);
        self.values[screen_index]
    }

    /// Global sample number of a slot. Slots before the gap hold the newest
    /// lap of samples, slots at and after it still hold the previous lap.
    pub fn index_to_global_index(&self, screen_index: usize) -> i32 {
        if self.used < self.capacity() {
            return screen_index as i32;
        }
        let gap = self.gap_before as i32;
        let screen_index = screen_index as i32;
        if screen_index < gap {
            (self.counter as i32 - gap) + screen_index
        } else {
            ((self.counter as i32 - gap) - self.capacity() as i32) + screen_index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_insert_keeps_x_ascending() {
        let mut g = GraphData::new(4);
        assert_eq!(g.add_point(30, 3), Some(0));
        assert_eq!(g.add_point(10, 1), Some(0));
        assert_eq!(g.add_point(20, 2), Some(1));
        assert_eq!(g.used_capacity(), 3);
        assert_eq!(g.point_at(0), (10, 1));
        assert_eq!(g.point_at(1), (20, 2));
        assert_eq!(g.point_at(2), (30, 3));
    }

    #[test]
    fn sorted_insert_replaces_equal_x() {
        let mut g = GraphData::new(2);
        g.add_point(10, 1);
        g.add_point(20, 2);
        assert_eq!(g.add_point(10, 7), Some(0));
        assert_eq!(g.used_capacity(), 2);
        assert_eq!(g.point_at(0), (10, 7));
    }

    #[test]
    fn sorted_insert_rejects_new_x_when_full() {
        let mut g = GraphData::new(2);
        g.add_point(10, 1);
        g.add_point(20, 2);
        assert_eq!(g.add_point(15, 9), None);
        assert_eq!(g.add_point(30, 9), None);
        assert_eq!(g.used_capacity(), 2);
    }

    #[test]
    fn scroll_identity_until_full() {
        let mut g = GraphScrollData::new(4);
        for v in 0..3 {
            assert_eq!(g.add_value(v), v as usize);
        }
        for i in 0..3 {
            assert_eq!(g.data_index(i), i);
            assert_eq!(g.index_to_global_index(i), i as i32);
            assert_eq!(g.value_at(i), i as i32);
        }
    }

    #[test]
    fn scroll_window_slides_once_full() {
        let mut g = GraphScrollData::new(4);
        for v in 0..6 {
            g.add_value(v);
        }
        // Screen order is the four newest samples, oldest first.
        let screen: Vec<i32> = (0..4).map(|i| g.value_at(i)).collect();
        assert_eq!(screen, vec![2, 3, 4, 5]);
        assert_eq!(g.index_to_global_index(0), 2);
        assert_eq!(g.index_to_global_index(3), 5);
    }

    #[test]
    fn wrap_and_clear_restarts_after_capacity() {
        let mut g = GraphWrapAndClearData::new(4);
        for v in 0..4 {
            g.add_value(v);
        }
        assert_eq!(g.used_capacity(), 4);
        assert_eq!(g.add_value(99), 0);
        assert_eq!(g.used_capacity(), 1, "fifth insert cleared the graph");
        assert_eq!(g.value_at(0), 99);
        assert_eq!(g.sample_count(), 5);
    }

    #[test]
    fn wrap_and_overwrite_tracks_the_gap() {
        let capacity = 4;
        let mut g = GraphWrapAndOverwriteData::new(capacity);
        for v in 0..capacity as i32 + 1 {
            g.add_value(v);
        }
        // The fifth sample overwrote slot 0; the gap sits right after it.
        assert_eq!(g.gap_before_index(), 1);
        assert_eq!(g.value_at(0), 4);
        assert_eq!(g.value_at(1), 1);
        // Slot 0 holds the newest sample, the slot at the gap the oldest.
        assert_eq!(g.index_to_global_index(0), 4);
        assert_eq!(
            g.index_to_global_index(g.gap_before_index()),
            g.sample_count() as i32 - capacity as i32
        );
    }

    #[test]
    fn wrap_and_overwrite_global_indices_are_contiguous_per_lap() {
        let mut g = GraphWrapAndOverwriteData::new(4);
        for v in 0..7 {
            g.add_value(v);
        }
        // Slots 0..3 after 7 inserts: 4, 5, 6, 3. Gap before slot 3.
        assert_eq!(g.gap_before_index(), 3);
        let globals: Vec<i32> = (0..4).map(|i| g.index_to_global_index(i)).collect();
        assert_eq!(globals, vec![4, 5, 6, 3]);
    }

    #[test]
    fn clear_keeps_the_sample_counter() {
        let mut g = GraphScrollData::new(3);
        for v in 0..5 {
            g.add_value(v);
        }
        g.clear();
        assert_eq!(g.used_capacity(), 0);
        assert_eq!(g.sample_count(), 5);
        assert_eq!(g.add_value(7), 0);
    }
}
