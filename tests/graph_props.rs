//! Property tests for the graph storage policies and the integer helpers
//! the painters lean on.

use proptest::prelude::*;

use cwr::{
    div255, GraphScrollData, GraphWrapAndClearData, GraphWrapAndOverwriteData, Q5,
    POLY_BASE_SIZE,
};

proptest! {
    // Scroll storage shows a sliding window over the sample stream: screen
    // index 0 is the oldest retained sample and global numbers run without
    // holes up to the newest one.
    #[test]
    fn scroll_is_a_sliding_window(cap in 1usize..=16, n in 0usize..=100) {
        let mut data = GraphScrollData::new(cap);
        for v in 0..n {
            data.add_value(v as i32);
        }

        let used = n.min(cap);
        prop_assert_eq!(data.used_capacity(), used);
        prop_assert_eq!(data.sample_count(), n as u32);

        let first_global = if n >= cap { (n - cap) as i32 } else { 0 };
        for i in 0..used {
            prop_assert_eq!(data.value_at(i), first_global + i as i32);
            prop_assert_eq!(data.index_to_global_index(i), first_global + i as i32);
        }
    }

    // Capacity 2 and up: a single insert after the clear must not refill
    // the buffer, or the global numbering switches to the window formula.
    #[test]
    fn scroll_clear_keeps_the_sample_count(cap in 2usize..=16, n in 1usize..=50) {
        let mut data = GraphScrollData::new(cap);
        for v in 0..n {
            data.add_value(v as i32);
        }
        data.clear();
        prop_assert_eq!(data.used_capacity(), 0);
        prop_assert_eq!(data.sample_count(), n as u32);

        // The next lap continues the global numbering.
        data.add_value(0);
        prop_assert_eq!(data.index_to_global_index(0), 0);
        prop_assert_eq!(data.sample_count(), (n + 1) as u32);
    }

    // Wrap-and-clear restarts from an empty graph each time it fills, so
    // the retained samples are always the tail of the stream and their
    // count follows a sawtooth.
    #[test]
    fn wrap_and_clear_retains_the_current_lap(cap in 1usize..=16, n in 1usize..=100) {
        let mut data = GraphWrapAndClearData::new(cap);
        for v in 0..n {
            data.add_value(v as i32);
        }

        let used = (n - 1) % cap + 1;
        prop_assert_eq!(data.used_capacity(), used);
        prop_assert_eq!(data.sample_count(), n as u32);
        for i in 0..used {
            prop_assert_eq!(data.value_at(i), (n - used + i) as i32);
            prop_assert_eq!(data.index_to_global_index(i), i as i32);
        }
    }

    // Wrap-and-overwrite keeps samples at their slot. Once full, the slots
    // hold exactly the last `cap` samples of the stream and the oldest one
    // sits where the gap is.
    #[test]
    fn wrap_and_overwrite_covers_the_last_lap(cap in 1usize..=16, n in 0usize..=100) {
        let mut data = GraphWrapAndOverwriteData::new(cap);
        for v in 0..n {
            data.add_value(v as i32);
        }

        prop_assert_eq!(data.used_capacity(), n.min(cap));
        if n >= cap {
            let mut globals: Vec<i32> =
                (0..cap).map(|i| data.index_to_global_index(i)).collect();
            for (i, &g) in globals.iter().enumerate() {
                prop_assert_eq!(data.value_at(i), g, "slot {} holds its own sample", i);
            }
            globals.sort_unstable();
            let expected: Vec<i32> = ((n - cap) as i32..n as i32).collect();
            prop_assert_eq!(globals, expected, "exactly the last {} samples", cap);

            let oldest = data.gap_before_index() % cap;
            prop_assert_eq!(data.index_to_global_index(oldest), (n - cap) as i32);
        } else {
            for i in 0..n {
                prop_assert_eq!(data.index_to_global_index(i), i as i32);
            }
        }
    }

    #[test]
    fn div255_tracks_the_rational_quotient(a in 0u32..=255, b in 0u32..=255) {
        let v = a * b;
        let d = div255(v);
        prop_assert!(d <= 255);
        let exact = v / 255;
        prop_assert!(d == exact || d == exact + 1);
        if v % 255 == 0 {
            prop_assert_eq!(d, exact, "multiples of 255 divide exactly");
        }
    }

    #[test]
    fn q5_conversions_are_consistent(v in -10_000i32..=10_000) {
        let q = Q5::from(v);
        prop_assert_eq!(q.raw(), v * POLY_BASE_SIZE);
        prop_assert_eq!(q.to_int(), v);
        prop_assert_eq!(Q5::from_raw(q.raw()), q);
        prop_assert_eq!((-q).raw(), -q.raw());
    }

    #[test]
    fn q5_float_conversion_truncates_toward_zero(v in -1000i32..=1000) {
        // Halves are exact in both representations.
        let q = Q5::from(v as f32 / 2.0);
        prop_assert_eq!(q.raw(), v * POLY_BASE_SIZE / 2);
        prop_assert_eq!(q.to_int(), v / 2);
    }
}
