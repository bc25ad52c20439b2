//! Viewport virtualization for variable-height rows.
//!
//! Row heights live in a Fenwick tree so offset/index conversions stay
//! logarithmic no matter how many pages have been appended. Heights are in
//! terminal rows; rows that have not been rendered yet use the configured
//! estimate.

use std::ops::Range;

/// Prefix sums over row heights, 1-indexed internally.
#[derive(Debug, Clone, Default)]
struct HeightTree {
    tree: Vec<u32>,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

impl HeightTree {
    fn from_heights(heights: &[u32]) -> Self {
        let n = heights.len();
        let mut tree = vec![0u32; n + 1];
        tree[1..].copy_from_slice(heights);
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                tree[parent] += tree[i];
            }
        }
        Self { tree }
    }

    fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    /// Sum of the first `count` heights.
    fn prefix(&self, count: usize) -> u32 {
        let mut idx = count.min(self.len());
        let mut sum = 0;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowbit(idx);
        }
        sum
    }

    fn add(&mut self, index: usize, delta: i64) {
        let mut idx = index + 1;
        while idx <= self.len() {
            self.tree[idx] = (i64::from(self.tree[idx]) + delta) as u32;
            idx += lowbit(idx);
        }
    }

    fn push(&mut self, height: u32) {
        if self.tree.is_empty() {
            self.tree.push(0);
        }
        let i = self.tree.len();
        // Node i covers (i - lowbit(i), i]; everything but the new leaf is
        // already summed in the prefix.
        let covered = self.prefix(i - 1) - self.prefix(i - lowbit(i));
        self.tree.push(covered + height);
    }

    /// Number of leading rows whose cumulative height is `<= offset`, which is
    /// also the index of the row containing `offset`.
    fn rows_ending_at_or_before(&self, offset: u32) -> usize {
        let n = self.len();
        let mut pos = 0;
        let mut remaining = offset;
        let mut step = if n == 0 { 0 } else { 1 << (usize::BITS - 1 - n.leading_zeros()) };
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        pos
    }
}

/// Measured or estimated height for each loaded row.
#[derive(Debug, Clone)]
pub struct RowHeightRegistry {
    estimate: u16,
    heights: Vec<u32>,
    measured: Vec<bool>,
    tree: HeightTree,
}

impl RowHeightRegistry {
    pub fn new(estimate: u16) -> Self {
        Self {
            estimate: estimate.max(1),
            heights: Vec::new(),
            measured: Vec::new(),
            tree: HeightTree::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn estimate(&self) -> u16 {
        self.estimate
    }

    /// Grows with estimated rows or truncates to `len`.
    pub fn resize(&mut self, len: usize) {
        if len < self.heights.len() {
            self.heights.truncate(len);
            self.measured.truncate(len);
            self.tree = HeightTree::from_heights(&self.heights);
            return;
        }
        let estimate = u32::from(self.estimate);
        for _ in self.heights.len()..len {
            self.heights.push(estimate);
            self.measured.push(false);
            self.tree.push(estimate);
        }
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.measured.clear();
        self.tree = HeightTree::default();
    }

    pub fn height(&self, index: usize) -> u32 {
        self.heights.get(index).copied().unwrap_or(u32::from(self.estimate))
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    /// Stores a measured height. Returns the signed change in extent, zero if
    /// nothing changed or the index is out of range.
    pub fn record(&mut self, index: usize, height: u16) -> i64 {
        let Some(current) = self.heights.get(index).copied() else {
            return 0;
        };
        self.measured[index] = true;
        let height = u32::from(height.max(1));
        if height == current {
            return 0;
        }
        let delta = i64::from(height) - i64::from(current);
        self.heights[index] = height;
        self.tree.add(index, delta);
        delta
    }

    /// Offset of the top edge of row `index`.
    pub fn offset_of(&self, index: usize) -> u32 {
        self.tree.prefix(index)
    }

    /// Row containing `offset`, clamped to the last row.
    pub fn index_at(&self, offset: u32) -> Option<usize> {
        if self.heights.is_empty() {
            return None;
        }
        Some(self.tree.rows_ending_at_or_before(offset).min(self.heights.len() - 1))
    }

    pub fn total(&self) -> u32 {
        self.tree.prefix(self.heights.len())
    }
}

/// The slice of rows currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportWindow {
    pub first_visible: usize,
    pub last_visible: usize,
    pub scroll_offset: u32,
}

#[derive(Debug, Clone)]
pub struct ViewportVirtualizer {
    registry: RowHeightRegistry,
    scroll_offset: u32,
    viewport_height: u16,
    overscan: usize,
}

impl ViewportVirtualizer {
    pub fn new(estimated_row_height: u16, overscan: usize) -> Self {
        Self {
            registry: RowHeightRegistry::new(estimated_row_height),
            scroll_offset: 0,
            viewport_height: 0,
            overscan,
        }
    }

    pub fn registry(&self) -> &RowHeightRegistry {
        &self.registry
    }

    pub fn item_count(&self) -> usize {
        self.registry.len()
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn total_extent(&self) -> u32 {
        self.registry.total()
    }

    pub fn max_offset(&self) -> u32 {
        self.total_extent().saturating_sub(u32::from(self.viewport_height))
    }

    /// Tracks the loaded item count. Growth keeps the scroll position.
    pub fn set_item_count(&mut self, count: usize) {
        self.registry.resize(count);
        self.clamp();
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.clamp();
    }

    /// Drops all rows and measurements and returns to the top.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.scroll_offset = 0;
    }

    /// Scrolls by `delta` terminal rows. Returns whether the offset moved.
    pub fn scroll_by(&mut self, delta: i32) -> bool {
        let before = self.scroll_offset;
        let target = i64::from(self.scroll_offset) + i64::from(delta);
        self.scroll_offset = target.clamp(0, i64::from(self.max_offset())) as u32;
        self.scroll_offset != before
    }

    /// Places row `index` at the top of the viewport as far as the extent
    /// allows.
    pub fn scroll_to_index(&mut self, index: usize) {
        if self.registry.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        let index = index.min(self.registry.len() - 1);
        self.scroll_offset = self.registry.offset_of(index).min(self.max_offset());
    }

    /// Scrolls the minimum distance needed for row `index` to be fully on
    /// screen. Returns whether the offset moved.
    pub fn ensure_visible(&mut self, index: usize) -> bool {
        if index >= self.registry.len() {
            return false;
        }
        let before = self.scroll_offset;
        let top = self.registry.offset_of(index);
        let bottom = top + self.registry.height(index);
        let viewport = u32::from(self.viewport_height);
        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > self.scroll_offset + viewport {
            // Rows taller than the viewport show their top edge.
            self.scroll_offset = bottom.saturating_sub(viewport).min(top);
        }
        self.clamp();
        self.scroll_offset != before
    }

    /// Records a measured row height. Rows above the viewport shift the
    /// offset so the first visible row stays put.
    pub fn record_height(&mut self, index: usize, height: u16) -> bool {
        let first_visible = self.registry.index_at(self.scroll_offset);
        let delta = self.registry.record(index, height);
        if delta == 0 {
            return false;
        }
        if first_visible.is_some_and(|first| index < first) {
            self.scroll_offset = (i64::from(self.scroll_offset) + delta).max(0) as u32;
        }
        self.clamp();
        true
    }

    pub fn window(&self) -> Option<ViewportWindow> {
        if self.viewport_height == 0 {
            return None;
        }
        let first_visible = self.registry.index_at(self.scroll_offset)?;
        let bottom = self.scroll_offset + u32::from(self.viewport_height) - 1;
        let last_visible = self.registry.index_at(bottom)?;
        Some(ViewportWindow {
            first_visible,
            last_visible,
            scroll_offset: self.scroll_offset,
        })
    }

    /// Visible rows plus `overscan` on each side.
    pub fn render_range(&self) -> Range<usize> {
        match self.window() {
            Some(window) => {
                let start = window.first_visible.saturating_sub(self.overscan);
                let end = (window.last_visible + self.overscan + 1).min(self.registry.len());
                start..end
            }
            None => 0..0,
        }
    }

    /// Rows entirely inside the viewport; used as the page step.
    pub fn fully_visible_rows(&self) -> usize {
        let Some(window) = self.window() else {
            return 1;
        };
        let viewport_end = self.scroll_offset + u32::from(self.viewport_height);
        let count = (window.first_visible..=window.last_visible)
            .filter(|&index| {
                let top = self.registry.offset_of(index);
                top >= self.scroll_offset && top + self.registry.height(index) <= viewport_end
            })
            .count();
        count.max(1)
    }

    fn clamp(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn virtualizer(count: usize, viewport: u16, overscan: usize) -> ViewportVirtualizer {
        let mut virtualizer = ViewportVirtualizer::new(1, overscan);
        virtualizer.set_item_count(count);
        virtualizer.set_viewport_height(viewport);
        virtualizer
    }

    #[test]
    fn tree_push_matches_bulk_build() {
        let heights: Vec<u32> = (1..=37).map(|h| h % 5 + 1).collect();
        let bulk = HeightTree::from_heights(&heights);
        let mut pushed = HeightTree::default();
        for &height in &heights {
            pushed.push(height);
        }
        for count in 0..=heights.len() {
            let expected: u32 = heights[..count].iter().sum();
            assert_eq!(bulk.prefix(count), expected);
            assert_eq!(pushed.prefix(count), expected);
        }
    }

    #[test]
    fn index_lookup_respects_variable_heights() {
        let mut registry = RowHeightRegistry::new(1);
        registry.resize(5);
        registry.record(1, 3);
        // Offsets: row0 [0,1) row1 [1,4) row2 [4,5) row3 [5,6) row4 [6,7)
        assert_eq!(registry.total(), 7);
        assert_eq!(registry.index_at(0), Some(0));
        assert_eq!(registry.index_at(1), Some(1));
        assert_eq!(registry.index_at(3), Some(1));
        assert_eq!(registry.index_at(4), Some(2));
        assert_eq!(registry.index_at(100), Some(4));
        assert_eq!(registry.offset_of(3), 5);
        assert!(registry.is_measured(1));
        assert!(!registry.is_measured(2));
    }

    #[test]
    fn render_range_includes_overscan() {
        let mut virtualizer = virtualizer(100, 10, 3);
        assert_eq!(virtualizer.render_range(), 0..13);

        virtualizer.scroll_by(20);
        let window = virtualizer.window().expect("window");
        assert_eq!((window.first_visible, window.last_visible), (20, 29));
        assert_eq!(virtualizer.render_range(), 17..33);
    }

    #[test]
    fn scroll_is_clamped_to_extent() {
        let mut virtualizer = virtualizer(30, 10, 0);
        assert!(virtualizer.scroll_by(1_000));
        assert_eq!(virtualizer.scroll_offset(), 20);
        assert!(!virtualizer.scroll_by(5));
        assert!(virtualizer.scroll_by(-1_000));
        assert_eq!(virtualizer.scroll_offset(), 0);
    }

    #[test]
    fn scroll_to_index_top_aligns_when_possible() {
        let mut virtualizer = virtualizer(30, 10, 0);
        virtualizer.scroll_to_index(5);
        assert_eq!(virtualizer.window().expect("window").first_visible, 5);

        virtualizer.scroll_to_index(29);
        assert_eq!(virtualizer.scroll_offset(), 20);

        virtualizer.scroll_to_index(0);
        assert_eq!(virtualizer.scroll_offset(), 0);
    }

    #[test]
    fn ensure_visible_scrolls_minimally() {
        let mut virtualizer = virtualizer(50, 10, 0);
        assert!(!virtualizer.ensure_visible(9));
        assert!(virtualizer.ensure_visible(10));
        let window = virtualizer.window().expect("window");
        assert_eq!((window.first_visible, window.last_visible), (1, 10));

        assert!(virtualizer.ensure_visible(0));
        assert_eq!(virtualizer.scroll_offset(), 0);
        assert!(!virtualizer.ensure_visible(50));
    }

    #[test]
    fn ensure_visible_accounts_for_tall_rows() {
        let mut virtualizer = virtualizer(20, 6, 0);
        virtualizer.record_height(7, 2);
        assert!(virtualizer.ensure_visible(7));
        let window = virtualizer.window().expect("window");
        assert_eq!(window.last_visible, 7);
        assert_eq!(virtualizer.scroll_offset(), 3);
    }

    #[test]
    fn measuring_rows_above_viewport_keeps_first_row_anchored() {
        let mut virtualizer = virtualizer(100, 10, 0);
        virtualizer.scroll_to_index(40);
        assert!(virtualizer.record_height(3, 4));
        assert_eq!(virtualizer.window().expect("window").first_visible, 40);
        assert_eq!(virtualizer.total_extent(), 103);
        assert!(!virtualizer.record_height(3, 4));
    }

    #[test]
    fn empty_or_zero_height_has_no_window() {
        let virtualizer = virtualizer(0, 10, 2);
        assert!(virtualizer.window().is_none());
        assert_eq!(virtualizer.render_range(), 0..0);

        let virtualizer = self::virtualizer(10, 0, 2);
        assert_eq!(virtualizer.render_range(), 0..0);
    }

    #[test]
    fn growth_preserves_scroll_and_reset_returns_to_top() {
        let mut virtualizer = virtualizer(50, 10, 0);
        virtualizer.scroll_to_index(40);
        virtualizer.set_item_count(100);
        assert_eq!(virtualizer.scroll_offset(), 40);

        virtualizer.reset();
        assert_eq!(virtualizer.item_count(), 0);
        assert_eq!(virtualizer.scroll_offset(), 0);
    }

    #[test]
    fn fully_visible_rows_ignores_partial_rows() {
        let mut virtualizer = virtualizer(20, 5, 0);
        virtualizer.record_height(4, 3);
        // Rows 0..=3 fit, row 4 is cut off at the bottom.
        assert_eq!(virtualizer.fully_visible_rows(), 4);
    }
}
