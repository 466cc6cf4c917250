//! Sliding window of past audio rows that scrolls energy across the grid.

use std::collections::VecDeque;

/// Fraction of the spectrum spread across the grid (top bins are mostly noise)
pub const SPECTRUM_COVERAGE: f32 = 0.8;

/// Fixed-capacity history of normalized energy rows, newest first
#[derive(Debug, Clone)]
pub struct TerrainHistory {
    rows: VecDeque<Vec<f32>>,
    cols: usize,
}

impl TerrainHistory {
    /// `rows` all-zero rows of `cols` values each
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut history = Self {
            rows: VecDeque::with_capacity(rows),
            cols,
        };
        history.reset(rows, cols);
        history
    }

    /// Discard everything and refill with zeros at a new shape
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.cols = cols;
        self.rows.clear();
        self.rows.extend((0..rows).map(|_| vec![0.0; cols]));
    }

    /// Number of rows (constant between resets)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values per row
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `index`, 0 being the most recent
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Rows from newest to oldest
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Evict the oldest row and insert `row` at the front
    ///
    /// Rows of the wrong length are truncated or zero-extended to `cols`.
    pub fn push(&mut self, mut row: Vec<f32>) {
        if self.rows.is_empty() {
            return;
        }
        row.resize(self.cols, 0.0);
        self.rows.pop_back();
        self.rows.push_front(row);
    }

    /// Push the row derived from a frequency snapshot (`None` = silence)
    ///
    /// Reuses the evicted row's allocation.
    pub fn push_snapshot(&mut self, snapshot: Option<&[u8]>) {
        let Some(mut row) = self.rows.pop_back() else {
            return;
        };
        fill_row_from_snapshot(&mut row, snapshot);
        self.rows.push_front(row);
    }
}

/// Frequency bin sampled for column `x` of `cols`
pub fn bin_for_column(x: usize, cols: usize, snapshot_len: usize) -> usize {
    ((x as f32 / cols as f32) * snapshot_len as f32 * SPECTRUM_COVERAGE).floor() as usize
}

/// Overwrite `row` with normalized energies (0.0..=1.0) from `snapshot`
///
/// Out-of-range bins read as zero; `None` gives an all-zero row.
pub fn fill_row_from_snapshot(row: &mut [f32], snapshot: Option<&[u8]>) {
    let cols = row.len();
    match snapshot {
        Some(bins) => {
            for (x, value) in row.iter_mut().enumerate() {
                let bin = bin_for_column(x, cols, bins.len());
                *value = bins.get(bin).copied().unwrap_or(0) as f32 / 255.0;
            }
        }
        None => row.fill(0.0),
    }
}
