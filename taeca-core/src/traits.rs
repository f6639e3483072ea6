//! # Traits
//!
//! - `RowKernel`: computes one generation of the automaton from the previous
//!   one. Implemented by the sequential and parallel backends in
//!   `taeca-compute`.

use crate::error::TaecaResult;
use crate::ruleset::Ruleset;

/// One-row transition over a ring of cells
///
/// `next[c]` is the rule table entry for the neighborhood of `2r` cells
/// starting at `c - r + offset`, wrapping around the row. Implementations
/// must agree cell for cell.
pub trait RowKernel: Send + Sync {
    /// Compute `next` from `current`
    ///
    /// Both slices have the same non-zero length, and every symbol in
    /// `current` is below the ruleset's `k`.
    fn compute_row(
        &mut self,
        current: &[u32],
        next: &mut [u32],
        ruleset: &Ruleset,
        offset: usize,
    ) -> TaecaResult<()>;

    /// Counters since creation
    fn stats(&self) -> BackendStats;

    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;
}

/// Statistics from a row kernel
#[derive(Clone, Debug, Default)]
pub struct BackendStats {
    /// Rows computed
    pub rows_computed: u64,

    /// Cells written
    pub cells_computed: u64,

    /// Time spent in the last row (microseconds)
    pub last_row_time_us: u64,

    /// Time spent in all rows (microseconds)
    pub total_time_us: u64,
}

impl BackendStats {
    /// Account for one row of `width` cells
    pub fn record_row(&mut self, width: usize, elapsed_us: u64) {
        self.rows_computed += 1;
        self.cells_computed += width as u64;
        self.last_row_time_us = elapsed_us;
        self.total_time_us += elapsed_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_row() {
        let mut stats = BackendStats::default();
        stats.record_row(64, 10);
        stats.record_row(64, 5);
        assert_eq!(stats.rows_computed, 2);
        assert_eq!(stats.cells_computed, 128);
        assert_eq!(stats.last_row_time_us, 5);
        assert_eq!(stats.total_time_us, 15);
    }
}
