//! # CPU Backend
//!
//! Parallel row computation using Rayon.
//!
//! Every column of the next row depends only on the current row, so the
//! columns are split across the pool. The parallel iterator returns once all
//! columns are written, which is the barrier before the stepper swaps rows.

use std::time::Instant;

use rayon::prelude::*;

use taeca_core::config::TaecaConfig;
use taeca_core::error::TaecaResult;
use taeca_core::ruleset::Ruleset;
use taeca_core::traits::{BackendStats, RowKernel};

use super::{cell_output, check_rows};

/// Smallest number of columns handed to one rayon task
const DEFAULT_MIN_COLUMNS_PER_TASK: usize = 256;

/// CPU row kernel using Rayon
pub struct CpuBackend {
    /// Columns per task lower bound
    min_columns_per_task: usize,

    /// Statistics
    stats: BackendStats,
}

impl CpuBackend {
    /// Create a new CPU backend
    pub fn new(config: &TaecaConfig) -> TaecaResult<Self> {
        let threads = rayon::current_num_threads().max(1);
        // Enough work per task to amortize scheduling on wide rows
        let min_columns_per_task = (config.grid.width / (threads * 4))
            .clamp(1, DEFAULT_MIN_COLUMNS_PER_TASK);

        tracing::debug!(
            "CPU backend: {} threads, at least {} columns per task",
            threads,
            min_columns_per_task
        );

        Ok(Self {
            min_columns_per_task,
            stats: BackendStats::default(),
        })
    }
}

impl RowKernel for CpuBackend {
    fn compute_row(
        &mut self,
        current: &[u32],
        next: &mut [u32],
        ruleset: &Ruleset,
        offset: usize,
    ) -> TaecaResult<()> {
        check_rows(current, next)?;
        let start = Instant::now();

        next.par_iter_mut()
            .enumerate()
            .with_min_len(self.min_columns_per_task)
            .try_for_each(|(column, cell)| -> TaecaResult<()> {
                *cell = cell_output(current, column, offset, ruleset)?;
                Ok(())
            })?;

        self.stats
            .record_row(current.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.stats.clone()
    }

    fn name(&self) -> &'static str {
        "CPU (Rayon)"
    }
}
