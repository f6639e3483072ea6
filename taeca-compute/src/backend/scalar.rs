//! # Scalar Backend
//!
//! One column after another on the calling thread. Used for narrow rows,
//! where rayon's scheduling costs more than the row, and as the reference
//! the parallel backend is checked against.

use std::time::Instant;

use taeca_core::error::TaecaResult;
use taeca_core::ruleset::Ruleset;
use taeca_core::traits::{BackendStats, RowKernel};

use super::{cell_output, check_rows};

/// Sequential row kernel
#[derive(Default)]
pub struct ScalarBackend {
    stats: BackendStats,
}

impl ScalarBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowKernel for ScalarBackend {
    fn compute_row(
        &mut self,
        current: &[u32],
        next: &mut [u32],
        ruleset: &Ruleset,
        offset: usize,
    ) -> TaecaResult<()> {
        check_rows(current, next)?;
        let start = Instant::now();

        for (column, cell) in next.iter_mut().enumerate() {
            *cell = cell_output(current, column, offset, ruleset)?;
        }

        self.stats
            .record_row(current.len(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        self.stats.clone()
    }

    fn name(&self) -> &'static str {
        "Scalar"
    }
}
