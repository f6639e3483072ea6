//! # Simulation Stepper
//!
//! Ping-pong row buffers advanced one generation at a time.
//!
//! ## States
//!
//! ```text
//! Uninitialized --reset--> Ready --step--> Stepping --step--> ... --> Done
//!                            ^                                         |
//!                            +-----------------reset-------------------+
//! ```
//!
//! `current_row` counts completed generations and never passes
//! `max_height`. Odd rows shift the neighborhood window right by one cell so
//! that an even radius window stays centred over two generations.

use taeca_core::config::GridConfig;
use taeca_core::error::{TaecaError, TaecaResult};
use taeca_core::rule_info::RuleInfo;
use taeca_core::ruleset::Ruleset;
use taeca_core::traits::{BackendStats, RowKernel};

/// Lifecycle of the stepper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepperState {
    /// No seed row yet
    Uninitialized,
    /// Seeded, nothing computed
    Ready,
    /// Some rows computed, more allowed
    Stepping,
    /// `max_height` rows computed
    Done,
}

/// Result of a single step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new row was computed; `row` is the new `current_row`
    Advanced { row: usize },
    /// Nothing to do, the grid is full
    AlreadyDone,
}

/// Two row buffers, a cursor, and the kernel that advances them
pub struct SimulationStepper {
    buffers: [Vec<u32>; 2],
    /// Index of the buffer holding `current_row`
    front: usize,
    current_row: usize,
    max_height: usize,
    seeded: bool,
    /// Parameters of the rows computed since the last reset
    stepping_info: Option<RuleInfo>,
    /// Computed rows, at most `width * max_height`, grown row by row
    history: Option<Vec<u32>>,
    record_history: bool,
    backend: Box<dyn RowKernel>,
}

impl SimulationStepper {
    /// Create an unseeded stepper
    pub fn new(max_height: usize, record_history: bool, backend: Box<dyn RowKernel>) -> Self {
        Self {
            buffers: [Vec::new(), Vec::new()],
            front: 0,
            current_row: 0,
            max_height,
            seeded: false,
            stepping_info: None,
            history: None,
            record_history,
            backend,
        }
    }

    /// Start over from `seed_row`. Its length becomes the row width.
    ///
    /// A width whose full grid could not be addressed is rejected before
    /// anything changes.
    pub fn reset(&mut self, seed_row: &[u32]) -> TaecaResult<()> {
        if seed_row.is_empty() {
            return Err(TaecaError::invalid_state("seed row is empty"));
        }
        let width = seed_row.len();
        if self.record_history {
            GridConfig::grid_cells(width, self.max_height)?;
        }

        self.front = 0;
        self.buffers[0].clear();
        self.buffers[0].extend_from_slice(seed_row);
        self.buffers[1].clear();
        self.buffers[1].resize(width, 0);

        self.current_row = 0;
        self.seeded = true;
        self.stepping_info = None;
        self.history = if self.record_history {
            Some(Vec::new())
        } else {
            None
        };

        tracing::debug!("Stepper reset: width {}, max height {}", width, self.max_height);
        Ok(())
    }

    /// Compute one row
    pub fn step_one(&mut self, ruleset: &Ruleset) -> TaecaResult<StepOutcome> {
        match self.state() {
            StepperState::Uninitialized => {
                return Err(TaecaError::invalid_state("stepper has no seed row, call reset first"))
            }
            StepperState::Done => return Ok(StepOutcome::AlreadyDone),
            StepperState::Ready | StepperState::Stepping => {}
        }

        let info = ruleset.info();
        match self.stepping_info {
            Some(previous) if previous != info => {
                return Err(TaecaError::invalid_state(format!(
                    "ruleset changed from r={} k={} to r={} k={} without a reset",
                    previous.r(),
                    previous.k(),
                    info.r(),
                    info.k()
                )));
            }
            Some(_) => {}
            None => self.stepping_info = Some(info),
        }

        let offset = self.current_row % 2;
        let (first, second) = self.buffers.split_at_mut(1);
        let (current, next) = if self.front == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };
        self.backend.compute_row(current, next, ruleset, offset)?;

        // The row is complete: advance and swap
        self.current_row += 1;
        self.front ^= 1;
        if let Some(history) = self.history.as_mut() {
            history.extend_from_slice(&self.buffers[self.front]);
        }

        Ok(StepOutcome::Advanced {
            row: self.current_row,
        })
    }

    /// Compute up to `n` rows, stopping early at `max_height`
    ///
    /// Returns the number of rows computed.
    pub fn step_many(&mut self, n: usize, ruleset: &Ruleset) -> TaecaResult<usize> {
        let mut advanced = 0;
        while advanced < n {
            match self.step_one(ruleset)? {
                StepOutcome::Advanced { .. } => advanced += 1,
                StepOutcome::AlreadyDone => break,
            }
        }
        Ok(advanced)
    }

    /// Current lifecycle state
    pub fn state(&self) -> StepperState {
        if !self.seeded {
            StepperState::Uninitialized
        } else if self.current_row >= self.max_height {
            StepperState::Done
        } else if self.current_row == 0 {
            StepperState::Ready
        } else {
            StepperState::Stepping
        }
    }

    /// Generations computed since the last reset
    pub fn current_row(&self) -> usize {
        self.current_row
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Row width, 0 before the first reset
    pub fn width(&self) -> usize {
        self.buffers[self.front].len()
    }

    /// The row at `current_row`
    pub fn current(&self) -> &[u32] {
        &self.buffers[self.front]
    }

    /// Computed rows in order, row-major, if history is recorded
    pub fn history(&self) -> Option<&[u32]> {
        self.history.as_deref()
    }

    /// Kernel counters
    pub fn stats(&self) -> BackendStats {
        self.backend.stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
