//! # TAECA Compute
//!
//! Row kernels and the stepper that drives them.
//!
//! This crate provides two backends:
//! - **CPU**: Uses Rayon, parallel over the columns of a row (wide rows)
//! - **Scalar**: One column at a time (narrow rows, reference results)
//!
//! ## Backend Selection
//!
//! Set `TCA_BACKEND` environment variable:
//! - `cpu` - Force the Rayon backend
//! - `scalar` - Force the sequential backend
//! - `auto` (default) - Rayon once the row is at least `parallel_threshold` wide

pub mod backend;
pub mod mirror;
pub mod stepper;

pub use backend::{CpuBackend, ScalarBackend};
pub use mirror::{RuleInfoUniform, RulesetBuffer};
pub use stepper::{SimulationStepper, StepOutcome, StepperState};

use taeca_core::config::{ComputeBackendType, TaecaConfig};
use taeca_core::error::TaecaResult;
use taeca_core::traits::RowKernel;

/// Create the appropriate row kernel based on configuration
pub fn create_backend(config: &TaecaConfig) -> TaecaResult<Box<dyn RowKernel>> {
    match config.compute.backend {
        ComputeBackendType::Auto => {
            if config.grid.width >= config.compute.parallel_threshold {
                tracing::info!(
                    "Using CPU backend (Rayon) for {}-cell rows",
                    config.grid.width
                );
                Ok(Box::new(CpuBackend::new(config)?))
            } else {
                tracing::info!(
                    "Using scalar backend for {}-cell rows (parallel from {})",
                    config.grid.width,
                    config.compute.parallel_threshold
                );
                Ok(Box::new(ScalarBackend::new()))
            }
        }
        ComputeBackendType::Cpu => {
            tracing::info!("Using CPU backend (Rayon)");
            Ok(Box::new(CpuBackend::new(config)?))
        }
        ComputeBackendType::Scalar => {
            tracing::info!("Using scalar backend");
            Ok(Box::new(ScalarBackend::new()))
        }
    }
}
