//! # Row Kernels
//!
//! Implementations of the `RowKernel` trait: a rayon backend parallel over
//! columns and a sequential reference.

mod cpu;
mod scalar;

pub use cpu::CpuBackend;
pub use scalar::ScalarBackend;

use taeca_core::error::{TaecaError, TaecaResult};
use taeca_core::ruleset::Ruleset;

/// Shape checks shared by every backend
pub(crate) fn check_rows(current: &[u32], next: &[u32]) -> TaecaResult<()> {
    if current.is_empty() {
        return Err(TaecaError::invalid_state("cannot step an empty row"));
    }
    if current.len() != next.len() {
        return Err(TaecaError::invalid_state(format!(
            "row buffers differ in width: {} vs {}",
            current.len(),
            next.len()
        )));
    }
    Ok(())
}

/// Output symbol for one column
///
/// Reads the `2r` cells starting at `column - r + offset` (wrapping) and
/// folds them most significant first: `index = index * k + cell`.
#[inline]
pub(crate) fn cell_output(
    current: &[u32],
    column: usize,
    offset: usize,
    ruleset: &Ruleset,
) -> TaecaResult<u32> {
    let width = current.len();
    let info = ruleset.info();
    let r = info.r() as usize;
    let k = info.k() as usize;

    let mut pos = (column + offset + width - r % width) % width;
    let mut index = 0usize;
    for _ in 0..info.neighborhood_width() {
        index = index * k + current[pos] as usize;
        pos += 1;
        if pos == width {
            pos = 0;
        }
    }

    ruleset.symbols().get(index).copied().ok_or_else(|| {
        TaecaError::invalid_state(format!(
            "neighborhood index {} outside a {}-entry ruleset (cell symbol not below k={})",
            index,
            ruleset.len(),
            k
        ))
    })
}
