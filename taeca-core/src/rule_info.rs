//! # Rule Info
//!
//! Neighborhood radius `r` and state count `k`. A neighborhood is `2r`
//! cells wide, so the rule table has `k^(2r)` entries.

use serde::{Deserialize, Serialize};

use crate::error::{TaecaError, TaecaResult};

/// Bytes per rule table entry (symbols are stored as u32)
pub const SYMBOL_BYTE_WIDTH: u64 = 4;

/// Radius and state count of a rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleInfo {
    r: u32,
    k: u32,
}

impl RuleInfo {
    /// Validate `r` and `k` against the capacity ceiling (in bytes)
    pub fn new(r: u32, k: u32, capacity_ceiling: u64) -> TaecaResult<Self> {
        if r == 0 || k < 2 {
            return Err(TaecaError::InvalidRuleInfo { r, k });
        }
        let required_bytes = Self::table_bytes(r, k);
        match required_bytes {
            Some(bytes) if bytes <= capacity_ceiling => Ok(Self { r, k }),
            _ => Err(TaecaError::CapacityExceeded {
                r,
                k,
                required_bytes: required_bytes.unwrap_or(u64::MAX),
                ceiling: capacity_ceiling,
            }),
        }
    }

    /// Neighborhood radius
    pub fn r(&self) -> u32 {
        self.r
    }

    /// Number of states
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Cells read per neighborhood
    pub fn neighborhood_width(&self) -> usize {
        2 * self.r as usize
    }

    /// Entries in the rule table, `k^(2r)`
    pub fn table_size(&self) -> usize {
        // Checked in `new`: fits in bytes below the ceiling
        (self.k as usize).pow(2 * self.r)
    }

    /// Rule table size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.table_size() as u64 * SYMBOL_BYTE_WIDTH
    }

    /// `k^(2r) * SYMBOL_BYTE_WIDTH`, or None on overflow
    fn table_bytes(r: u32, k: u32) -> Option<u64> {
        let exponent = r.checked_mul(2)?;
        (k as u64)
            .checked_pow(exponent)?
            .checked_mul(SYMBOL_BYTE_WIDTH)
    }
}

/// Owns the current rule parameters and the ceiling they are checked against
#[derive(Clone, Debug)]
pub struct RuleParameters {
    info: RuleInfo,
    capacity_ceiling: u64,
}

impl RuleParameters {
    /// Start from validated initial parameters
    pub fn new(r: u32, k: u32, capacity_ceiling: u64) -> TaecaResult<Self> {
        Ok(Self {
            info: RuleInfo::new(r, k, capacity_ceiling)?,
            capacity_ceiling,
        })
    }

    /// Current parameters
    pub fn info(&self) -> RuleInfo {
        self.info
    }

    /// Ceiling in bytes
    pub fn capacity_ceiling(&self) -> u64 {
        self.capacity_ceiling
    }

    /// Replace `r` and `k`. On error the previous values stay.
    ///
    /// Returns true if the values changed.
    pub fn set_rr_k(&mut self, r: u32, k: u32) -> TaecaResult<bool> {
        let next = RuleInfo::new(r, k, self.capacity_ceiling)?;
        let changed = next != self.info;
        self.info = next;
        Ok(changed)
    }
}
