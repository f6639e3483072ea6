//! # Ruleset
//!
//! The flat rule table. Entry `i` is the output symbol for the neighborhood
//! whose base-`k` reading is `i`, and also digit `i` (least significant
//! first) of the rule number.

use std::sync::Arc;

use num_bigint::BigUint;

use crate::codec;
use crate::error::{TaecaError, TaecaResult};
use crate::rule_info::RuleInfo;
use crate::seed::SeedMaterial;

/// A rule table of `k^(2r)` symbols, each in `[0, k)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ruleset {
    info: RuleInfo,
    symbols: Vec<u32>,
}

impl Ruleset {
    /// All-zero table (rule number 0)
    pub fn zeroed(info: RuleInfo) -> Self {
        Self {
            info,
            symbols: vec![0; info.table_size()],
        }
    }

    /// Wrap an explicit table, checking its length and symbol range
    pub fn from_symbols(info: RuleInfo, symbols: Vec<u32>) -> TaecaResult<Self> {
        if symbols.len() != info.table_size() {
            return Err(TaecaError::invalid_state(format!(
                "ruleset has {} entries, r={} k={} needs {}",
                symbols.len(),
                info.r(),
                info.k(),
                info.table_size()
            )));
        }
        if let Some(pos) = symbols.iter().position(|&s| s >= info.k()) {
            return Err(TaecaError::invalid_state(format!(
                "ruleset entry {} is {}, not below k={}",
                pos,
                symbols[pos],
                info.k()
            )));
        }
        Ok(Self { info, symbols })
    }

    /// Used by the codec and the random fill, which uphold the invariants
    pub(crate) fn from_raw(info: RuleInfo, symbols: Vec<u32>) -> Self {
        debug_assert_eq!(symbols.len(), info.table_size());
        Self { info, symbols }
    }

    /// The parameters this table was built for
    pub fn info(&self) -> RuleInfo {
        self.info
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false: a table has at least k^2 entries
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Output symbol for a neighborhood index
    #[inline]
    pub fn lookup(&self, index: usize) -> u32 {
        self.symbols[index]
    }

    /// Whole table
    pub fn symbols(&self) -> &[u32] {
        &self.symbols
    }
}

/// Where the current rule table comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleChoice {
    /// An explicit rule number
    Number(Arc<BigUint>),
    /// A hash expansion of random seed words
    Random(SeedMaterial),
}

impl RuleChoice {
    /// Build the table for `info`
    ///
    /// A number that does not fit `info` fails with `OutOfRange`.
    pub fn resolve(&self, info: RuleInfo) -> TaecaResult<Ruleset> {
        match self {
            RuleChoice::Number(n) => codec::decode(n, info),
            RuleChoice::Random(material) => Ok(material.fill_ruleset(info)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(r: u32, k: u32) -> RuleInfo {
        RuleInfo::new(r, k, u64::MAX).unwrap()
    }

    #[test]
    fn test_from_symbols_checks_length() {
        assert!(Ruleset::from_symbols(info(1, 2), vec![0, 1, 1]).is_err());
        assert!(Ruleset::from_symbols(info(1, 2), vec![0, 1, 1, 0]).is_ok());
    }

    #[test]
    fn test_from_symbols_checks_range() {
        let err = Ruleset::from_symbols(info(1, 2), vec![0, 2, 1, 0]).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_zeroed() {
        let rs = Ruleset::zeroed(info(1, 3));
        assert_eq!(rs.len(), 9);
        assert!(rs.symbols().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_rule_choice_resolve() {
        let number = RuleChoice::Number(Arc::new(BigUint::from(6u32)));
        assert_eq!(number.resolve(info(1, 2)).unwrap().symbols(), &[0, 1, 1, 0]);

        // A 4-entry binary table holds rules 0..=15
        let too_big = RuleChoice::Number(Arc::new(BigUint::from(30u32)));
        assert!(matches!(too_big.resolve(info(1, 2)), Err(TaecaError::OutOfRange { .. })));

        let material = SeedMaterial::from_words(vec![3, 1, 4]).unwrap();
        let random = RuleChoice::Random(material.clone());
        assert_eq!(random.resolve(info(1, 3)).unwrap(), material.fill_ruleset(info(1, 3)));
    }
}
