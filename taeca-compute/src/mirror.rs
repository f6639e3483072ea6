//! # GPU-Layout Mirrors
//!
//! Byte layouts a renderer can upload as-is: the rule parameters as a
//! uniform and the rule table as a storage buffer of little-endian `u32`.

use bytemuck::{Pod, Zeroable};

use taeca_core::rule_info::RuleInfo;
use taeca_core::ruleset::Ruleset;

/// Rule parameters (matches the shader's `RuleInfo` struct)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RuleInfoUniform {
    pub r: u32,
    pub k: u32,
}

impl RuleInfoUniform {
    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl From<RuleInfo> for RuleInfoUniform {
    fn from(info: RuleInfo) -> Self {
        Self {
            r: info.r(),
            k: info.k(),
        }
    }
}

/// The rule table as storage buffer contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulesetBuffer {
    bytes: Vec<u8>,
}

impl RulesetBuffer {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of `u32` entries
    pub fn len(&self) -> usize {
        self.bytes.len() / std::mem::size_of::<u32>()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&Ruleset> for RulesetBuffer {
    fn from(ruleset: &Ruleset) -> Self {
        let bytes: Vec<u8> = if cfg!(target_endian = "little") {
            bytemuck::cast_slice::<u32, u8>(ruleset.symbols()).to_vec()
        } else {
            ruleset
                .symbols()
                .iter()
                .flat_map(|s| s.to_le_bytes())
                .collect()
        };
        Self { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<RuleInfoUniform>(), 8);
        let uniform = RuleInfoUniform::from(RuleInfo::new(2, 3, u64::MAX).unwrap());
        assert_eq!(uniform.bytes(), &[2, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn test_ruleset_buffer_little_endian() {
        let info = RuleInfo::new(1, 2, u64::MAX).unwrap();
        let ruleset = Ruleset::from_symbols(info, vec![0, 1, 1, 0]).unwrap();
        let buffer = RulesetBuffer::from(&ruleset);
        assert_eq!(buffer.len(), 4);
        assert_eq!(&buffer.bytes()[..8], &[0, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(buffer.bytes().len() as u64, info.size_bytes());
    }
}
