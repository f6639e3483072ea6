//! # TAECA Core
//!
//! Core types for a one-dimensional cellular automaton whose rule tables are
//! addressed by arbitrarily large rule numbers.
//!
//! - **RuleInfo**: radius `r` and state count `k`, checked against a capacity
//!   ceiling
//! - **Ruleset**: the `k^(2r)`-entry rule table
//! - **Codec**: rule number <-> rule table, in machine-word chunks
//! - **Seeds**: random rule material and row 0 patterns
//! - **Graph**: lazily rebuilt resources with explicit invalidation
//!
//! The compute backends and the stepper live in `taeca-compute`.

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod rule_info;
pub mod ruleset;
pub mod seed;
pub mod traits;

// Re-export main types at crate root
pub use config::{ComputeBackendType, TaecaConfig};
pub use error::{TaecaError, TaecaResult};
pub use graph::{DependencyGraph, Inputs, NodeId, ResourceKey};
pub use rule_info::{RuleInfo, RuleParameters, SYMBOL_BYTE_WIDTH};
pub use ruleset::{RuleChoice, Ruleset};
pub use seed::{RandomSeedSource, SeedMaterial, SeedPattern};
pub use traits::*;

pub use num_bigint::BigUint;
