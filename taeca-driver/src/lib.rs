//! # TAECA Driver
//!
//! The `Automaton` context ties the rule parameters, the dependency graph of
//! derived resources, and the stepper together behind explicit setters.

pub mod automaton;
pub mod hooks;
pub mod render;

pub use automaton::Automaton;
pub use hooks::{AutomatonObserver, LoggingObserver};
