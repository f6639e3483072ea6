//! # Automaton
//!
//! The context a host drives. It owns:
//!
//! - the rule parameters and the capacity ceiling they are checked against
//! - a dependency graph with three sources (rule info, rule choice, row
//!   width) and the resources derived from them (rule table, seed row, GPU
//!   layouts)
//! - the stepper and its row kernel
//!
//! Setters validate first and only then write a source, so a rejected call
//! leaves every resource as it was. Derived resources rebuild on the next
//! read.

use std::sync::Arc;

use taeca_compute::{create_backend, RuleInfoUniform, RulesetBuffer, SimulationStepper, StepperState};
use taeca_core::codec;
use taeca_core::config::GridConfig;
use taeca_core::{
    BigUint, DependencyGraph, RandomSeedSource, ResourceKey, RuleChoice, RuleInfo, RuleParameters,
    Ruleset, TaecaConfig, TaecaError, TaecaResult,
};

use crate::hooks::AutomatonObserver;

/// Graph handles
struct Keys {
    rule_info: ResourceKey<RuleInfo>,
    rule_choice: ResourceKey<RuleChoice>,
    width: ResourceKey<usize>,
    ruleset: ResourceKey<Ruleset>,
    seed_row: ResourceKey<Vec<u32>>,
    rule_uniform: ResourceKey<RuleInfoUniform>,
    ruleset_buffer: ResourceKey<RulesetBuffer>,
}

/// A running automaton
pub struct Automaton {
    config: TaecaConfig,
    params: RuleParameters,
    seeds: RandomSeedSource,
    graph: DependencyGraph,
    keys: Keys,
    stepper: SimulationStepper,
    observers: Vec<Box<dyn AutomatonObserver>>,
}

impl Automaton {
    /// Build from configuration, drawing random rules from OS entropy
    pub fn new(config: TaecaConfig) -> TaecaResult<Self> {
        let seeds = RandomSeedSource::new(config.rule.random_kernel_size);
        Self::with_seed_source(config, seeds)
    }

    /// Build with an explicit random rule source
    pub fn with_seed_source(config: TaecaConfig, seeds: RandomSeedSource) -> TaecaResult<Self> {
        config.validate()?;

        let params = RuleParameters::new(
            config.rule.initial_r,
            config.rule.initial_k,
            config.rule.capacity_ceiling,
        )?;
        let initial = codec::parse_rule_number(&config.rule.initial_rule_number)?;
        codec::check_range(&initial, params.info())?;

        let mut graph = DependencyGraph::new();
        let keys = Self::build_graph(
            &mut graph,
            &config,
            params.info(),
            RuleChoice::Number(Arc::new(initial)),
        )?;

        let backend = create_backend(&config)?;
        let stepper = SimulationStepper::new(config.grid.max_height, config.grid.record_history, backend);

        tracing::info!(
            "Automaton: r={} k={} rule {}, {}x{} grid, {} backend",
            params.info().r(),
            params.info().k(),
            config.rule.initial_rule_number.trim(),
            config.grid.width,
            config.grid.max_height,
            stepper.backend_name()
        );

        let mut automaton = Self {
            config,
            params,
            seeds,
            graph,
            keys,
            stepper,
            observers: Vec::new(),
        };
        automaton.reset()?;
        Ok(automaton)
    }

    fn build_graph(
        graph: &mut DependencyGraph,
        config: &TaecaConfig,
        info: RuleInfo,
        choice: RuleChoice,
    ) -> TaecaResult<Keys> {
        let rule_info = graph.add_source("rule_info", info);
        let rule_choice = graph.add_source("rule_choice", choice);
        let width = graph.add_source("width", config.grid.width);

        let ruleset = graph.add_derived("ruleset", &[rule_info.id(), rule_choice.id()], move |i| {
            let info = *i.get(rule_info)?;
            let ruleset = i.get(rule_choice)?.resolve(info)?;
            tracing::debug!("Built {}-entry ruleset", ruleset.len());
            Ok(ruleset)
        })?;

        let pattern = config.grid.seed_pattern;
        let seed_row = graph.add_derived("seed_row", &[width.id(), rule_info.id()], move |i| {
            Ok(pattern.build_row(*i.get(width)?, i.get(rule_info)?.k()))
        })?;

        let rule_uniform = graph.add_derived("rule_uniform", &[rule_info.id()], move |i| {
            Ok(RuleInfoUniform::from(*i.get(rule_info)?))
        })?;

        let ruleset_buffer = graph.add_derived("ruleset_buffer", &[ruleset.id()], move |i| {
            Ok(RulesetBuffer::from(i.get(ruleset)?))
        })?;

        Ok(Keys {
            rule_info,
            rule_choice,
            width,
            ruleset,
            seed_row,
            rule_uniform,
            ruleset_buffer,
        })
    }

    /// Register an observer
    pub fn add_observer(&mut self, observer: Box<dyn AutomatonObserver>) {
        self.observers.push(observer);
    }

    // ------------------------------------------------------------------
    // Rule parameters
    // ------------------------------------------------------------------

    /// Change radius and state count
    ///
    /// Fails with `CapacityExceeded` if the table would not fit the ceiling;
    /// nothing changes in that case. On success a fresh random rule is drawn
    /// for the new table and the stepper restarts.
    pub fn set_rr_k(&mut self, r: u32, k: u32) -> TaecaResult<()> {
        let changed = match self.params.set_rr_k(r, k) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("Rejected r={} k={}: {}", r, k, e);
                return Err(e);
            }
        };
        if !changed {
            tracing::debug!("r={} k={} unchanged", r, k);
            return Ok(());
        }

        self.graph.set(self.keys.rule_info, self.params.info())?;
        self.request_new_random_rule()
    }

    /// Current radius and state count
    pub fn rule_info(&self) -> RuleInfo {
        self.params.info()
    }

    /// Capacity ceiling in bytes
    pub fn capacity_ceiling(&self) -> u64 {
        self.params.capacity_ceiling()
    }

    /// Switch to a new random rule for the current `r`/`k` and restart
    pub fn request_new_random_rule(&mut self) -> TaecaResult<()> {
        let material = self.seeds.draw();
        self.graph
            .set(self.keys.rule_choice, RuleChoice::Random(material))?;
        self.notify_ruleset_changed();
        self.reset()
    }

    /// Switch to the rule with this decimal number and restart
    ///
    /// Malformed text fails with `InvalidDigitLiteral`, a number with more
    /// digits than the table has entries fails with `OutOfRange`. Either way
    /// the rule is unchanged.
    pub fn set_rule_number(&mut self, text: &str) -> TaecaResult<()> {
        let number = codec::parse_rule_number(text)?;
        if let Err(e) = codec::check_range(&number, self.params.info()) {
            tracing::warn!("Rejected rule number: {}", e);
            return Err(e);
        }

        self.graph
            .set(self.keys.rule_choice, RuleChoice::Number(Arc::new(number)))?;
        self.notify_ruleset_changed();
        self.reset()
    }

    /// Rule number of the current table
    pub fn get_rule_number(&mut self) -> TaecaResult<BigUint> {
        Ok(codec::encode(self.ruleset()?))
    }

    /// The current rule table, rebuilt if stale
    pub fn ruleset(&mut self) -> TaecaResult<&Ruleset> {
        self.graph.read(self.keys.ruleset)
    }

    /// Successful rule table builds so far
    pub fn ruleset_rebuilds(&self) -> u64 {
        self.graph
            .rebuild_count(self.keys.ruleset.id())
            .unwrap_or_default()
    }

    /// Whether the rule table needs a rebuild before its next read
    pub fn ruleset_is_stale(&self) -> bool {
        self.graph
            .is_dirty(self.keys.ruleset.id())
            .unwrap_or(true)
    }

    /// `RuleInfo` uniform in GPU layout
    pub fn rule_uniform(&mut self) -> TaecaResult<RuleInfoUniform> {
        self.graph.read(self.keys.rule_uniform).copied()
    }

    /// Rule table in GPU layout
    pub fn ruleset_buffer(&mut self) -> TaecaResult<&RulesetBuffer> {
        self.graph.read(self.keys.ruleset_buffer)
    }

    // ------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------

    /// The host's row width changed
    ///
    /// A different width rebuilds the seed row and restarts the stepper. A
    /// width whose grid could not be addressed is rejected unchanged.
    pub fn canvas_resized(&mut self, new_width: usize) -> TaecaResult<()> {
        if new_width == 0 {
            return Err(TaecaError::config("row width must be at least 1"));
        }
        if new_width == self.width() {
            return Ok(());
        }
        GridConfig::grid_cells(new_width, self.config.grid.max_height)?;
        tracing::info!("Row width {} -> {}", self.width(), new_width);
        self.graph.set(self.keys.width, new_width)?;
        self.config.grid.width = new_width;
        self.reset()
    }

    /// Row width in cells
    pub fn width(&self) -> usize {
        self.config.grid.width
    }

    /// Restart from the seed row
    pub fn reset(&mut self) -> TaecaResult<()> {
        let seed_row = self.graph.read(self.keys.seed_row)?;
        self.stepper.reset(seed_row)?;
        let width = self.stepper.width();
        for observer in &mut self.observers {
            observer.on_stepper_reset(width);
        }
        Ok(())
    }

    /// Advance up to `rows_per_frame` rows
    ///
    /// Returns the number of rows computed, 0 once the grid is full.
    pub fn frame(&mut self) -> TaecaResult<usize> {
        self.step_many(self.config.grid.rows_per_frame)
    }

    /// Advance up to `n` rows, never past `max_height`
    pub fn step_many(&mut self, n: usize) -> TaecaResult<usize> {
        self.graph.refresh(self.keys.ruleset.id())?;
        let ruleset = self.graph.get(self.keys.ruleset)?;
        self.stepper.step_many(n, ruleset)
    }

    /// Generations computed since the last reset
    pub fn current_row(&self) -> usize {
        self.stepper.current_row()
    }

    pub fn state(&self) -> StepperState {
        self.stepper.state()
    }

    pub fn is_done(&self) -> bool {
        self.stepper.state() == StepperState::Done
    }

    /// The row at `current_row`
    pub fn current(&self) -> &[u32] {
        self.stepper.current()
    }

    /// Computed rows, row-major, when history is recorded
    pub fn history(&self) -> Option<&[u32]> {
        self.stepper.history()
    }

    pub fn stepper(&self) -> &SimulationStepper {
        &self.stepper
    }

    pub fn config(&self) -> &TaecaConfig {
        &self.config
    }

    fn notify_ruleset_changed(&mut self) {
        let info = self.params.info();
        for observer in &mut self.observers {
            observer.on_ruleset_changed(info);
        }
    }
}
