//! # Observer Hooks
//!
//! Notifications for a host that mirrors the automaton elsewhere, such as a
//! renderer that re-uploads the rule table when it changes.

use taeca_core::rule_info::RuleInfo;

/// Receives automaton events. Every method defaults to doing nothing.
pub trait AutomatonObserver: Send {
    /// The rule table was invalidated (new rule number, random rule, or
    /// new `r`/`k`). `info` is the parameters it will be rebuilt with.
    fn on_ruleset_changed(&mut self, info: RuleInfo) {
        let _ = info;
    }

    /// The stepper went back to row 0 with a fresh seed row
    fn on_stepper_reset(&mut self, width: usize) {
        let _ = width;
    }
}

/// Logs every event at info level
pub struct LoggingObserver;

impl AutomatonObserver for LoggingObserver {
    fn on_ruleset_changed(&mut self, info: RuleInfo) {
        tracing::info!(
            "Ruleset changed: r={} k={} ({} entries)",
            info.r(),
            info.k(),
            info.table_size()
        );
    }

    fn on_stepper_reset(&mut self, width: usize) {
        tracing::info!("Stepper reset ({} columns)", width);
    }
}
