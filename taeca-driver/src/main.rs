//! TAECA - headless driver
//!
//! Runs the automaton from environment configuration and prints the grid.
//!
//! ```text
//! taeca [RULE_NUMBER]
//! ```

use tracing::{error, info, warn, Level};

use taeca_core::TaecaConfig;
use taeca_driver::render::render_rows;
use taeca_driver::{Automaton, LoggingObserver};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("TAECA v{}", VERSION);

    let config = match TaecaConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let mut automaton = match Automaton::new(config) {
        Ok(automaton) => automaton,
        Err(e) => {
            error!("Cannot start: {}", e);
            std::process::exit(1);
        }
    };
    automaton.add_observer(Box::new(LoggingObserver));

    if let Some(rule) = std::env::args().nth(1) {
        match automaton.set_rule_number(&rule) {
            Ok(()) => {}
            Err(e) if e.is_user_facing() => warn!("Ignoring rule number {:?}: {}", rule, e),
            Err(e) => {
                error!("Cannot apply rule number: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = run(&mut automaton) {
        error!("Stopped: {}", e);
        std::process::exit(1);
    }
}

fn run(automaton: &mut Automaton) -> taeca_core::TaecaResult<()> {
    let mut frames = 0u64;
    while !automaton.is_done() {
        automaton.frame()?;
        frames += 1;
    }

    let stats = automaton.stepper().stats();
    info!(
        "{} rows in {} frames ({} cells, {}us in {} backend)",
        automaton.current_row(),
        frames,
        stats.cells_computed,
        stats.total_time_us,
        automaton.stepper().backend_name()
    );

    match automaton.history() {
        Some(rows) => print!("{}", render_rows(rows, automaton.width())),
        None => println!("{}", render_rows(automaton.current(), automaton.width())),
    }

    info!("Rule number: {}", automaton.get_rule_number()?);
    Ok(())
}
