//! CLI wiring for the design-space explorer.

use crate::evaluator::AnalyticEvaluator;
use crate::session::{ExplorationSession, SessionOptions, DEFAULT_BASELINE};
use anyhow::{Context, Result};
use archdse_explorer::{
    CacheValidator, ExplorerConfig, LatencyDeriver, Objective, TraversalMode,
};
use archdse_space::{Configuration, DesignSpace};
use clap::{Parser, Subcommand};
#[cfg(test)]
use clap::CommandFactory;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "archdse", about = "Coordinate-descent processor/cache design-space explorer")]
pub struct Cli {
    /// JSON design space to use instead of the built-in one.
    #[arg(long)]
    pub space: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ObjectiveArg {
    Exec,
    Edp,
}

impl From<ObjectiveArg> for Objective {
    fn from(value: ObjectiveArg) -> Objective {
        match value {
            ObjectiveArg::Exec => Objective::ExecutionTime,
            ObjectiveArg::Edp => Objective::EnergyDelay,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    SinglePass,
    UntilFixedPoint,
}

impl From<ModeArg> for TraversalMode {
    fn from(value: ModeArg) -> TraversalMode {
        match value {
            ModeArg::SinglePass => TraversalMode::SinglePass,
            ModeArg::UntilFixedPoint => TraversalMode::UntilFixedPoint,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a budgeted exploration against the analytic cost model.
    Explore {
        #[arg(long, value_enum, default_value = "exec")]
        objective: ObjectiveArg,
        #[arg(long, default_value_t = 1000)]
        budget: usize,
        #[arg(long, value_enum, default_value = "until-fixed-point")]
        mode: ModeArg,
        #[arg(long, default_value_t = 16)]
        max_traversals: usize,
        #[arg(long, default_value = DEFAULT_BASELINE)]
        baseline: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration against the cache-hierarchy rules of the
    /// default cache layout; field count and ranges come from --space.
    Validate { configuration: String },
    /// Print the latency indices derived for a configuration using the
    /// default cache layout and latency table (--space is not consulted).
    Latencies { configuration: String },
    /// Write the design space as JSON.
    DumpSpace {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_space(path: Option<PathBuf>) -> Result<DesignSpace> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading design space");
            DesignSpace::load_from_file(&path)
        }
        None => Ok(DesignSpace::default()),
    }
}

fn parse_configuration(text: &str) -> Result<Configuration> {
    text.parse()
        .with_context(|| format!("could not parse configuration '{}'", text))
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli { space, command } = cli;
    let space = load_space(space)?;

    match command {
        Command::Explore {
            objective,
            budget,
            mode,
            max_traversals,
            baseline,
            output,
        } => {
            let options = SessionOptions {
                budget,
                objective: objective.into(),
                explorer: ExplorerConfig {
                    mode: mode.into(),
                    max_traversals,
                },
            };
            let baseline = parse_configuration(&baseline)?;
            let mut session = ExplorationSession::new(space, AnalyticEvaluator::default(), options)?;
            let report = session.run(baseline)?;

            println!(
                "objective={:?}, evaluations={}, traversals={}, stop={:?}",
                report.objective, report.evaluations, report.traversals, report.stop
            );
            println!(
                "baseline: {} exec={:.3}ms edp={:.3}",
                report.baseline.configuration,
                report.baseline.measurement.execution_time,
                report.baseline.measurement.edp()
            );
            println!(
                "best exec: {} exec={:.3}ms",
                report.best_exec.configuration, report.best_exec.measurement.execution_time
            );
            println!(
                "best edp: {} edp={:.3}",
                report.best_edp.configuration,
                report.best_edp.measurement.edp()
            );

            if let Some(path) = output {
                report.save(&path)?;
                info!(path = %path.display(), "report written");
            }
        }
        Command::Validate { configuration } => {
            let config = parse_configuration(&configuration)?;
            match CacheValidator::default().violation(&space, &config) {
                None => println!("valid"),
                Some(violation) => println!("invalid: {}", violation),
            }
        }
        Command::Latencies { configuration } => {
            let config = parse_configuration(&configuration)?;
            let deriver = LatencyDeriver::default();
            let lat = deriver.latencies(&config);
            let table = deriver.table();
            println!(
                "dl1={} ({} cycles) il1={} ({} cycles) ul2={} ({} cycles)",
                lat.dl1,
                table.l1_cycles(lat.dl1),
                lat.il1,
                table.l1_cycles(lat.il1),
                lat.ul2,
                table.ul2_cycles(lat.ul2)
            );
        }
        Command::DumpSpace { output } => match output {
            Some(path) => space.save_to_file(&path)?,
            None => println!("{}", serde_json::to_string_pretty(&space)?),
        },
    }
    Ok(())
}
