mod demo;
mod logging;
mod model_file;

use clap::{Parser, Subcommand, ValueEnum};
use milp_solver::{Model, NodeEvent, NodeOutcome, SolutionStatus, Solver};
use serde::Serialize;
use std::path::PathBuf;

use crate::logging::{LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(name = "milp")]
#[command(about = "Solve mixed-integer linear programs by simplex and branch-and-bound", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// Log format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

impl Cli {
    fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a JSON model file
    Solve {
        /// The model file
        file: PathBuf,
        /// Ignore integrality and solve only the LP relaxation
        #[arg(long)]
        relax: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Print one line per branch-and-bound node to stderr
        #[arg(short, long)]
        progress: bool,
        /// Simplex tolerance
        #[arg(long)]
        tolerance: Option<f64>,
        /// Integrality tolerance
        #[arg(long)]
        int_tolerance: Option<f64>,
    },
    /// Solve one of the built-in example problems
    Demo {
        #[arg(value_enum)]
        problem: DemoProblem,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoProblem {
    /// Bounded two-row LP
    Lp,
    /// Small set-packing MILP
    Milp,
}

#[derive(Serialize)]
struct Report<'a> {
    status: SolutionStatus,
    x: Option<&'a [f64]>,
    z: Option<f64>,
    nodes: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    cli.logging().init();

    match cli.command {
        Commands::Solve { file, relax, format, progress, tolerance, int_tolerance } => {
            let mut model = match model_file::load(&file) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let mut solver = Solver::new();
            if let Some(tol) = tolerance {
                solver = solver.with_tolerance(tol);
            }
            if let Some(tol) = int_tolerance {
                solver = solver.with_integrality_tolerance(tol);
            }

            let nodes = run(&solver, &mut model, relax, progress);
            report(&model, nodes, format);
        }
        Commands::Demo { problem, format } => {
            let (mut model, relax) = match problem {
                DemoProblem::Lp => (demo::bounded_lp(), true),
                DemoProblem::Milp => (demo::set_packing(), false),
            };
            let nodes = run(&Solver::new(), &mut model, relax, false);
            report(&model, nodes, format);
        }
    }
}

/// Solve as LP or MILP; returns the node count for MILP runs
fn run(solver: &Solver, model: &mut Model, relax: bool, progress: bool) -> Option<usize> {
    let result = if relax || model.num_integers() == 0 {
        solver.solve(model).map(|_| None)
    } else if progress {
        let mut print_node = |event: &NodeEvent| {
            let outcome = match event.outcome {
                NodeOutcome::Infeasible => "infeasible, fathomed".to_string(),
                NodeOutcome::Unbounded => "unbounded".to_string(),
                NodeOutcome::FathomedByBound => "worse than incumbent, fathomed".to_string(),
                NodeOutcome::IntegerFeasible { improved: true } => "integer feasible, new incumbent".to_string(),
                NodeOutcome::IntegerFeasible { improved: false } => "integer feasible".to_string(),
                NodeOutcome::Branched { index, value } => format!("branching on x[{}] = {:.4}", index, value),
            };
            eprintln!(
                "node {:>5}  depth {:>3}  open {:>5}  z {:>12}  best {:>12}  {}",
                event.node,
                event.depth,
                event.open,
                event.z.map_or("-".to_string(), |z| format!("{:.6}", z)),
                event.incumbent.map_or("-".to_string(), |z| format!("{:.6}", z)),
                outcome
            );
        };
        solver.solve_milp_with_observer(model, &mut print_node).map(|stats| Some(stats.nodes))
    } else {
        solver.solve_milp(model).map(|stats| Some(stats.nodes))
    };

    match result {
        Ok(nodes) => nodes,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    }
}

fn report(model: &Model, nodes: Option<usize>, format: Format) {
    match format {
        Format::Json => {
            let report = Report {
                status: model.status,
                x: model.x.as_deref(),
                z: model.z,
                nodes,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Format::Pretty => {
            println!("Status: {}", model.status);
            if let Some(nodes) = nodes {
                println!("Nodes: {}", nodes);
            }
            if let (Some(x), Some(z)) = (&model.x, model.z) {
                println!("Objective: {:.6}", z);
                println!();
                println!("Variables:");
                for (j, value) in x.iter().enumerate() {
                    let kind = if model.x_int[j] { "int" } else { "" };
                    println!("  x[{:>3}] {:14.6} {}", j, value, kind);
                }
            }
        }
    }

    match model.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Infeasible | SolutionStatus::Unbounded | SolutionStatus::Unsolved => {
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_is_checked() {
        let cli = Cli::try_parse_from(["milp", "--log-format", "json", "demo", "lp"]).unwrap();
        assert_eq!(
            cli.logging(),
            LoggingConfig { level: "warn".to_string(), format: LogFormat::Json }
        );

        let cli = Cli::try_parse_from(["milp", "demo", "milp"]).unwrap();
        assert_eq!(cli.logging().format, LogFormat::Pretty);

        assert!(Cli::try_parse_from(["milp", "--log-format", "xml", "demo", "lp"]).is_err());
    }
}
