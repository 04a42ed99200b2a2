use std::{path::PathBuf, thread, time::Duration};

use anyhow::anyhow;
use clap::Args;
use courier_optimizer::{
    json::types::JsonOptimizationRequest, result::OptimizationResult,
    solver::optimizer::Optimizer,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    file_utils::{read_json, write_json},
    parsers::{self, AlgorithmArg},
    table,
};

#[derive(Args)]
pub struct OptimizeArgs {
    /// The request to optimize
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Write the full result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overrides the request's solver time budget (e.g., "5s", "PT1M")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,

    #[arg(short, long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    #[arg(long)]
    seed: Option<u64>,
}

pub fn run(args: OptimizeArgs) -> anyhow::Result<()> {
    info!("Optimizing {:?}", args.input);
    let request: JsonOptimizationRequest = read_json(&args.input)?;
    let (vehicles, locations, mut config) = request.into_parts();

    if let Some(timeout) = args.timeout {
        config.max_solver_duration = timeout;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm.into();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let optimizer = Optimizer::new(vehicles, locations, config)?;
    let result = solve_with_progress(&optimizer)?;

    for warning in &result.warnings {
        warn!("{warning}");
    }
    for unassigned in &result.unassigned {
        warn!(
            location = %unassigned.location_id,
            reason = ?unassigned.reason,
            "Location not routed"
        );
    }

    println!("{}", table::candidates_table(&result));
    println!("{}", table::routes_table(&result));
    println!("{}", table::summary_table(&result));

    if let Some(output) = args.output {
        write_json(&output, &result)?;
        info!("Result written to {:?}", output);
    }

    Ok(())
}

/// Runs the optimizer on a worker thread and mirrors its progress snapshots
/// on a spinner.
fn solve_with_progress(optimizer: &Optimizer) -> anyhow::Result<OptimizationResult> {
    let mut receiver = optimizer.subscribe();
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message("running...");

    let result = thread::scope(|scope| {
        let handle = scope.spawn(|| optimizer.run());

        while !handle.is_finished() {
            if receiver.has_changed().unwrap_or(false) {
                let progress = receiver.borrow_and_update().clone();
                if let (Some(algorithm), Some(best_cost)) = (progress.algorithm, progress.best_cost)
                {
                    bar.set_message(format!(
                        "{algorithm}: iteration {}, best cost {best_cost:.2}",
                        progress.iteration
                    ));
                }
            }
            thread::sleep(Duration::from_millis(50));
        }

        handle.join()
    });

    bar.finish_and_clear();

    let result = result.map_err(|_| anyhow!("Solver thread panicked"))??;
    info!(
        algorithm = %result.summary.algorithm,
        routes = result.routes.len(),
        total_cost = result.summary.total_cost,
        unassigned = result.unassigned.len(),
        "Finished"
    );

    Ok(result)
}
