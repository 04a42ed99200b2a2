use std::path::PathBuf;

use clap::Args;
use courier_optimizer::{
    json::types::JsonBatchRequest,
    solver::batch::{BatchMetric, batch_optimize, select_best_scenario},
};
use tracing::{info, warn};

use crate::{
    file_utils::{read_json, write_json},
    parsers::MetricArg,
    table,
};

#[derive(Args)]
pub struct BatchArgs {
    /// The batch request holding every scenario
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Criterion used to pick the best scenario
    #[arg(short, long, value_enum, default_value_t = MetricArg::Fulfillment)]
    metric: MetricArg,

    /// Write the best scenario's result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: BatchArgs) -> anyhow::Result<()> {
    let request: JsonBatchRequest = read_json(&args.input)?;
    let scenarios = request.into_scenarios();
    let names: Vec<String> = scenarios
        .iter()
        .map(|scenario| scenario.name.clone())
        .collect();
    info!("Optimizing {} scenarios", names.len());

    let metric = BatchMetric::from(args.metric);
    let results = batch_optimize(scenarios);
    let best = select_best_scenario(&results, metric);

    let mut overview = comfy_table::Table::new();
    overview
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .set_header([
            "Scenario",
            "Fulfillment",
            "Cost",
            "Distance (km)",
            "Confidence",
            "",
        ]);

    for (index, (name, result)) in names.iter().zip(&results).enumerate() {
        let marker = if best == Some(index) { "best" } else { "" };
        match result {
            Ok(result) => {
                overview.add_row(vec![
                    name.clone(),
                    format!("{:.1}%", result.summary.fulfillment),
                    format!("{:.2}", result.summary.total_cost),
                    format!("{:.1}", result.summary.total_distance_km),
                    format!("{:.0}", result.confidence),
                    marker.to_owned(),
                ]);
            }
            Err(error) => {
                warn!(scenario = %name, %error, "Scenario failed");
                overview.add_row(vec![
                    name.clone(),
                    "-".to_owned(),
                    "-".to_owned(),
                    "-".to_owned(),
                    "-".to_owned(),
                    error.to_string(),
                ]);
            }
        }
    }

    println!("{overview}");

    let Some(best) = best else {
        warn!("No scenario could be optimized");
        return Ok(());
    };

    if let Ok(result) = &results[best] {
        info!(scenario = %names[best], %metric, "Best scenario");
        println!("{}", table::routes_table(result));
        println!("{}", table::summary_table(result));

        if let Some(output) = args.output {
            write_json(&output, result)?;
            info!("Result written to {:?}", output);
        }
    }

    Ok(())
}
