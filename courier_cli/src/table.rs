use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};
use courier_optimizer::result::OptimizationResult;
use jiff::SignedDuration;

fn format_duration(duration: SignedDuration) -> String {
    format!("{:#}", SignedDuration::from_secs(duration.as_secs()))
}

fn new_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(header);
    table
}

pub fn routes_table(result: &OptimizationResult) -> Table {
    let mut table = new_table([
        "Vehicle",
        "Stops",
        "Distance (km)",
        "Duration",
        "Cost",
        "CO2 (kg)",
        "Utilization",
        "Confidence",
        "Feasible",
    ]);

    for route in &result.routes {
        table.add_row(vec![
            route.vehicle_id.clone(),
            route.destinations().count().to_string(),
            format!("{:.1}", route.metrics.distance_km),
            format_duration(route.metrics.duration),
            format!("{:.2}", route.metrics.cost),
            format!("{:.1}", route.metrics.co2_kg),
            format!("{:.0}%", route.metrics.utilization * 100.0),
            format!("{:.0}", route.confidence),
            if route.feasible { "yes" } else { "no" }.to_owned(),
        ]);
    }

    table
}

pub fn summary_table(result: &OptimizationResult) -> Table {
    let summary = &result.summary;
    let mut table = new_table(["Summary", ""]);
    table
        .add_row(vec!["Algorithm".to_owned(), summary.algorithm.to_string()])
        .add_row(vec!["Vehicles used".to_owned(), summary.vehicles_used.to_string()])
        .add_row(vec![
            "Stops".to_owned(),
            format!(
                "{} assigned, {} unassigned ({:.1}%)",
                summary.assigned_stops, summary.unassigned_stops, summary.fulfillment
            ),
        ])
        .add_row(vec![
            "Distance".to_owned(),
            format!(
                "{:.1} km (saved {:.1} km)",
                summary.total_distance_km, summary.distance_savings_km
            ),
        ])
        .add_row(vec![
            "Cost".to_owned(),
            format!("{:.2} (saved {:.2})", summary.total_cost, summary.cost_savings),
        ])
        .add_row(vec![
            "Duration".to_owned(),
            format_duration(summary.total_duration),
        ])
        .add_row(vec![
            "Confidence".to_owned(),
            format!(
                "{:.0}{}",
                result.confidence,
                if summary.degraded { " (degraded)" } else { "" }
            ),
        ])
        .add_row(vec![
            "Solve time".to_owned(),
            format!("{:.2}s", summary.solve_duration.as_secs_f64()),
        ]);

    table
}

pub fn candidates_table(result: &OptimizationResult) -> Table {
    let mut table = new_table([
        "Algorithm",
        "Assigned",
        "Score",
        "Cost",
        "Distance (km)",
        "Stopped on",
    ]);

    for candidate in &result.summary.candidates {
        table.add_row(vec![
            candidate.algorithm.to_string(),
            candidate.assigned.to_string(),
            candidate
                .score
                .map_or_else(|| "-".to_owned(), |score| format!("{score:.3}")),
            format!("{:.2}", candidate.cost),
            format!("{:.1}", candidate.distance_km),
            candidate.stop_reason.to_string(),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_drops_subseconds() {
        assert_eq!(
            format_duration(SignedDuration::from_millis(5_400_250)),
            "1h 30m"
        );
        assert_eq!(format_duration(SignedDuration::from_secs(42)), "42s");
    }
}
