pub const MAX_CONFIDENCE: f64 = 100.0;
pub const VIOLATION_PENALTY: f64 = 15.0;
pub const WARNING_PENALTY: f64 = 5.0;
pub const COMPLEXITY_PENALTY: f64 = 10.0;
pub const DEGRADED_PENALTY: f64 = 10.0;

/// Confidence of a single route, in `[0, 100]`.
pub fn route_confidence(
    rush_hour_impact: f64,
    violations: usize,
    warnings: usize,
    is_complex: bool,
) -> f64 {
    let mut confidence = MAX_CONFIDENCE
        - rush_hour_impact.max(0.0)
        - VIOLATION_PENALTY * violations as f64
        - WARNING_PENALTY * warnings as f64;

    if is_complex {
        confidence -= COMPLEXITY_PENALTY;
    }

    confidence.clamp(0.0, MAX_CONFIDENCE)
}

/// Mean route confidence, lowered when the solve stopped early. A result
/// without routes gets the full score minus the degradation penalty.
pub fn result_confidence(route_confidences: &[f64], degraded: bool) -> f64 {
    let mean = if route_confidences.is_empty() {
        MAX_CONFIDENCE
    } else {
        route_confidences.iter().sum::<f64>() / route_confidences.len() as f64
    };

    let penalty = if degraded { DEGRADED_PENALTY } else { 0.0 };
    (mean - penalty).max(0.0)
}
