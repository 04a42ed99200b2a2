pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() <= f64::EPSILON {
        return 0.0;
    }

    (value - min) / (max - min)
}

/// Min-max normalizes every value into `[0, 1]`. A constant series maps to zeros.
pub fn normalize_all(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    values
        .iter()
        .map(|&value| normalize(value, min, max))
        .collect()
}
