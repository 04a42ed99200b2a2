use clap::ValueEnum;
use courier_optimizer::{config::Algorithm, solver::batch::BatchMetric};
use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AlgorithmArg {
    NearestNeighbor,
    Savings,
    SimulatedAnnealing,
    Genetic,
    AntColony,
    Hybrid,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::NearestNeighbor => Algorithm::NearestNeighbor,
            AlgorithmArg::Savings => Algorithm::Savings,
            AlgorithmArg::SimulatedAnnealing => Algorithm::SimulatedAnnealing,
            AlgorithmArg::Genetic => Algorithm::Genetic,
            AlgorithmArg::AntColony => Algorithm::AntColony,
            AlgorithmArg::Hybrid => Algorithm::Hybrid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum MetricArg {
    #[default]
    Fulfillment,
    Cost,
    Distance,
    Confidence,
}

impl From<MetricArg> for BatchMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Fulfillment => BatchMetric::Fulfillment,
            MetricArg::Cost => BatchMetric::Cost,
            MetricArg::Distance => BatchMetric::Distance,
            MetricArg::Confidence => BatchMetric::Confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Ok(SignedDuration::from_secs(5)));
        assert_eq!(parse_duration("PT1M"), Ok(SignedDuration::from_mins(1)));
        assert_eq!(parse_duration("1m 30s"), Ok(SignedDuration::from_secs(90)));
        assert_eq!(parse_duration("12"), Ok(SignedDuration::from_secs(12)));
        assert!(parse_duration("soon").is_err());
    }
}
