use std::fmt::Display;

use jiff::{SignedDuration, Timestamp, civil::time};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    problem::{clock_window::ClockWindow, container::ContainerRestriction},
};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    NearestNeighbor,
    Savings,
    SimulatedAnnealing,
    Genetic,
    AntColony,
    #[default]
    Hybrid,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::NearestNeighbor => write!(f, "nearest_neighbor"),
            Algorithm::Savings => write!(f, "savings"),
            Algorithm::SimulatedAnnealing => write!(f, "simulated_annealing"),
            Algorithm::Genetic => write!(f, "genetic"),
            Algorithm::AntColony => write!(f, "ant_colony"),
            Algorithm::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Relative importance of each objective. Weights are normalized by the
/// selector, they do not have to sum to one.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectiveWeights {
    pub minimize_distance: f64,
    pub minimize_time: f64,
    pub minimize_cost: f64,
    pub maximize_utilization: f64,
    pub minimize_emissions: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            minimize_distance: 1.0,
            minimize_time: 1.0,
            minimize_cost: 1.0,
            maximize_utilization: 0.5,
            minimize_emissions: 0.5,
        }
    }
}

impl ObjectiveWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.minimize_distance,
            self.minimize_time,
            self.minimize_cost,
            self.maximize_utilization,
            self.minimize_emissions,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintToggles {
    pub enforce_capacity: bool,
    pub enforce_time_windows: bool,
    pub enforce_max_distance: bool,
    pub enforce_max_time: bool,
    pub enforce_driver_breaks: bool,
}

impl Default for ConstraintToggles {
    fn default() -> Self {
        ConstraintToggles {
            enforce_capacity: true,
            enforce_time_windows: true,
            enforce_max_distance: true,
            enforce_max_time: true,
            enforce_driver_breaks: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerPolicy {
    /// Postpone departures that would enter a city during restricted hours.
    pub avoid_restricted_hours: bool,
    pub permits_held: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CostParameters {
    pub fuel_price_per_liter: f64,
    pub toll_rate_per_km: f64,
    pub co2_kg_per_km: f64,
    pub city_speed_kmh: f64,
    pub highway_speed_kmh: f64,
    /// Legs shorter than this are driven at city speed.
    pub highway_threshold_km: f64,
    pub rush_hour_windows: Vec<ClockWindow>,
    /// Speed multiplier applied inside rush windows.
    pub rush_hour_factor: f64,
}

impl Default for CostParameters {
    fn default() -> Self {
        CostParameters {
            fuel_price_per_liter: 1.6,
            toll_rate_per_km: 0.12,
            co2_kg_per_km: 0.9,
            city_speed_kmh: 40.0,
            highway_speed_kmh: 80.0,
            highway_threshold_km: 30.0,
            rush_hour_windows: vec![
                ClockWindow::new(time(7, 0, 0, 0), time(9, 0, 0, 0)),
                ClockWindow::new(time(17, 0, 0, 0), time(19, 0, 0, 0)),
            ],
            rush_hour_factor: 0.7,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ItineraryParams {
    pub loading_duration: SignedDuration,
    pub break_interval: SignedDuration,
    pub break_duration: SignedDuration,
    /// Dwell time at an inserted depot or fuel waypoint.
    pub facility_stop_duration: SignedDuration,
    pub long_route_threshold_km: f64,
    /// Maximum ratio between a detoured leg and the direct leg.
    pub detour_ratio: f64,
    pub complexity_threshold: usize,
}

impl Default for ItineraryParams {
    fn default() -> Self {
        ItineraryParams {
            loading_duration: SignedDuration::from_mins(15),
            break_interval: SignedDuration::from_mins(240),
            break_duration: SignedDuration::from_mins(45),
            facility_stop_duration: SignedDuration::from_mins(20),
            long_route_threshold_km: 300.0,
            detour_ratio: 1.2,
            complexity_threshold: 20,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedAnnealingParams {
    /// Defaults to 5% of the initial solution cost.
    pub initial_temperature: Option<f64>,
    pub cooling_rate: f64,
    pub min_temperature: f64,
    pub max_iterations: usize,
}

impl Default for SimulatedAnnealingParams {
    fn default() -> Self {
        SimulatedAnnealingParams {
            initial_temperature: None,
            cooling_rate: 0.995,
            min_temperature: 1e-3,
            max_iterations: 20_000,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneticParams {
    pub population_size: usize,
    pub generations: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub elites: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: 40,
            generations: 200,
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            elites: 2,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AntColonyParams {
    pub ants: usize,
    pub iterations: usize,
    pub alpha: f64,
    pub beta: f64,
    pub evaporation_rate: f64,
    pub initial_pheromone: f64,
    pub deposit_factor: f64,
}

impl Default for AntColonyParams {
    fn default() -> Self {
        AntColonyParams {
            ants: 20,
            iterations: 100,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            initial_pheromone: 1.0,
            deposit_factor: 1.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationConfig {
    pub algorithm: Algorithm,
    pub objective_weights: ObjectiveWeights,
    pub constraints: ConstraintToggles,
    pub container_policy: ContainerPolicy,
    pub avoid_tolls: bool,
    pub include_empty_return: bool,
    pub max_solver_duration: SignedDuration,
    pub max_unimproved_duration: SignedDuration,
    /// Defaults to the time the request is solved. Rush hours and time
    /// windows then depend on the wall clock, so runs are only reproducible
    /// for a given seed when this is set.
    pub departure_time: Option<Timestamp>,
    /// IANA time zone used for every time-of-day rule.
    pub time_zone: String,
    pub seed: u64,
    pub cost_parameters: CostParameters,
    pub itinerary: ItineraryParams,
    /// Replaces the built-in container restriction table when set.
    pub container_restrictions: Option<Vec<ContainerRestriction>>,
    pub simulated_annealing: SimulatedAnnealingParams,
    pub genetic: GeneticParams,
    pub ant_colony: AntColonyParams,
    pub two_opt_max_iterations: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            algorithm: Algorithm::default(),
            objective_weights: ObjectiveWeights::default(),
            constraints: ConstraintToggles::default(),
            container_policy: ContainerPolicy::default(),
            avoid_tolls: false,
            include_empty_return: false,
            max_solver_duration: SignedDuration::from_secs(30),
            max_unimproved_duration: SignedDuration::from_secs(10),
            departure_time: None,
            time_zone: "UTC".to_owned(),
            seed: 42,
            cost_parameters: CostParameters::default(),
            itinerary: ItineraryParams::default(),
            container_restrictions: None,
            simulated_annealing: SimulatedAnnealingParams::default(),
            genetic: GeneticParams::default(),
            ant_colony: AntColonyParams::default(),
            two_opt_max_iterations: 1000,
        }
    }
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let weights = self.objective_weights.as_array();
        if weights.iter().any(|weight| *weight < 0.0 || !weight.is_finite()) {
            return Err(ValidationError::InvalidConfig(
                "objective weights must be non-negative".to_owned(),
            ));
        }

        if !self.max_solver_duration.is_positive() {
            return Err(ValidationError::InvalidConfig(
                "maxSolverDuration must be positive".to_owned(),
            ));
        }

        if !self.max_unimproved_duration.is_positive() {
            return Err(ValidationError::InvalidConfig(
                "maxUnimprovedDuration must be positive".to_owned(),
            ));
        }

        let cost = &self.cost_parameters;
        if cost.city_speed_kmh <= 0.0 || cost.highway_speed_kmh <= 0.0 {
            return Err(ValidationError::InvalidConfig(
                "speeds must be positive".to_owned(),
            ));
        }

        if cost.rush_hour_factor <= 0.0 || cost.rush_hour_factor > 1.0 {
            return Err(ValidationError::InvalidConfig(
                "rushHourFactor must be in (0, 1]".to_owned(),
            ));
        }

        let itinerary = &self.itinerary;
        if itinerary.loading_duration.is_negative()
            || itinerary.break_duration.is_negative()
            || itinerary.facility_stop_duration.is_negative()
        {
            return Err(ValidationError::InvalidConfig(
                "itinerary durations must not be negative".to_owned(),
            ));
        }

        if !itinerary.break_interval.is_positive() {
            return Err(ValidationError::InvalidConfig(
                "breakInterval must be positive".to_owned(),
            ));
        }

        if itinerary.detour_ratio.is_nan()
            || itinerary.detour_ratio < 1.0
            || itinerary.long_route_threshold_km.is_nan()
            || itinerary.long_route_threshold_km < 0.0
        {
            return Err(ValidationError::InvalidConfig(
                "detourRatio must be at least 1 and longRouteThresholdKm non-negative".to_owned(),
            ));
        }

        let annealing = &self.simulated_annealing;
        if !(0.0..1.0).contains(&annealing.cooling_rate) || annealing.min_temperature <= 0.0 {
            return Err(ValidationError::InvalidConfig(
                "coolingRate must be in [0, 1) and minTemperature positive".to_owned(),
            ));
        }

        let genetic = &self.genetic;
        if genetic.population_size < 2 || genetic.tournament_size == 0 {
            return Err(ValidationError::InvalidConfig(
                "genetic populationSize must be at least 2 and tournamentSize positive"
                    .to_owned(),
            ));
        }

        let colony = &self.ant_colony;
        if colony.ants == 0 || !(0.0..=1.0).contains(&colony.evaporation_rate) {
            return Err(ValidationError::InvalidConfig(
                "antColony needs ants and an evaporationRate in [0, 1]".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: OptimizationConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, OptimizationConfig::default());
        assert_eq!(config.algorithm, Algorithm::Hybrid);
        assert!(config.constraints.enforce_capacity);
        assert_eq!(config.time_zone, "UTC");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: OptimizationConfig = serde_json::from_str(
            r#"{
                "algorithm": "simulatedAnnealing",
                "avoidTolls": true,
                "maxSolverDuration": "PT2S",
                "objectiveWeights": { "minimizeCost": 3.0 },
                "containerPolicy": { "permitsHeld": true }
            }"#,
        )
        .unwrap();

        assert_eq!(config.algorithm, Algorithm::SimulatedAnnealing);
        assert!(config.avoid_tolls);
        assert_eq!(config.max_solver_duration, SignedDuration::from_secs(2));
        assert_eq!(config.objective_weights.minimize_cost, 3.0);
        assert_eq!(config.objective_weights.minimize_distance, 1.0);
        assert!(config.container_policy.permits_held);
        assert!(!config.container_policy.avoid_restricted_hours);
    }

    #[test]
    fn test_rejects_negative_weights() {
        let mut config = OptimizationConfig::default();
        config.objective_weights.minimize_time = -1.0;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let config = OptimizationConfig {
            max_solver_duration: SignedDuration::ZERO,
            ..OptimizationConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_itinerary_durations() {
        let mut config = OptimizationConfig::default();
        config.itinerary.break_duration = SignedDuration::from_hours(-3);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConfig(_))
        ));

        let mut config = OptimizationConfig::default();
        config.itinerary.loading_duration = SignedDuration::from_hours(-1);
        assert!(config.validate().is_err());

        let mut config = OptimizationConfig::default();
        config.itinerary.facility_stop_duration = SignedDuration::from_mins(-5);
        assert!(config.validate().is_err());

        let mut config = OptimizationConfig::default();
        config.itinerary.break_interval = SignedDuration::ZERO;
        assert!(config.validate().is_err());

        let mut config = OptimizationConfig::default();
        config.itinerary.loading_duration = SignedDuration::ZERO;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_detour_below_direct() {
        let mut config = OptimizationConfig::default();
        config.itinerary.detour_ratio = 0.9;
        assert!(config.validate().is_err());

        let mut config = OptimizationConfig::default();
        config.itinerary.long_route_threshold_km = -1.0;
        assert!(config.validate().is_err());
    }
}
