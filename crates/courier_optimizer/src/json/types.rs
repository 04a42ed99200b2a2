use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    config::OptimizationConfig,
    error::ValidationError,
    problem::{
        container::ContainerClass,
        demand::Demand,
        location::{Location, LocationBuilder, LocationRole},
        routing_problem::RoutingProblem,
        time_window::TimeWindow,
        vehicle::{CostRates, Vehicle, VehicleBuilder, VehicleLimits},
    },
    solver::batch::Scenario,
};

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "OptimizationRequest", rename_all = "camelCase")]
pub struct JsonOptimizationRequest {
    pub vehicles: Vec<JsonVehicle>,
    pub locations: Vec<JsonLocation>,
    #[serde(default)]
    pub config: OptimizationConfig,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "BatchRequest", rename_all = "camelCase")]
pub struct JsonBatchRequest {
    pub scenarios: Vec<JsonScenario>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Scenario", rename_all = "camelCase")]
pub struct JsonScenario {
    pub name: String,
    pub vehicles: Vec<JsonVehicle>,
    pub locations: Vec<JsonLocation>,
    #[serde(default)]
    pub config: OptimizationConfig,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Location", rename_all = "camelCase")]
pub struct JsonLocation {
    pub id: String,
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
    /// Defaults to `delivery`.
    pub role: Option<LocationRole>,
    pub demand: Option<Demand>,
    pub service_duration: Option<SignedDuration>,
    pub time_window: Option<TimeWindow>,
    /// Container class a serving vehicle must carry.
    pub container_class: Option<ContainerClass>,
    /// Capabilities a serving vehicle must have, e.g. `refrigerated`.
    pub requirements: Option<Vec<String>>,
}

impl From<JsonLocation> for Location {
    fn from(value: JsonLocation) -> Self {
        let mut builder = LocationBuilder::new(value.id, value.lat, value.lng);

        if let Some(role) = value.role {
            builder.set_role(role);
        }

        if let Some(demand) = value.demand {
            builder.set_demand(demand);
        }

        if let Some(service_duration) = value.service_duration {
            builder.set_service_duration(service_duration);
        }

        if let Some(time_window) = value.time_window {
            builder.set_time_window(time_window);
        }

        if let Some(class) = value.container_class {
            builder.set_container_class(class);
        }

        if let Some(requirements) = value.requirements {
            builder.set_requirements(requirements);
        }

        builder.build()
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Vehicle", rename_all = "camelCase")]
pub struct JsonVehicle {
    pub id: String,
    pub capacity: Demand,
    pub rates: Option<CostRates>,
    pub fuel_liters_per_km: Option<f64>,
    pub co2_kg_per_km: Option<f64>,
    pub fuel_range_km: Option<f64>,
    pub height_m: Option<f64>,
    pub limits: Option<VehicleLimits>,
    pub working_hours: Option<TimeWindow>,
    /// Defaults to the first depot of the request.
    pub start_location_id: Option<String>,
    pub end_location_id: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub container_class: Option<ContainerClass>,
}

impl From<JsonVehicle> for Vehicle {
    fn from(value: JsonVehicle) -> Self {
        let mut builder = VehicleBuilder::default();
        builder.set_vehicle_id(value.id).set_capacity(value.capacity);

        if let Some(rates) = value.rates {
            builder.set_rates(rates);
        }

        if let Some(fuel_liters_per_km) = value.fuel_liters_per_km {
            builder.set_fuel_liters_per_km(fuel_liters_per_km);
        }

        if let Some(co2_kg_per_km) = value.co2_kg_per_km {
            builder.set_co2_kg_per_km(co2_kg_per_km);
        }

        if let Some(fuel_range_km) = value.fuel_range_km {
            builder.set_fuel_range_km(fuel_range_km);
        }

        if let Some(height_m) = value.height_m {
            builder.set_height_m(height_m);
        }

        if let Some(limits) = value.limits {
            builder.set_limits(limits);
        }

        if let Some(working_hours) = value.working_hours {
            builder.set_working_hours(working_hours);
        }

        if let Some(start_location_id) = value.start_location_id {
            builder.set_start_location_id(start_location_id);
        }

        if let Some(end_location_id) = value.end_location_id {
            builder.set_end_location_id(end_location_id);
        }

        if let Some(capabilities) = value.capabilities {
            builder.set_capabilities(capabilities);
        }

        if let Some(class) = value.container_class {
            builder.set_container_class(class);
        }

        builder.build()
    }
}

impl JsonOptimizationRequest {
    pub fn into_parts(self) -> (Vec<Vehicle>, Vec<Location>, OptimizationConfig) {
        (
            self.vehicles.into_iter().map(Vehicle::from).collect(),
            self.locations.into_iter().map(Location::from).collect(),
            self.config,
        )
    }

    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(self) -> Result<RoutingProblem, ValidationError> {
        let (vehicles, locations, config) = self.into_parts();
        RoutingProblem::new(vehicles, locations, config)
    }
}

impl JsonBatchRequest {
    #[instrument(skip_all, level = "debug")]
    pub fn into_scenarios(self) -> Vec<Scenario> {
        self.scenarios
            .into_iter()
            .map(|scenario| Scenario {
                name: scenario.name,
                vehicles: scenario.vehicles.into_iter().map(Vehicle::from).collect(),
                locations: scenario.locations.into_iter().map(Location::from).collect(),
                config: scenario.config,
            })
            .collect()
    }
}
