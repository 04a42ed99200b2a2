use fxhash::FxHashSet;
use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::{
    container::ContainerClass, demand::Capacity, location::Location, time_window::TimeWindow,
};

define_index_newtype!(VehicleIdx, Vehicle);

/// Monetary rates of a vehicle. `per_hour` is the driver wage and `per_km`
/// the maintenance rate; `fixed` is charged once when the vehicle is used.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostRates {
    pub per_km: f64,
    pub per_hour: f64,
    pub fixed: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        CostRates {
            per_km: 0.15,
            per_hour: 25.0,
            fixed: 0.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleLimits {
    pub max_distance_km: Option<f64>,
    pub max_duration: Option<SignedDuration>,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    capacity: Capacity,
    rates: CostRates,
    fuel_liters_per_km: f64,
    co2_kg_per_km: Option<f64>,
    fuel_range_km: Option<f64>,
    height_m: Option<f64>,
    limits: VehicleLimits,
    working_hours: Option<TimeWindow>,
    start_location_id: Option<String>,
    end_location_id: Option<String>,
    capabilities: FxHashSet<String>,
    container_class: Option<ContainerClass>,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn rates(&self) -> &CostRates {
        &self.rates
    }

    pub fn fuel_liters_per_km(&self) -> f64 {
        self.fuel_liters_per_km
    }

    pub fn co2_kg_per_km(&self) -> Option<f64> {
        self.co2_kg_per_km
    }

    pub fn fuel_range_km(&self) -> Option<f64> {
        self.fuel_range_km
    }

    pub fn height_m(&self) -> Option<f64> {
        self.height_m
    }

    pub fn limits(&self) -> &VehicleLimits {
        &self.limits
    }

    pub fn max_distance_km(&self) -> Option<f64> {
        self.limits.max_distance_km
    }

    pub fn max_duration(&self) -> Option<SignedDuration> {
        self.limits.max_duration
    }

    pub fn working_hours(&self) -> Option<&TimeWindow> {
        self.working_hours.as_ref()
    }

    pub fn start_location_id(&self) -> Option<&str> {
        self.start_location_id.as_deref()
    }

    pub fn end_location_id(&self) -> Option<&str> {
        self.end_location_id.as_deref()
    }

    pub fn capabilities(&self) -> &FxHashSet<String> {
        &self.capabilities
    }

    pub fn container_class(&self) -> Option<ContainerClass> {
        self.container_class
    }

    /// A vehicle serves a location when it carries every required capability
    /// and, if the location names a container class, that exact class.
    pub fn is_compatible_with(&self, location: &Location) -> bool {
        let container_matches = match location.container_class() {
            Some(class) => self.container_class == Some(class),
            None => true,
        };

        container_matches && location.requirements().is_subset(&self.capabilities)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    capacity: Option<Capacity>,
    rates: Option<CostRates>,
    fuel_liters_per_km: Option<f64>,
    co2_kg_per_km: Option<f64>,
    fuel_range_km: Option<f64>,
    height_m: Option<f64>,
    limits: Option<VehicleLimits>,
    working_hours: Option<TimeWindow>,
    start_location_id: Option<String>,
    end_location_id: Option<String>,
    capabilities: Option<Vec<String>>,
    container_class: Option<ContainerClass>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_rates(&mut self, rates: CostRates) -> &mut VehicleBuilder {
        self.rates = Some(rates);
        self
    }

    pub fn set_fuel_liters_per_km(&mut self, fuel_liters_per_km: f64) -> &mut VehicleBuilder {
        self.fuel_liters_per_km = Some(fuel_liters_per_km);
        self
    }

    pub fn set_co2_kg_per_km(&mut self, co2_kg_per_km: f64) -> &mut VehicleBuilder {
        self.co2_kg_per_km = Some(co2_kg_per_km);
        self
    }

    pub fn set_fuel_range_km(&mut self, fuel_range_km: f64) -> &mut VehicleBuilder {
        self.fuel_range_km = Some(fuel_range_km);
        self
    }

    pub fn set_height_m(&mut self, height_m: f64) -> &mut VehicleBuilder {
        self.height_m = Some(height_m);
        self
    }

    pub fn set_limits(&mut self, limits: VehicleLimits) -> &mut VehicleBuilder {
        self.limits = Some(limits);
        self
    }

    pub fn set_working_hours(&mut self, working_hours: TimeWindow) -> &mut VehicleBuilder {
        self.working_hours = Some(working_hours);
        self
    }

    pub fn set_start_location_id(&mut self, location_id: impl Into<String>) -> &mut VehicleBuilder {
        self.start_location_id = Some(location_id.into());
        self
    }

    pub fn set_end_location_id(&mut self, location_id: impl Into<String>) -> &mut VehicleBuilder {
        self.end_location_id = Some(location_id.into());
        self
    }

    pub fn set_capabilities(&mut self, capabilities: Vec<String>) -> &mut VehicleBuilder {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn set_container_class(&mut self, class: ContainerClass) -> &mut VehicleBuilder {
        self.container_class = Some(class);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.unwrap_or_default(),
            capacity: self.capacity.unwrap_or_default(),
            rates: self.rates.unwrap_or_default(),
            fuel_liters_per_km: self.fuel_liters_per_km.unwrap_or(0.3),
            co2_kg_per_km: self.co2_kg_per_km,
            fuel_range_km: self.fuel_range_km,
            height_m: self.height_m,
            limits: self.limits.unwrap_or_default(),
            working_hours: self.working_hours.filter(|window| !window.is_empty()),
            start_location_id: self.start_location_id,
            end_location_id: self.end_location_id,
            capabilities: FxHashSet::from_iter(self.capabilities.unwrap_or_default()),
            container_class: self.container_class,
        }
    }
}
