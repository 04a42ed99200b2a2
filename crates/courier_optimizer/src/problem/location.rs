use fxhash::FxHashSet;
use geo::{Distance, Haversine};
use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::{container::ContainerClass, demand::Demand, time_window::TimeWindow};

define_index_newtype!(LocationIdx, Location);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationRole {
    Depot,
    Pickup,
    Delivery,
    Fuel,
    Rest,
    City,
}

impl LocationRole {
    /// Stops are the locations distributed among vehicles. Depots, fuel and
    /// rest locations are facilities the itinerary may route through.
    pub fn is_stop(&self) -> bool {
        matches!(
            self,
            LocationRole::Pickup | LocationRole::Delivery | LocationRole::City
        )
    }

    pub fn is_facility(&self) -> bool {
        !self.is_stop()
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    external_id: String,
    point: geo::Point,
    role: LocationRole,
    demand: Demand,
    service_duration: SignedDuration,
    time_window: Option<TimeWindow>,
    container_class: Option<ContainerClass>,
    requirements: FxHashSet<String>,
}

impl Location {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn point(&self) -> geo::Point {
        self.point
    }

    pub fn role(&self) -> LocationRole {
        self.role
    }

    pub fn demand(&self) -> &Demand {
        &self.demand
    }

    pub fn service_duration(&self) -> SignedDuration {
        self.service_duration
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn container_class(&self) -> Option<ContainerClass> {
        self.container_class
    }

    pub fn requirements(&self) -> &FxHashSet<String> {
        &self.requirements
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.lat().is_finite()
            && self.lon().is_finite()
            && (-90.0..=90.0).contains(&self.lat())
            && (-180.0..=180.0).contains(&self.lon())
    }

    /// Great-circle distance in kilometers.
    pub fn haversine_km(&self, to: &Location) -> f64 {
        let haversine = Haversine;

        haversine.distance(self.point, to.point) / 1000.0
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point
    }
}

pub struct LocationBuilder {
    external_id: String,
    lat: f64,
    lon: f64,
    role: LocationRole,
    demand: Option<Demand>,
    service_duration: Option<SignedDuration>,
    time_window: Option<TimeWindow>,
    container_class: Option<ContainerClass>,
    requirements: Option<Vec<String>>,
}

impl LocationBuilder {
    pub fn new(external_id: impl Into<String>, lat: f64, lon: f64) -> Self {
        LocationBuilder {
            external_id: external_id.into(),
            lat,
            lon,
            role: LocationRole::Delivery,
            demand: None,
            service_duration: None,
            time_window: None,
            container_class: None,
            requirements: None,
        }
    }

    pub fn set_role(&mut self, role: LocationRole) -> &mut LocationBuilder {
        self.role = role;
        self
    }

    pub fn set_demand(&mut self, demand: Demand) -> &mut LocationBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_service_duration(&mut self, duration: SignedDuration) -> &mut LocationBuilder {
        self.service_duration = Some(duration);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut LocationBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_container_class(&mut self, class: ContainerClass) -> &mut LocationBuilder {
        self.container_class = Some(class);
        self
    }

    pub fn set_requirements(&mut self, requirements: Vec<String>) -> &mut LocationBuilder {
        self.requirements = Some(requirements);
        self
    }

    pub fn build(self) -> Location {
        Location {
            external_id: self.external_id,
            point: geo::Point::new(self.lon, self.lat),
            role: self.role,
            demand: self.demand.unwrap_or_default(),
            service_duration: self.service_duration.unwrap_or(SignedDuration::ZERO),
            time_window: self.time_window.filter(|window| !window.is_empty()),
            container_class: self.container_class,
            requirements: FxHashSet::from_iter(self.requirements.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_km() {
        let brussels = LocationBuilder::new("bru", 50.8503, 4.3517).build();
        let antwerp = LocationBuilder::new("ant", 51.2194, 4.4025).build();

        let distance = brussels.haversine_km(&antwerp);
        assert!((distance - 41.2).abs() < 1.0, "got {distance}");
        assert_eq!(brussels.haversine_km(&brussels), 0.0);
    }

    #[test]
    fn test_roles() {
        assert!(LocationRole::City.is_stop());
        assert!(LocationRole::Pickup.is_stop());
        assert!(LocationRole::Depot.is_facility());
        assert!(LocationRole::Rest.is_facility());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(!LocationBuilder::new("x", 91.0, 0.0).build().has_valid_coordinates());
        assert!(
            !LocationBuilder::new("x", f64::NAN, 0.0)
                .build()
                .has_valid_coordinates()
        );
    }
}
