use fixedbitset::FixedBitSet;
use fxhash::FxHashMap;
use jiff::{Timestamp, tz::TimeZone};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::OptimizationConfig,
    constraints::route_cursor::{Infeasibility, RouteCursor},
    cost::cost_model::CostModel,
    error::ValidationError,
    timer_debug,
};

use super::{
    container::{ContainerRestriction, ContainerRestrictions},
    facility_index::FacilityIndex,
    location::{Location, LocationIdx, LocationRole},
    travel_matrix::TravelMatrix,
    unassigned::{UnassignedReason, UnassignedStop},
    vehicle::{Vehicle, VehicleIdx},
    waypoint_purpose::WaypointPurpose,
};

/// Immutable snapshot of one optimization request. Every solver reads from
/// the same snapshot, nothing in it changes once built.
pub struct RoutingProblem {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    config: OptimizationConfig,

    vehicle_starts: Vec<LocationIdx>,
    vehicle_ends: Vec<Option<LocationIdx>>,

    /// Stops that at least one vehicle can serve on its own.
    routable_stops: Vec<LocationIdx>,
    /// Stops rejected before solving, in request order.
    pre_unassigned: Vec<UnassignedStop>,

    travel_matrix: TravelMatrix,
    facility_index: FacilityIndex,
    cost_model: CostModel,
    container_restrictions: ContainerRestrictions,

    /// `vehicle * num_locations + location`
    compatibilities: FixedBitSet,
    departure: Timestamp,
}

impl RoutingProblem {
    #[instrument(skip_all, level = "debug")]
    pub fn new(
        vehicles: Vec<Vehicle>,
        locations: Vec<Location>,
        config: OptimizationConfig,
    ) -> Result<Self, ValidationError> {
        Self::validate_input(&vehicles, &locations)?;
        config.validate()?;

        let time_zone = TimeZone::get(&config.time_zone)
            .map_err(|_| ValidationError::UnknownTimeZone(config.time_zone.clone()))?;

        let ids: FxHashMap<&str, LocationIdx> = locations
            .iter()
            .enumerate()
            .map(|(index, location)| (location.external_id(), LocationIdx::new(index)))
            .collect();
        let first_depot = locations
            .iter()
            .position(|location| location.role() == LocationRole::Depot)
            .map(LocationIdx::new);

        let mut vehicle_starts = Vec::with_capacity(vehicles.len());
        let mut vehicle_ends = Vec::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            let lookup = |location_id: &str| {
                ids.get(location_id)
                    .copied()
                    .ok_or_else(|| ValidationError::UnknownLocation {
                        vehicle_id: vehicle.external_id().to_owned(),
                        location_id: location_id.to_owned(),
                    })
            };

            let start = match vehicle.start_location_id() {
                Some(location_id) => lookup(location_id)?,
                None => first_depot.ok_or_else(|| ValidationError::MissingDepot {
                    vehicle_id: vehicle.external_id().to_owned(),
                })?,
            };

            let end = match vehicle.end_location_id() {
                Some(location_id) => Some(lookup(location_id)?),
                None if config.include_empty_return => Some(start),
                None => None,
            };

            vehicle_starts.push(start);
            vehicle_ends.push(end);
        }

        let mut compatibilities = FixedBitSet::with_capacity(vehicles.len() * locations.len());
        for (vehicle_index, vehicle) in vehicles.iter().enumerate() {
            for (location_index, location) in locations.iter().enumerate() {
                if !location.role().is_stop() || vehicle.is_compatible_with(location) {
                    compatibilities.insert(vehicle_index * locations.len() + location_index);
                }
            }
        }

        let container_restrictions = match &config.container_restrictions {
            Some(restrictions) => ContainerRestrictions::new(restrictions.clone()),
            None => ContainerRestrictions::default(),
        };

        let travel_matrix = timer_debug!("Travel matrix", TravelMatrix::from_haversine(&locations));
        let facility_index = FacilityIndex::new(&locations);
        let cost_model = CostModel::new(
            config.cost_parameters.clone(),
            time_zone,
            config.avoid_tolls,
        );
        let departure = config.departure_time.unwrap_or_else(Timestamp::now);

        let mut problem = RoutingProblem {
            locations,
            vehicles,
            config,
            vehicle_starts,
            vehicle_ends,
            routable_stops: vec![],
            pre_unassigned: vec![],
            travel_matrix,
            facility_index,
            cost_model,
            container_restrictions,
            compatibilities,
            departure,
        };

        problem.classify_stops();

        info!(
            vehicles = problem.vehicles.len(),
            locations = problem.locations.len(),
            routable = problem.routable_stops.len(),
            rejected = problem.pre_unassigned.len(),
            "Routing problem ready"
        );

        Ok(problem)
    }

    fn validate_input(vehicles: &[Vehicle], locations: &[Location]) -> Result<(), ValidationError> {
        if vehicles.is_empty() {
            return Err(ValidationError::EmptyFleet);
        }

        if locations.is_empty() {
            return Err(ValidationError::NoLocations);
        }

        for vehicle in vehicles {
            if vehicle.capacity().is_negative() || !vehicle.capacity().is_finite() {
                return Err(ValidationError::NegativeCapacity {
                    vehicle_id: vehicle.external_id().to_owned(),
                });
            }

            if let Some(working_hours) = vehicle.working_hours()
                && !working_hours.is_well_formed()
            {
                return Err(ValidationError::InvalidTimeWindow {
                    owner: vehicle.external_id().to_owned(),
                });
            }
        }

        let mut seen = fxhash::FxHashSet::default();
        for location in locations {
            if !seen.insert(location.external_id()) {
                return Err(ValidationError::DuplicateLocationId(
                    location.external_id().to_owned(),
                ));
            }

            if !location.has_valid_coordinates() {
                return Err(ValidationError::InvalidCoordinates {
                    location_id: location.external_id().to_owned(),
                });
            }

            if location.demand().is_negative() || !location.demand().is_finite() {
                return Err(ValidationError::NegativeDemand {
                    location_id: location.external_id().to_owned(),
                });
            }

            if location.service_duration().is_negative() {
                return Err(ValidationError::NegativeServiceDuration {
                    location_id: location.external_id().to_owned(),
                });
            }

            if let Some(time_window) = location.time_window()
                && !time_window.is_well_formed()
            {
                return Err(ValidationError::InvalidTimeWindow {
                    owner: location.external_id().to_owned(),
                });
            }
        }

        Ok(())
    }

    /// Splits the stops into routable ones and those no vehicle can serve,
    /// even alone on a route.
    fn classify_stops(&mut self) {
        let mut routable = vec![];
        let mut rejected = vec![];

        for location_id in LocationIdx::range(self.locations.len()) {
            if !self.location(location_id).role().is_stop() {
                continue;
            }

            let mut failures = vec![];
            let mut serviceable = false;
            for vehicle_id in VehicleIdx::range(self.vehicles.len()) {
                if !self.is_compatible(vehicle_id, location_id) {
                    continue;
                }

                let cursor = RouteCursor::start(self, vehicle_id);
                match cursor.check_append(location_id) {
                    Ok(()) => {
                        serviceable = true;
                        break;
                    }
                    Err(infeasibility) => failures.push(infeasibility),
                }
            }

            if serviceable {
                routable.push(location_id);
                continue;
            }

            let reason = if failures.is_empty() {
                UnassignedReason::NoCompatibleVehicle
            } else if failures.iter().all(|f| *f == Infeasibility::Capacity) {
                UnassignedReason::CapacityExceeded
            } else if failures.contains(&Infeasibility::TimeWindow) {
                UnassignedReason::TimeWindowUnreachable
            } else {
                UnassignedReason::RouteLimitExceeded
            };

            warn!(
                location = self.location(location_id).external_id(),
                %reason,
                "Stop cannot be served"
            );
            rejected.push(UnassignedStop {
                location_id,
                reason,
            });
        }

        debug!(routable = routable.len(), "Classified stops");
        self.routable_stops = routable;
        self.pre_unassigned = rejected;
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id]
    }

    pub fn location_by_external_id(&self, external_id: &str) -> Option<LocationIdx> {
        self.locations
            .iter()
            .position(|location| location.external_id() == external_id)
            .map(LocationIdx::new)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn vehicle_start(&self, vehicle_id: VehicleIdx) -> LocationIdx {
        self.vehicle_starts[vehicle_id.get()]
    }

    /// Where the route of `vehicle_id` closes. `None` leaves the route open at
    /// its last stop.
    pub fn vehicle_end(&self, vehicle_id: VehicleIdx) -> Option<LocationIdx> {
        self.vehicle_ends[vehicle_id.get()]
    }

    pub fn closing_purpose(&self, vehicle_id: VehicleIdx) -> Option<WaypointPurpose> {
        let end = self.vehicle_end(vehicle_id)?;
        if self.config.include_empty_return {
            Some(WaypointPurpose::EmptyReturn)
        } else {
            Some(WaypointPurpose::for_role(self.location(end).role()))
        }
    }

    /// Departure of `vehicle_id`, never before its working hours start.
    pub fn vehicle_departure(&self, vehicle_id: VehicleIdx) -> Timestamp {
        match self
            .vehicle(vehicle_id)
            .working_hours()
            .and_then(|working_hours| working_hours.start())
        {
            Some(start) if start > self.departure => start,
            _ => self.departure,
        }
    }

    pub fn departure(&self) -> Timestamp {
        self.departure
    }

    pub fn routable_stops(&self) -> &[LocationIdx] {
        &self.routable_stops
    }

    pub fn pre_unassigned(&self) -> &[UnassignedStop] {
        &self.pre_unassigned
    }

    pub fn num_stops(&self) -> usize {
        self.routable_stops.len() + self.pre_unassigned.len()
    }

    #[inline(always)]
    pub fn distance(&self, from: LocationIdx, to: LocationIdx) -> f64 {
        self.travel_matrix.distance(from, to)
    }

    pub fn travel_matrix(&self) -> &TravelMatrix {
        &self.travel_matrix
    }

    pub fn facility_index(&self) -> &FacilityIndex {
        &self.facility_index
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub fn container_restriction(&self, vehicle_id: VehicleIdx) -> Option<&ContainerRestriction> {
        self.vehicle(vehicle_id)
            .container_class()
            .and_then(|class| self.container_restrictions.for_class(class))
    }

    #[inline(always)]
    pub fn is_compatible(&self, vehicle_id: VehicleIdx, location_id: LocationIdx) -> bool {
        self.compatibilities
            .contains(vehicle_id.get() * self.locations.len() + location_id.get())
    }
}
