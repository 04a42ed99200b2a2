use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    demand::Demand,
    location::LocationIdx,
    routing_problem::RoutingProblem,
    vehicle::{Vehicle, VehicleIdx},
    waypoint_purpose::WaypointPurpose,
};

/// Why appending a stop to a route was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Infeasibility {
    Incompatible,
    Capacity,
    TimeWindow,
    MaxDistance,
    MaxDuration,
    WorkingHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub location_id: LocationIdx,
    pub purpose: WaypointPurpose,
}

impl Visit {
    pub fn new(location_id: LocationIdx, purpose: WaypointPurpose) -> Self {
        Visit {
            location_id,
            purpose,
        }
    }
}

/// Break taken in place before a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakTaken {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitTiming {
    pub arrival: Timestamp,
    pub service_start: Timestamp,
    pub departure: Timestamp,
    pub leg_distance_km: f64,
    pub leg_duration: SignedDuration,
    pub leg_rush_delay: SignedDuration,
    /// Continuous driving accumulated when arriving, before any rest here.
    pub driving_since_break: SignedDuration,
    pub break_before: Option<BreakTaken>,
}

/// Walks a route visit by visit, advancing the clock, the load and the
/// driven distance with the time-of-day aware cost model.
#[derive(Clone)]
pub struct RouteCursor<'a> {
    problem: &'a RoutingProblem,
    vehicle_id: VehicleIdx,
    vehicle: &'a Vehicle,
    auto_breaks: bool,

    position: LocationIdx,
    started_at: Timestamp,
    clock: Timestamp,
    load: Demand,
    distance_km: f64,
    driving: SignedDuration,
    driving_since_break: SignedDuration,
    rush_delay: SignedDuration,
    waiting: SignedDuration,
    breaks: usize,
}

impl<'a> RouteCursor<'a> {
    /// Cursor positioned at the vehicle start, after loading. Breaks are
    /// taken in place whenever the driver break rule is enforced.
    pub fn start(problem: &'a RoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let auto_breaks = problem.config().constraints.enforce_driver_breaks;
        Self::start_at(
            problem,
            vehicle_id,
            problem.vehicle_departure(vehicle_id),
            auto_breaks,
        )
    }

    pub fn start_at(
        problem: &'a RoutingProblem,
        vehicle_id: VehicleIdx,
        departure: Timestamp,
        auto_breaks: bool,
    ) -> Self {
        let loading = problem.config().itinerary.loading_duration;

        RouteCursor {
            problem,
            vehicle_id,
            vehicle: problem.vehicle(vehicle_id),
            auto_breaks,
            position: problem.vehicle_start(vehicle_id),
            started_at: departure,
            clock: departure + loading,
            load: Demand::ZERO,
            distance_km: 0.0,
            driving: SignedDuration::ZERO,
            driving_since_break: SignedDuration::ZERO,
            rush_delay: SignedDuration::ZERO,
            waiting: SignedDuration::ZERO,
            breaks: 0,
        }
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn position(&self) -> LocationIdx {
        self.position
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn load(&self) -> Demand {
        self.load
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn driving(&self) -> SignedDuration {
        self.driving
    }

    pub fn driving_since_break(&self) -> SignedDuration {
        self.driving_since_break
    }

    pub fn rush_delay(&self) -> SignedDuration {
        self.rush_delay
    }

    pub fn waiting(&self) -> SignedDuration {
        self.waiting
    }

    pub fn breaks(&self) -> usize {
        self.breaks
    }

    pub fn elapsed(&self) -> SignedDuration {
        self.clock.duration_since(self.started_at)
    }

    /// Whether driving `leg` more would exceed the break interval.
    pub fn needs_break_before(&self, leg: SignedDuration) -> bool {
        let interval = self.problem.config().itinerary.break_interval;
        self.driving_since_break.is_positive() && self.driving_since_break + leg > interval
    }

    /// Takes a break at the current position.
    pub fn take_break(&mut self) -> BreakTaken {
        let start = self.clock;
        self.clock += self.problem.config().itinerary.break_duration;
        self.driving_since_break = SignedDuration::ZERO;
        self.breaks += 1;

        BreakTaken {
            start,
            end: self.clock,
        }
    }

    pub fn advance(&mut self, visit: Visit) -> VisitTiming {
        let problem = self.problem;
        let cost_model = problem.cost_model();
        let params = &problem.config().itinerary;
        let distance = problem.distance(self.position, visit.location_id);

        let mut break_before = None;
        if self.auto_breaks {
            let estimate = cost_model.travel_time(distance, self.clock);
            if self.needs_break_before(estimate.duration) {
                break_before = Some(self.take_break());
            }
        }

        let travel = cost_model.travel_time(distance, self.clock);
        self.clock += travel.duration;
        self.distance_km += distance;
        self.driving += travel.duration;
        self.driving_since_break += travel.duration;
        self.rush_delay += travel.rush_delay;

        let arrival = self.clock;
        let driving_since_break = self.driving_since_break;
        let location = problem.location(visit.location_id);

        let (service_start, dwell) = match visit.purpose {
            WaypointPurpose::Destination => {
                self.load += *location.demand();
                let service_start = location
                    .time_window()
                    .map_or(arrival, |window| window.service_start(arrival));

                (service_start, location.service_duration())
            }
            WaypointPurpose::Rest => {
                self.driving_since_break = SignedDuration::ZERO;
                self.breaks += 1;
                (arrival, params.break_duration)
            }
            WaypointPurpose::Depot | WaypointPurpose::Fuel => {
                (arrival, params.facility_stop_duration)
            }
            WaypointPurpose::Departure => (arrival, params.loading_duration),
            WaypointPurpose::EmptyReturn => (arrival, SignedDuration::ZERO),
        };

        self.waiting += service_start.duration_since(arrival);
        self.clock = service_start + dwell;
        self.position = visit.location_id;

        VisitTiming {
            arrival,
            service_start,
            departure: self.clock,
            leg_distance_km: distance,
            leg_duration: travel.duration,
            leg_rush_delay: travel.rush_delay,
            driving_since_break,
            break_before,
        }
    }

    /// Appends a requested stop, reporting the first enforced rule it breaks
    /// on arrival. The cursor advances either way.
    pub fn push_stop(&mut self, location_id: LocationIdx) -> (VisitTiming, Option<Infeasibility>) {
        let problem = self.problem;
        let toggles = &problem.config().constraints;
        let location = problem.location(location_id);

        let mut infeasibility = None;
        if !problem.is_compatible(self.vehicle_id, location_id) {
            infeasibility = Some(Infeasibility::Incompatible);
        } else if toggles.enforce_capacity
            && !(self.load + *location.demand()).fits_within(self.vehicle.capacity())
        {
            infeasibility = Some(Infeasibility::Capacity);
        }

        let timing = self.advance(Visit::new(
            location_id,
            WaypointPurpose::for_role(location.role()),
        ));

        if infeasibility.is_none()
            && toggles.enforce_time_windows
            && let Some(window) = location.time_window()
            && !window.is_satisfied(timing.arrival)
        {
            infeasibility = Some(Infeasibility::TimeWindow);
        }

        (timing, infeasibility)
    }

    /// Drives the closing leg, if the vehicle has one, and checks the route
    /// wide limits.
    pub fn finish(&mut self) -> Option<Infeasibility> {
        if let (Some(end), Some(purpose)) = (
            self.problem.vehicle_end(self.vehicle_id),
            self.problem.closing_purpose(self.vehicle_id),
        ) {
            self.advance(Visit::new(end, purpose));
        }

        self.check_limits()
    }

    pub fn check_limits(&self) -> Option<Infeasibility> {
        let toggles = &self.problem.config().constraints;

        if toggles.enforce_max_distance
            && let Some(max_distance) = self.vehicle.max_distance_km()
            && self.distance_km > max_distance
        {
            return Some(Infeasibility::MaxDistance);
        }

        if toggles.enforce_max_time {
            if let Some(max_duration) = self.vehicle.max_duration()
                && self.elapsed() > max_duration
            {
                return Some(Infeasibility::MaxDuration);
            }

            if let Some(end) = self.vehicle.working_hours().and_then(|hours| hours.end())
                && self.clock > end
            {
                return Some(Infeasibility::WorkingHours);
            }
        }

        None
    }

    /// Checks whether `location_id` can be appended and the route still be
    /// closed within the vehicle limits.
    pub fn check_append(&self, location_id: LocationIdx) -> Result<(), Infeasibility> {
        let mut next = self.clone();
        if let (_, Some(infeasibility)) = next.push_stop(location_id) {
            return Err(infeasibility);
        }

        match next.finish() {
            Some(infeasibility) => Err(infeasibility),
            None => Ok(()),
        }
    }

    pub fn can_append(&self, location_id: LocationIdx) -> bool {
        self.check_append(location_id).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{
            demand::Demand,
            location::LocationBuilder,
            time_window::TimeWindow,
            vehicle::{VehicleBuilder, VehicleLimits},
        },
        test_utils,
    };

    use super::*;

    #[test]
    fn test_capacity_prefix() {
        let problem = test_utils::create_problem(&[300.0, 300.0], &[500.0]);
        let vehicle_id = VehicleIdx::new(0);

        let mut cursor = RouteCursor::start(&problem, vehicle_id);
        let (_, first) = cursor.push_stop(LocationIdx::new(1));
        assert_eq!(first, None);
        assert_eq!(cursor.load().weight, 300.0);

        assert_eq!(
            cursor.check_append(LocationIdx::new(2)),
            Err(Infeasibility::Capacity)
        );
    }

    #[test]
    fn test_early_arrival_waits() {
        let departure = test_utils::departure();
        let mut locations = test_utils::create_locations(&[]);
        let opens = departure + SignedDuration::from_hours(3);
        let mut stop = LocationBuilder::new("late_open", 50.86, 4.36);
        stop.set_time_window(TimeWindow::new(Some(opens), None))
            .set_service_duration(SignedDuration::from_mins(10));
        locations.push(stop.build());

        let problem = test_utils::problem_from(
            locations,
            vec![test_utils::create_vehicle("v", 100.0)],
            test_utils::config(),
        );

        let mut cursor = RouteCursor::start(&problem, VehicleIdx::new(0));
        let (timing, infeasibility) = cursor.push_stop(LocationIdx::new(1));

        assert_eq!(infeasibility, None);
        assert!(timing.arrival < opens);
        assert_eq!(timing.service_start, opens);
        assert_eq!(timing.departure, opens + SignedDuration::from_mins(10));
        assert!(cursor.waiting().is_positive());
    }

    #[test]
    fn test_route_limits() {
        let locations = test_utils::create_locations(&[10.0]);
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("short")
            .set_capacity(Demand::weight(100.0))
            .set_limits(VehicleLimits {
                max_distance_km: Some(0.5),
                max_duration: None,
            });

        let problem =
            test_utils::problem_from(locations, vec![builder.build()], test_utils::config());

        let cursor = RouteCursor::start(&problem, VehicleIdx::new(0));
        assert_eq!(
            cursor.check_append(LocationIdx::new(1)),
            Err(Infeasibility::MaxDistance)
        );
    }

    #[test]
    fn test_duration_and_working_hours_limits() {
        let departure = test_utils::departure();
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("brief")
            .set_capacity(Demand::weight(100.0))
            .set_limits(VehicleLimits {
                max_distance_km: None,
                max_duration: Some(SignedDuration::from_mins(10)),
            });
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0]),
            vec![builder.build()],
            test_utils::config(),
        );
        let cursor = RouteCursor::start(&problem, VehicleIdx::new(0));
        assert_eq!(
            cursor.check_append(LocationIdx::new(1)),
            Err(Infeasibility::MaxDuration)
        );

        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("shift")
            .set_capacity(Demand::weight(100.0))
            .set_working_hours(TimeWindow::new(
                Some(departure),
                Some(departure + SignedDuration::from_mins(10)),
            ));
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0]),
            vec![builder.build()],
            test_utils::config(),
        );
        let cursor = RouteCursor::start(&problem, VehicleIdx::new(0));
        assert_eq!(
            cursor.check_append(LocationIdx::new(1)),
            Err(Infeasibility::WorkingHours)
        );
    }

    #[test]
    fn test_breaks_in_place() {
        let departure = test_utils::departure();
        let problem = test_utils::create_far_problem();
        let mut cursor = RouteCursor::start_at(&problem, VehicleIdx::new(0), departure, true);

        let mut breaks = 0;
        for stop in problem.routable_stops() {
            let (timing, _) = cursor.push_stop(*stop);
            if timing.break_before.is_some() {
                breaks += 1;
            }
            assert!(
                timing.driving_since_break
                    <= problem.config().itinerary.break_interval + timing.leg_duration
            );
        }

        assert!(breaks > 0);
        assert_eq!(cursor.breaks(), breaks);
    }
}
