use fxhash::FxHashSet;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::problem::{
    clock_window::format_clock,
    location::LocationRole,
    routing_problem::RoutingProblem,
    vehicle::VehicleIdx,
    waypoint_purpose::WaypointPurpose,
};

use super::route_cursor::{RouteCursor, Visit};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Capacity,
    TimeWindow,
    MaxDistance,
    MaxDuration,
    WorkingHours,
    ContainerRestrictedHours,
    ContainerWeight,
    ContainerHeight,
    DriverBreak,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    /// Index in the route waypoints, the departure waypoint being 0.
    pub waypoint_index: usize,
    pub detail: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub waypoint_index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub feasible: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    fn violation(&mut self, kind: ViolationKind, waypoint_index: usize, detail: String) {
        self.violations.push(Violation {
            kind,
            waypoint_index,
            detail,
        });
    }

    fn warning(&mut self, waypoint_index: Option<usize>, message: String) {
        if self.warnings.iter().all(|warning| warning.message != message) {
            self.warnings.push(Warning {
                waypoint_index,
                message,
            });
        }
    }
}

/// Checks a timed route against capacity, time windows, route limits,
/// container restrictions and driver breaks. Only reports, never modifies.
pub struct RouteValidator<'a> {
    problem: &'a RoutingProblem,
}

impl<'a> RouteValidator<'a> {
    pub fn new(problem: &'a RoutingProblem) -> Self {
        RouteValidator { problem }
    }

    /// `visits` are the waypoints following the departure of `vehicle_id` at
    /// `departure`, in order.
    pub fn validate(
        &self,
        vehicle_id: VehicleIdx,
        visits: &[Visit],
        departure: Timestamp,
    ) -> ValidationReport {
        let problem = self.problem;
        let config = problem.config();
        let toggles = &config.constraints;
        let vehicle = problem.vehicle(vehicle_id);
        let restriction = problem.container_restriction(vehicle_id);
        let permits_held = config.container_policy.permits_held;

        let mut report = ValidationReport::default();
        let mut cursor = RouteCursor::start_at(problem, vehicle_id, departure, false);
        let mut weight_reported = false;
        let mut capacity_reported = FxHashSet::default();

        if let Some(restriction) = restriction {
            if restriction.permit_required && !permits_held {
                report.warning(
                    Some(0),
                    format!(
                        "{} container requires a permit that is not held",
                        restriction.class
                    ),
                );
            }

            if let (Some(max_height), Some(height)) = (restriction.max_height_m, vehicle.height_m())
                && height > max_height
            {
                report.violation(
                    ViolationKind::ContainerHeight,
                    0,
                    format!(
                        "vehicle height {height:.2} m exceeds the {} limit of {max_height:.2} m",
                        restriction.class
                    ),
                );
            }
        }

        for (index, visit) in visits.iter().enumerate() {
            let waypoint_index = index + 1;
            let location = problem.location(visit.location_id);
            let timing = cursor.advance(*visit);

            'stop: {
                if visit.purpose != WaypointPurpose::Destination {
                    break 'stop;
                }

                if toggles.enforce_capacity
                    && !cursor.load().fits_within(vehicle.capacity())
                    && capacity_reported.insert(waypoint_index)
                {
                    report.violation(
                        ViolationKind::Capacity,
                        waypoint_index,
                        format!(
                            "load {:.1} kg / {:.2} m³ exceeds capacity {:.1} kg / {:.2} m³",
                            cursor.load().weight,
                            cursor.load().volume,
                            vehicle.capacity().weight,
                            vehicle.capacity().volume
                        ),
                    );
                }

                if toggles.enforce_time_windows
                    && let Some(window) = location.time_window()
                    && !window.is_satisfied(timing.arrival)
                {
                    report.violation(
                        ViolationKind::TimeWindow,
                        waypoint_index,
                        format!(
                            "arrival at {} is {} min late",
                            location.external_id(),
                            window.overtime(timing.arrival).as_mins()
                        ),
                    );
                }

                let Some(restriction) = restriction else {
                    break 'stop;
                };

                if !weight_reported
                    && let Some(max_weight) = restriction.max_weight_kg
                    && cursor.load().weight > max_weight
                {
                    weight_reported = true;
                    report.violation(
                        ViolationKind::ContainerWeight,
                        waypoint_index,
                        format!(
                            "{} container load {:.0} kg exceeds {max_weight:.0} kg",
                            restriction.class,
                            cursor.load().weight
                        ),
                    );
                }

                if location.role() != LocationRole::City || permits_held {
                    break 'stop;
                }

                let local_arrival = problem.cost_model().local_time(timing.arrival);
                if let Some(hit) = restriction.restricted_at(local_arrival) {
                    report.violation(
                        ViolationKind::ContainerRestrictedHours,
                        waypoint_index,
                        format!(
                            "{} container enters city stop {} at {}, restricted {}",
                            restriction.class,
                            location.external_id(),
                            format_clock(local_arrival),
                            hit.window.label()
                        ),
                    );
                    report.warning(
                        Some(waypoint_index),
                        format!("consider departing after {}", format_clock(hit.lifts_at)),
                    );
                }
            }

            if toggles.enforce_driver_breaks
                && timing.driving_since_break > config.itinerary.break_interval
            {
                report.violation(
                    ViolationKind::DriverBreak,
                    waypoint_index,
                    format!(
                        "{} min of continuous driving without a rest",
                        timing.driving_since_break.as_mins()
                    ),
                );
            }
        }

        if toggles.enforce_max_distance
            && let Some(max_distance) = vehicle.max_distance_km()
            && cursor.distance_km() > max_distance
        {
            report.violation(
                ViolationKind::MaxDistance,
                visits.len(),
                format!(
                    "route distance {:.1} km exceeds {max_distance:.1} km",
                    cursor.distance_km()
                ),
            );
        }

        if toggles.enforce_max_time {
            if let Some(max_duration) = vehicle.max_duration()
                && cursor.elapsed() > max_duration
            {
                report.violation(
                    ViolationKind::MaxDuration,
                    visits.len(),
                    format!(
                        "route duration {} min exceeds {} min",
                        cursor.elapsed().as_mins(),
                        max_duration.as_mins()
                    ),
                );
            }

            if let Some(end) = vehicle.working_hours().and_then(|hours| hours.end())
                && cursor.clock() > end
            {
                report.violation(
                    ViolationKind::WorkingHours,
                    visits.len(),
                    format!(
                        "route ends {} min after working hours",
                        cursor.clock().duration_since(end).as_mins()
                    ),
                );
            }
        }

        report.feasible = report.violations.is_empty();
        report
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use crate::{
        problem::{
            container::ContainerClass,
            demand::Demand,
            location::LocationBuilder,
            location::LocationIdx,
            time_window::TimeWindow,
            vehicle::{Vehicle, VehicleBuilder, VehicleLimits},
        },
        test_utils,
    };

    use super::*;

    fn destinations(indices: &[usize]) -> Vec<Visit> {
        indices
            .iter()
            .map(|&index| Visit::new(LocationIdx::new(index), WaypointPurpose::Destination))
            .collect()
    }

    #[test]
    fn test_feasible_route() {
        let problem = test_utils::create_problem(&[50.0, 25.0, 100.0, 200.0], &[500.0]);
        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2, 3, 4]),
            problem.departure(),
        );

        assert!(report.feasible, "{:?}", report.violations);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_capacity_violation_at_prefix() {
        let problem = test_utils::create_problem(&[300.0, 300.0], &[500.0]);
        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2]),
            problem.departure(),
        );

        assert!(!report.feasible);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Capacity);
        assert_eq!(report.violations[0].waypoint_index, 2);
    }

    #[test]
    fn test_capacity_toggle() {
        let mut config = test_utils::config();
        config.constraints.enforce_capacity = false;
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[300.0, 300.0]),
            vec![test_utils::create_vehicle("v", 500.0)],
            config,
        );

        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2]),
            problem.departure(),
        );
        assert!(report.feasible);
    }

    #[test]
    fn test_late_arrival() {
        let departure = test_utils::departure();
        let mut locations = test_utils::create_locations(&[]);
        let mut stop = LocationBuilder::new("tight", 51.2, 4.4);
        stop.set_time_window(TimeWindow::new(
            None,
            Some(departure + SignedDuration::from_mins(20)),
        ));
        locations.push(stop.build());

        let mut config = test_utils::config();
        config.constraints.enforce_time_windows = false;
        let problem = test_utils::problem_from(
            locations,
            vec![test_utils::create_vehicle("v", 100.0)],
            config.clone(),
        );
        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);
        assert!(report.feasible);

        config.constraints.enforce_time_windows = true;
        let problem = test_utils::problem_from(
            problem.locations().to_vec(),
            problem.vehicles().to_vec(),
            config,
        );
        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);
        assert_eq!(report.violations[0].kind, ViolationKind::TimeWindow);
    }

    #[test]
    fn test_container_restricted_hours() {
        let mut locations = test_utils::create_locations(&[]);
        let mut city = LocationBuilder::new("center", 50.9, 4.4);
        city.set_role(LocationRole::City);
        locations.push(city.build());

        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("box")
            .set_capacity(Demand::weight(20_000.0))
            .set_container_class(ContainerClass::FortyFoot);

        // 10:00 UTC departure
        let departure: Timestamp = "2025-06-10T10:00:00Z".parse().unwrap();
        let problem =
            test_utils::problem_from(locations.clone(), vec![builder.build()], test_utils::config());
        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);

        assert!(!report.feasible);
        assert_eq!(
            report.violations[0].kind,
            ViolationKind::ContainerRestrictedHours
        );
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.message == "consider departing after 22:00")
        );

        let mut config = test_utils::config();
        config.container_policy.permits_held = true;
        let problem = test_utils::problem_from(locations, problem.vehicles().to_vec(), config);
        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);
        assert!(report.feasible);
    }

    #[test]
    fn test_permit_and_height() {
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("tall")
            .set_capacity(Demand::weight(20_000.0))
            .set_height_m(4.6)
            .set_container_class(ContainerClass::FortyFiveFoot);

        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0]),
            vec![builder.build()],
            test_utils::config(),
        );
        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1]),
            problem.departure(),
        );

        assert_eq!(report.violations[0].kind, ViolationKind::ContainerHeight);
        assert!(report.warnings[0].message.contains("permit"));
    }

    #[test]
    fn test_missing_break() {
        let problem = test_utils::create_far_problem();
        let visits: Vec<_> = problem
            .routable_stops()
            .iter()
            .map(|stop| Visit::new(*stop, WaypointPurpose::Destination))
            .collect();

        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &visits, problem.departure());
        assert!(
            report
                .violations
                .iter()
                .any(|violation| violation.kind == ViolationKind::DriverBreak)
        );
    }

    fn kinds(report: &ValidationReport) -> Vec<ViolationKind> {
        report
            .violations
            .iter()
            .map(|violation| violation.kind)
            .collect()
    }

    fn limited_vehicle(limits: VehicleLimits, working_hours: Option<TimeWindow>) -> Vehicle {
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("limited")
            .set_capacity(Demand::weight(500.0))
            .set_limits(limits);
        if let Some(working_hours) = working_hours {
            builder.set_working_hours(working_hours);
        }

        builder.build()
    }

    #[test]
    fn test_max_distance_exceeded() {
        let vehicle = limited_vehicle(
            VehicleLimits {
                max_distance_km: Some(1.0),
                max_duration: None,
            },
            None,
        );
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0, 10.0]),
            vec![vehicle],
            test_utils::config(),
        );

        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2]),
            problem.departure(),
        );

        assert!(!report.feasible);
        assert_eq!(kinds(&report), vec![ViolationKind::MaxDistance]);
        assert_eq!(report.violations[0].waypoint_index, 2);

        let mut config = test_utils::config();
        config.constraints.enforce_max_distance = false;
        let problem =
            test_utils::problem_from(problem.locations().to_vec(), problem.vehicles().to_vec(), config);
        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2]),
            problem.departure(),
        );
        assert!(report.feasible);
    }

    #[test]
    fn test_max_duration_exceeded() {
        // Loading alone takes 15 min
        let vehicle = limited_vehicle(
            VehicleLimits {
                max_distance_km: None,
                max_duration: Some(SignedDuration::from_mins(10)),
            },
            None,
        );
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0]),
            vec![vehicle],
            test_utils::config(),
        );

        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1]),
            problem.departure(),
        );

        assert_eq!(kinds(&report), vec![ViolationKind::MaxDuration]);
    }

    #[test]
    fn test_working_hours_end_exceeded() {
        let departure = test_utils::departure();
        let vehicle = limited_vehicle(
            VehicleLimits::default(),
            Some(TimeWindow::new(
                Some(departure),
                Some(departure + SignedDuration::from_mins(10)),
            )),
        );
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[10.0]),
            vec![vehicle],
            test_utils::config(),
        );

        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);

        assert_eq!(kinds(&report), vec![ViolationKind::WorkingHours]);

        let mut config = test_utils::config();
        config.constraints.enforce_max_time = false;
        let problem =
            test_utils::problem_from(problem.locations().to_vec(), problem.vehicles().to_vec(), config);
        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &destinations(&[1]), departure);
        assert!(report.feasible);
    }

    #[test]
    fn test_container_weight_reported_once() {
        let mut builder = VehicleBuilder::default();
        builder
            .set_vehicle_id("heavy")
            .set_capacity(Demand::weight(60_000.0))
            .set_container_class(ContainerClass::FortyFoot);

        let problem = test_utils::problem_from(
            test_utils::create_locations(&[20_000.0, 20_000.0, 5_000.0]),
            vec![builder.build()],
            test_utils::config(),
        );
        let report = RouteValidator::new(&problem).validate(
            VehicleIdx::new(0),
            &destinations(&[1, 2, 3]),
            problem.departure(),
        );

        assert_eq!(kinds(&report), vec![ViolationKind::ContainerWeight]);
        assert_eq!(report.violations[0].waypoint_index, 2);
    }

    #[test]
    fn test_violations_follow_check_order() {
        let far = test_utils::create_far_problem();
        let problem = test_utils::problem_from(
            far.locations().to_vec(),
            vec![test_utils::create_vehicle("small", 15.0)],
            test_utils::config(),
        );
        let visits: Vec<_> = problem
            .routable_stops()
            .iter()
            .map(|stop| Visit::new(*stop, WaypointPurpose::Destination))
            .collect();

        let report =
            RouteValidator::new(&problem).validate(VehicleIdx::new(0), &visits, problem.departure());

        let first_break = report
            .violations
            .iter()
            .find(|violation| violation.kind == ViolationKind::DriverBreak)
            .unwrap();
        let at_break: Vec<_> = report
            .violations
            .iter()
            .filter(|violation| violation.waypoint_index == first_break.waypoint_index)
            .map(|violation| violation.kind)
            .collect();
        assert_eq!(
            at_break,
            vec![ViolationKind::Capacity, ViolationKind::DriverBreak]
        );
    }
}
