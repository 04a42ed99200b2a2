use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::{
    constraints::{
        route_cursor::{RouteCursor, Visit, VisitTiming},
        route_validator::{RouteValidator, Warning},
    },
    cost::cost_model::DISTANCE_EPSILON_KM,
    problem::{
        clock_window::format_clock,
        demand::Demand,
        location::{LocationIdx, LocationRole},
        routing_problem::RoutingProblem,
        vehicle::VehicleIdx,
        waypoint_purpose::WaypointPurpose,
    },
    solution::{candidate_solution::CandidateSolution, route_evaluation::evaluate_route},
};

use super::{
    confidence::route_confidence,
    route::{Route, RouteMetrics, RouteSavings},
    waypoint::Waypoint,
};

const REST_ROLES: [LocationRole; 2] = [LocationRole::Rest, LocationRole::Depot];
const STAGING_ROLES: [LocationRole; 2] = [LocationRole::Depot, LocationRole::Fuel];

/// Facilities considered around a point when looking for a rest or staging
/// waypoint.
const NEAREST_CANDIDATES: usize = 8;

/// Departure shifts tried before giving up on restricted container hours.
const MAX_POSTPONEMENTS: usize = 4;

/// A facility inserted before `stops[position]`, or before the closing
/// waypoint when `position == stops.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingStop {
    pub position: usize,
    pub location_id: LocationIdx,
}

struct PlannedRoute<'a> {
    visits: Vec<Visit>,
    timings: Vec<VisitTiming>,
    cursor: RouteCursor<'a>,
}

/// Expands stop sequences into timed routes: departure, requested stops,
/// rests, staging facilities and the closing waypoint.
pub struct ItineraryBuilder<'a> {
    problem: &'a RoutingProblem,
    validator: RouteValidator<'a>,
}

impl<'a> ItineraryBuilder<'a> {
    pub fn new(problem: &'a RoutingProblem) -> Self {
        ItineraryBuilder {
            problem,
            validator: RouteValidator::new(problem),
        }
    }

    /// One route per vehicle with at least one stop.
    pub fn build_routes(&self, solution: &CandidateSolution) -> Vec<Route> {
        solution
            .non_empty_routes()
            .map(|(vehicle_id, stops)| self.build_route(vehicle_id, stops))
            .collect()
    }

    pub fn build_route(&self, vehicle_id: VehicleIdx, stops: &[LocationIdx]) -> Route {
        let problem = self.problem;
        let config = problem.config();
        let cost_model = problem.cost_model();
        let vehicle = problem.vehicle(vehicle_id);

        let staging = self.staging_stop(vehicle_id, stops);
        let (departure, postponement) = self.departure(vehicle_id, stops, staging);
        let planned = self.plan(vehicle_id, stops, departure, staging);

        let start = problem.location(problem.vehicle_start(vehicle_id));
        let loading_end = departure + config.itinerary.loading_duration;
        let mut waypoints = Vec::with_capacity(planned.visits.len() + 1);
        waypoints.push(Waypoint {
            location_id: start.external_id().to_owned(),
            lat: start.lat(),
            lon: start.lon(),
            purpose: WaypointPurpose::Departure,
            arrival: departure,
            departure: loading_end,
            waiting: SignedDuration::ZERO,
            distance_from_previous_km: 0.0,
            cumulative_distance_km: 0.0,
            cumulative_duration: config.itinerary.loading_duration,
            cumulative_cost: cost_model.cost(0.0, config.itinerary.loading_duration, vehicle),
            load: Demand::ZERO,
        });

        let mut cumulative_distance = 0.0;
        let mut load = Demand::ZERO;
        for (visit, timing) in planned.visits.iter().zip(&planned.timings) {
            let location = problem.location(visit.location_id);
            cumulative_distance += timing.leg_distance_km;
            if visit.purpose == WaypointPurpose::Destination {
                load += *location.demand();
            }

            let cumulative_duration = timing.departure.duration_since(departure);
            waypoints.push(Waypoint {
                location_id: location.external_id().to_owned(),
                lat: location.lat(),
                lon: location.lon(),
                purpose: visit.purpose,
                arrival: timing.arrival,
                departure: timing.departure,
                waiting: timing.service_start.duration_since(timing.arrival),
                distance_from_previous_km: timing.leg_distance_km,
                cumulative_distance_km: cumulative_distance,
                cumulative_duration,
                cumulative_cost: cost_model.cost(cumulative_distance, cumulative_duration, vehicle),
                load,
            });
        }

        let cursor = &planned.cursor;
        let distance_km = cursor.distance_km();
        let duration = cursor.elapsed();
        let cost = cost_model.cost(distance_km, duration, vehicle) + vehicle.rates().fixed;
        let rush_hour_impact = if cursor.driving().is_positive() {
            cursor.rush_delay().as_secs_f64() / cursor.driving().as_secs_f64() * 100.0
        } else {
            0.0
        };

        let metrics = RouteMetrics {
            distance_km,
            duration,
            driving: cursor.driving(),
            waiting: cursor.waiting(),
            rush_delay: cursor.rush_delay(),
            fuel_liters: cost_model.fuel(distance_km, vehicle),
            cost,
            co2_kg: cost_model.emissions(distance_km, vehicle),
            load: cursor.load(),
            utilization: cursor.load().fill_ratio(vehicle.capacity()),
            rush_hour_impact,
        };

        let savings = self.savings(vehicle_id, stops, &metrics);

        let report = self
            .validator
            .validate(vehicle_id, &planned.visits, departure);
        let mut warnings: Vec<Warning> = postponement.into_iter().collect();
        warnings.extend(report.warnings);

        let is_complex = waypoints.len() > config.itinerary.complexity_threshold;
        let confidence = route_confidence(
            rush_hour_impact,
            report.violations.len(),
            warnings.len(),
            is_complex,
        );

        debug!(
            vehicle = vehicle.external_id(),
            waypoints = waypoints.len(),
            distance_km,
            violations = report.violations.len(),
            confidence,
            "Built route"
        );

        Route {
            vehicle_id: vehicle.external_id().to_owned(),
            waypoints,
            metrics,
            savings,
            feasible: report.feasible,
            violations: report.violations,
            warnings,
            confidence,
        }
    }

    /// Times every waypoint from `departure`, inserting rests and the
    /// staging stop.
    fn plan(
        &self,
        vehicle_id: VehicleIdx,
        stops: &[LocationIdx],
        departure: Timestamp,
        staging: Option<StagingStop>,
    ) -> PlannedRoute<'a> {
        let problem = self.problem;
        let mut planned = PlannedRoute {
            visits: Vec::with_capacity(stops.len() + 2),
            timings: Vec::with_capacity(stops.len() + 2),
            cursor: RouteCursor::start_at(problem, vehicle_id, departure, false),
        };

        let staging_visit = |position: usize| {
            staging
                .filter(|staging| staging.position == position)
                .map(|staging| {
                    let role = problem.location(staging.location_id).role();
                    Visit::new(staging.location_id, WaypointPurpose::for_role(role))
                })
        };

        for (position, &stop) in stops.iter().enumerate() {
            if let Some(visit) = staging_visit(position) {
                self.drive_to(&mut planned, visit);
            }

            let role = problem.location(stop).role();
            self.drive_to(&mut planned, Visit::new(stop, WaypointPurpose::for_role(role)));
        }

        if let Some(visit) = staging_visit(stops.len()) {
            self.drive_to(&mut planned, visit);
        }

        if let (Some(end), Some(purpose)) = (
            problem.vehicle_end(vehicle_id),
            problem.closing_purpose(vehicle_id),
        ) {
            self.drive_to(&mut planned, Visit::new(end, purpose));
        }

        planned
    }

    fn drive_to(&self, planned: &mut PlannedRoute<'a>, visit: Visit) {
        let problem = self.problem;

        if problem.config().constraints.enforce_driver_breaks {
            let cursor = &planned.cursor;
            let leg = problem
                .cost_model()
                .travel_time(
                    problem.distance(cursor.position(), visit.location_id),
                    cursor.clock(),
                )
                .duration;

            if cursor.needs_break_before(leg) {
                let rest = self
                    .rest_location(cursor.position(), visit.location_id)
                    .unwrap_or(cursor.position());
                let rest_visit = Visit::new(rest, WaypointPurpose::Rest);
                let timing = planned.cursor.advance(rest_visit);
                planned.visits.push(rest_visit);
                planned.timings.push(timing);
            }
        }

        let timing = planned.cursor.advance(visit);
        planned.visits.push(visit);
        planned.timings.push(timing);
    }

    /// Closest rest area or depot reachable within the detour budget of the
    /// `from -> to` leg.
    pub fn rest_location(&self, from: LocationIdx, to: LocationIdx) -> Option<LocationIdx> {
        let problem = self.problem;
        let budget =
            problem.distance(from, to) * problem.config().itinerary.detour_ratio + DISTANCE_EPSILON_KM;

        problem
            .facility_index()
            .nearest_iter(problem.location(from).point(), &REST_ROLES)
            .take(NEAREST_CANDIDATES)
            .find(|&facility| {
                facility != to
                    && problem.distance(from, facility) + problem.distance(facility, to) <= budget
            })
    }

    /// Depot or fuel stop to insert on long routes that would break the
    /// vehicle distance, duration or fuel range. Only kept when the detour
    /// stays within the configured ratio of the direct route.
    pub fn staging_stop(&self, vehicle_id: VehicleIdx, stops: &[LocationIdx]) -> Option<StagingStop> {
        let problem = self.problem;
        let params = &problem.config().itinerary;
        let vehicle = problem.vehicle(vehicle_id);

        if stops.is_empty() || problem.facility_index().is_empty() {
            return None;
        }

        let direct = evaluate_route(problem, vehicle_id, stops);
        if direct.distance_km <= params.long_route_threshold_km {
            return None;
        }

        let exceeds_limits = vehicle
            .max_distance_km()
            .is_some_and(|max| direct.distance_km > max)
            || vehicle.max_duration().is_some_and(|max| direct.duration > max)
            || vehicle
                .fuel_range_km()
                .is_some_and(|range| direct.distance_km > range);
        if !exceeds_limits {
            return None;
        }

        let mut path = Vec::with_capacity(stops.len() + 2);
        path.push(problem.vehicle_start(vehicle_id));
        path.extend_from_slice(stops);
        path.extend(problem.vehicle_end(vehicle_id));
        let midpoint = problem.location(path[path.len() / 2]).point();

        let mut best: Option<(StagingStop, f64)> = None;
        for facility in problem
            .facility_index()
            .nearest_iter(midpoint, &STAGING_ROLES)
            .take(NEAREST_CANDIDATES)
        {
            for (position, leg) in path.windows(2).enumerate() {
                let (from, to) = (leg[0], leg[1]);
                if facility == from || facility == to {
                    continue;
                }

                let added = problem.distance(from, facility) + problem.distance(facility, to)
                    - problem.distance(from, to);
                if best.is_none_or(|(_, best_added)| added < best_added) {
                    best = Some((
                        StagingStop {
                            position,
                            location_id: facility,
                        },
                        added,
                    ));
                }
            }
        }

        let (staging, added) = best?;
        if direct.distance_km + added > direct.distance_km * params.detour_ratio {
            debug!(
                vehicle = vehicle.external_id(),
                added_km = added,
                "Skipping staging stop, detour too long"
            );
            return None;
        }

        Some(staging)
    }

    /// Departure of the route, postponed past restricted container hours
    /// when the policy asks for it.
    fn departure(
        &self,
        vehicle_id: VehicleIdx,
        stops: &[LocationIdx],
        staging: Option<StagingStop>,
    ) -> (Timestamp, Option<Warning>) {
        let problem = self.problem;
        let policy = problem.config().container_policy;
        let planned_departure = problem.vehicle_departure(vehicle_id);

        if !policy.avoid_restricted_hours || policy.permits_held {
            return (planned_departure, None);
        }

        let Some(restriction) = problem.container_restriction(vehicle_id) else {
            return (planned_departure, None);
        };

        let cost_model = problem.cost_model();
        let mut departure = planned_departure;
        for _ in 0..MAX_POSTPONEMENTS {
            let planned = self.plan(vehicle_id, stops, departure, staging);
            let restricted_arrival = planned
                .visits
                .iter()
                .zip(&planned.timings)
                .find_map(|(visit, timing)| {
                    let location = problem.location(visit.location_id);
                    if visit.purpose != WaypointPurpose::Destination
                        || location.role() != LocationRole::City
                    {
                        return None;
                    }

                    restriction
                        .restricted_at(cost_model.local_time(timing.arrival))
                        .map(|hit| (timing.arrival, hit.lifts_at))
                });

            let Some((arrival, lifts_at)) = restricted_arrival else {
                break;
            };
            let Some(lifted) = cost_model.next_occurrence(arrival, lifts_at) else {
                break;
            };

            departure += lifted.duration_since(arrival);
        }

        if departure == planned_departure {
            return (departure, None);
        }

        debug!(
            vehicle = problem.vehicle(vehicle_id).external_id(),
            %planned_departure,
            %departure,
            "Postponed departure for restricted container hours"
        );

        let warning = Warning {
            waypoint_index: Some(0),
            message: format!(
                "departure postponed to {} to avoid {} container restricted hours",
                format_clock(cost_model.local_time(departure)),
                restriction.class
            ),
        };

        (departure, Some(warning))
    }

    /// Savings against the same stops in request order, without inserted
    /// waypoints, leaving at the planned departure.
    fn savings(
        &self,
        vehicle_id: VehicleIdx,
        stops: &[LocationIdx],
        metrics: &RouteMetrics,
    ) -> RouteSavings {
        let problem = self.problem;
        let vehicle = problem.vehicle(vehicle_id);

        let mut request_order = stops.to_vec();
        request_order.sort();

        let mut cursor = RouteCursor::start_at(
            problem,
            vehicle_id,
            problem.vehicle_departure(vehicle_id),
            false,
        );
        for stop in request_order {
            cursor.push_stop(stop);
        }
        cursor.finish();

        let baseline_distance_km = cursor.distance_km();
        let baseline_cost = problem
            .cost_model()
            .cost(baseline_distance_km, cursor.elapsed(), vehicle)
            + vehicle.rates().fixed;
        let cost = baseline_cost - metrics.cost;

        RouteSavings {
            baseline_distance_km,
            baseline_cost,
            distance_km: baseline_distance_km - metrics.distance_km,
            cost,
            percent: if baseline_cost > 0.0 {
                cost / baseline_cost * 100.0
            } else {
                0.0
            },
        }
    }
}
