use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::{
    problem::{
        demand::Demand, location::LocationIdx, routing_problem::RoutingProblem,
        vehicle::VehicleIdx,
    },
    solution::{
        candidate_solution::CandidateSolution, insertion::repair, route_evaluation::check_route,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saving {
    pub i: LocationIdx,
    pub j: LocationIdx,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedMerge {
    pub saving: f64,
    pub demand: Demand,
}

/// Positive savings `d(depot, i) + d(depot, j) - d(i, j)` for every unordered
/// pair of routable stops, largest first.
pub fn compute_savings(problem: &RoutingProblem, depot: LocationIdx) -> Vec<Saving> {
    let stops = problem.routable_stops();
    let mut savings = Vec::with_capacity(stops.len() * stops.len().saturating_sub(1) / 2);

    for (index, &i) in stops.iter().enumerate() {
        for &j in &stops[index + 1..] {
            let value =
                problem.distance(depot, i) + problem.distance(depot, j) - problem.distance(i, j);
            if value > 0.0 {
                savings.push(Saving { i, j, value });
            }
        }
    }

    savings.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then(a.i.cmp(&b.i))
            .then(a.j.cmp(&b.j))
    });

    savings
}

/// Whether some vehicle able to serve every stop of `route` can drive it
/// within its capacity and limits.
fn is_servable(problem: &RoutingProblem, route: &[LocationIdx]) -> bool {
    VehicleIdx::range(problem.num_vehicles())
        .any(|vehicle_id| check_route(problem, vehicle_id, route).is_ok())
}

/// Merges singleton routes along the savings list, splicing at matching
/// endpoints.
pub fn merge_routes(
    problem: &RoutingProblem,
    savings: &[Saving],
) -> (Vec<Vec<LocationIdx>>, Vec<AppliedMerge>) {
    let num_locations = problem.locations().len();
    let enforce_capacity = problem.config().constraints.enforce_capacity;

    let mut route_of = vec![usize::MAX; num_locations];
    let mut route_load = vec![Demand::ZERO; num_locations];
    let mut route_members: Vec<Vec<LocationIdx>> = vec![Vec::new(); num_locations];

    for &stop in problem.routable_stops() {
        route_of[stop.get()] = stop.get();
        route_load[stop.get()] = *problem.location(stop).demand();
        route_members[stop.get()].push(stop);
    }

    let mut merges = vec![];
    let mut merged = Vec::new();
    for saving in savings {
        let ri = route_of[saving.i.get()];
        let rj = route_of[saving.j.get()];

        if ri == rj {
            continue;
        }

        let i_at_start = route_members[ri].first() == Some(&saving.i);
        let i_at_end = route_members[ri].last() == Some(&saving.i);
        let j_at_start = route_members[rj].first() == Some(&saving.j);
        let j_at_end = route_members[rj].last() == Some(&saving.j);

        // (head, tail, reverse head, reverse tail): tail is appended to head.
        let (head, tail, reverse_head, reverse_tail) = if i_at_end && j_at_start {
            (ri, rj, false, false)
        } else if j_at_end && i_at_start {
            (rj, ri, false, false)
        } else if i_at_end && j_at_end {
            (ri, rj, false, true)
        } else if i_at_start && j_at_start {
            (ri, rj, true, false)
        } else {
            continue;
        };

        let combined_load = route_load[ri] + route_load[rj];

        merged.clear();
        if reverse_head {
            merged.extend(route_members[head].iter().rev());
        } else {
            merged.extend(route_members[head].iter());
        }
        if reverse_tail {
            merged.extend(route_members[tail].iter().rev());
        } else {
            merged.extend(route_members[tail].iter());
        }

        let fits_some_capacity = !enforce_capacity
            || problem
                .vehicles()
                .iter()
                .any(|vehicle| combined_load.fits_within(vehicle.capacity()));
        if !fits_some_capacity || !is_servable(problem, &merged) {
            continue;
        }

        route_members[head] = merged.clone();
        route_members[tail].clear();
        route_load[head] = combined_load;
        route_load[tail] = Demand::ZERO;
        for stop in &route_members[head] {
            route_of[stop.get()] = head;
        }

        merges.push(AppliedMerge {
            saving: saving.value,
            demand: combined_load,
        });
    }

    let routes = route_members
        .into_iter()
        .filter(|members| !members.is_empty())
        .collect();

    (routes, merges)
}

/// Assigns merged routes to vehicles, largest demand first, each to the
/// smallest free vehicle that can drive it.
fn assign_vehicles(problem: &RoutingProblem, mut routes: Vec<Vec<LocationIdx>>) -> Vec<Vec<LocationIdx>> {
    let demand_of = |route: &[LocationIdx]| -> Demand {
        route
            .iter()
            .map(|stop| *problem.location(*stop).demand())
            .sum()
    };

    routes.sort_by(|a, b| {
        demand_of(b.as_slice())
            .weight
            .total_cmp(&demand_of(a.as_slice()).weight)
            .then(b.len().cmp(&a.len()))
    });

    let mut vehicles: Vec<VehicleIdx> = VehicleIdx::range(problem.num_vehicles()).collect();
    vehicles.sort_by(|&a, &b| {
        let capacity_a = problem.vehicle(a).capacity();
        let capacity_b = problem.vehicle(b).capacity();
        capacity_a
            .weight
            .total_cmp(&capacity_b.weight)
            .then(capacity_a.volume.total_cmp(&capacity_b.volume))
            .then(a.cmp(&b))
    });

    let mut used = FixedBitSet::with_capacity(problem.num_vehicles());
    let mut assigned = vec![vec![]; problem.num_vehicles()];

    for route in routes {
        let vehicle = vehicles.iter().copied().find(|vehicle_id| {
            !used.contains(vehicle_id.get()) && check_route(problem, *vehicle_id, &route).is_ok()
        });

        if let Some(vehicle_id) = vehicle {
            used.insert(vehicle_id.get());
            assigned[vehicle_id.get()] = route;
        }
    }

    assigned
}

/// Clarke-Wright savings construction. Routes left without a vehicle have
/// their stops reinserted by cheapest insertion.
pub fn clarke_wright(problem: &RoutingProblem) -> CandidateSolution {
    let depot = problem.vehicle_start(VehicleIdx::new(0));
    let savings = compute_savings(problem, depot);
    let (routes, merges) = merge_routes(problem, &savings);

    debug!(
        savings = savings.len(),
        merges = merges.len(),
        routes = routes.len(),
        "Clarke-Wright merged routes"
    );

    let assigned = assign_vehicles(problem, routes);
    let mut solution = CandidateSolution::from_routes(problem, assigned);
    repair(problem, &mut solution);

    solution
}
